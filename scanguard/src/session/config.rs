// Copyright (c) 2025 scanguard Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Query execution configuration

use crate::error::{QueryError, QueryResult};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Process-wide default configuration
pub static DEFAULT_QUERY_CONFIG: Lazy<QueryConfig> = Lazy::new(QueryConfig::default);

/// Configuration shared by every query executed in a process
///
/// Timeouts here are advisory: the executor that owns a session decides when
/// to abort and close it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// How long to wait for a remote sub-plan to answer
    pub ask_timeout: Duration,

    /// Samples older than this are treated as stale
    pub stale_sample_after: Duration,

    /// Smallest step a range query may use
    pub min_step: Duration,

    /// Window count above which reductions switch to the fast path
    pub fast_reduce_max_windows: usize,

    pub translate_prom_to_filodb_histogram: bool,

    /// Worker threads scanning shards in parallel for one query
    pub parallel_scan_workers: usize,

    /// Result vectors processed in parallel during reduction
    pub num_rv_in_parallel: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            ask_timeout: Duration::from_secs(30),
            stale_sample_after: Duration::from_secs(5 * 60),
            min_step: Duration::from_secs(5),
            fast_reduce_max_windows: 50,
            translate_prom_to_filodb_histogram: true,
            parallel_scan_workers: 8,
            num_rv_in_parallel: 16,
        }
    }
}

impl QueryConfig {
    /// Small configuration for tests and local runs
    pub fn for_tests() -> Self {
        Self {
            ask_timeout: Duration::from_secs(5),
            parallel_scan_workers: 2,
            num_rv_in_parallel: 2,
            ..Self::default()
        }
    }

    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json_str(json: &str) -> QueryResult<Self> {
        let config: QueryConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> QueryResult<Self> {
        let path = path.as_ref();
        log::debug!("Loading query config from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> QueryResult<()> {
        if self.parallel_scan_workers == 0 {
            return Err(QueryError::Config(
                "parallel_scan_workers must be at least 1".to_string(),
            ));
        }
        if self.num_rv_in_parallel == 0 {
            return Err(QueryError::Config(
                "num_rv_in_parallel must be at least 1".to_string(),
            ));
        }
        if self.min_step.is_zero() {
            return Err(QueryError::Config("min_step must be positive".to_string()));
        }
        Ok(())
    }
}
