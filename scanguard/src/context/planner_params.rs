// Copyright (c) 2025 scanguard Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Planner parameters and per-query limits

use crate::context::spread::{ColumnFilter, SpreadChange, SpreadProvider};
use crate::stats::StatSnapshot;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

const ONE_DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Planner configuration bound to one query
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerParams {
    /// Application the query was issued for
    pub application_id: String,

    /// Fixed spread for the query, if any
    pub spread: Option<u32>,

    /// Spread provider that takes precedence over `spread`
    #[serde(skip)]
    pub spread_override: Option<Arc<dyn SpreadProvider>>,

    /// Restrict the query to these shards
    pub shard_overrides: Option<Vec<u32>>,

    /// Advisory timeout; enforced by the executor, not here
    pub query_timeout: Duration,

    /// Limits that fail the query when exceeded
    pub enforced_limits: PerQueryLimits,

    /// Limits that only produce warnings
    pub warn_limits: PerQueryLimits,

    /// Return what is available instead of failing when some shards are down
    pub allow_partial_results: bool,

    pub histogram_map: bool,
    pub skip_aggregate_present: bool,
    pub process_failure: bool,
    pub process_multi_partition: bool,

    /// Split long time ranges into smaller sub-queries
    pub time_split_enabled: bool,
    pub min_time_range_for_split: Duration,
    pub split_size: Duration,
}

impl Default for PlannerParams {
    fn default() -> Self {
        Self {
            application_id: "filodb".to_string(),
            spread: None,
            spread_override: None,
            shard_overrides: None,
            query_timeout: Duration::from_secs(30),
            enforced_limits: PerQueryLimits::default(),
            warn_limits: PerQueryLimits::warn_defaults(),
            allow_partial_results: false,
            histogram_map: false,
            skip_aggregate_present: false,
            process_failure: true,
            process_multi_partition: false,
            time_split_enabled: false,
            min_time_range_for_split: ONE_DAY,
            split_size: ONE_DAY,
        }
    }
}

impl PlannerParams {
    /// Parameters with a fixed spread
    pub fn with_spread(spread: u32) -> Self {
        Self {
            spread: Some(spread),
            ..Self::default()
        }
    }

    /// Spread changes for a query with these filters
    ///
    /// The override provider wins, then a fixed `spread`, then `default_spread`.
    pub fn spread_for(&self, filters: &[ColumnFilter], default_spread: u32) -> Vec<SpreadChange> {
        if let Some(provider) = &self.spread_override {
            return provider.spread_func(filters);
        }
        vec![SpreadChange::new(0, self.spread.unwrap_or(default_spread))]
    }

    /// Whether a query spanning `range` should be split
    pub fn should_split(&self, range: Duration) -> bool {
        self.time_split_enabled && range > self.min_time_range_for_split
    }
}

/// Resource limits applied to one query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerQueryLimits {
    /// Samples a single exec plan may return
    pub exec_plan_samples: u64,
    /// Bytes a single exec plan may return
    pub exec_plan_result_bytes: u64,
    pub group_by_cardinality: u64,
    pub join_query_cardinality: u64,
    pub time_series_samples_scanned_bytes: u64,
    /// Time series (partitions) scanned
    pub time_series_scanned: u64,
    /// Raw chunk bytes scanned
    pub raw_scanned_bytes: u64,
}

impl Default for PerQueryLimits {
    fn default() -> Self {
        Self {
            exec_plan_samples: 1_000_000,
            exec_plan_result_bytes: 18 * 1024 * 1024,
            group_by_cardinality: 100_000,
            join_query_cardinality: 100_000,
            time_series_samples_scanned_bytes: 300 * 1024 * 1024,
            time_series_scanned: 1_000_000,
            raw_scanned_bytes: 200 * 1024 * 1024,
        }
    }
}

impl PerQueryLimits {
    /// Warning thresholds at half the enforced defaults
    pub fn warn_defaults() -> Self {
        let enforced = Self::default();
        Self {
            exec_plan_samples: enforced.exec_plan_samples / 2,
            exec_plan_result_bytes: enforced.exec_plan_result_bytes / 2,
            group_by_cardinality: enforced.group_by_cardinality / 2,
            join_query_cardinality: enforced.join_query_cardinality / 2,
            time_series_samples_scanned_bytes: enforced.time_series_samples_scanned_bytes / 2,
            time_series_scanned: enforced.time_series_scanned / 2,
            raw_scanned_bytes: enforced.raw_scanned_bytes / 2,
        }
    }

    /// Scan limits exceeded by `totals`
    ///
    /// Only reports; deciding what to do about a breach is up to the executor.
    pub fn check_scan(&self, totals: &StatSnapshot) -> Vec<LimitBreach> {
        let mut breaches = Vec::new();
        if totals.partitions_scanned > self.time_series_scanned {
            breaches.push(LimitBreach {
                limit: "time_series_scanned",
                value: totals.partitions_scanned,
                threshold: self.time_series_scanned,
            });
        }
        if totals.result_size > self.exec_plan_result_bytes {
            breaches.push(LimitBreach {
                limit: "exec_plan_result_bytes",
                value: totals.result_size,
                threshold: self.exec_plan_result_bytes,
            });
        }
        breaches
    }
}

/// A limit exceeded by observed statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitBreach {
    pub limit: &'static str,
    pub value: u64,
    pub threshold: u64,
}

impl std::fmt::Display for LimitBreach {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} of {} exceeds limit {}",
            self.limit, self.value, self.threshold
        )
    }
}
