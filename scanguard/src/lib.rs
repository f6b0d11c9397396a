// Copyright (c) 2025 scanguard Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! scanguard - query execution bookkeeping for a distributed time-series engine
//!
//! Tracks per-query scan statistics across concurrently running sub-scans and
//! holds the store's eviction guard for the lifetime of a query, so memory
//! blocks a query is still reading are not reclaimed underneath it.
//!
//! # Overview
//!
//! - **Statistics**: [`QueryStats`] maps group keys to [`Stat`] counter groups
//!   that scan workers bump concurrently
//! - **Query descriptor**: [`QueryContext`] and [`PlannerParams`], immutable
//!   once built, plus spread resolution from query filters
//! - **Sessions**: [`QuerySession`] owns one query's statistics and its
//!   eviction guard, releasing the guard exactly once
//!
//! # Usage
//!
//! ```ignore
//! let lock = Arc::new(EvictionLock::new());
//! let session = QuerySession::new(QueryContext::unavailable(), Arc::new(QueryConfig::default()));
//! session.acquire_eviction_lock(&lock, Duration::from_secs(1))?;
//!
//! session.query_stats().counters(["shard-0"]).increment_chunks(12);
//!
//! session.close();
//! ```

pub mod context;
pub mod error;
pub mod eviction;
pub mod session;
pub mod stats;

pub use context::{
    ColumnFilter, Filter, PerQueryLimits, PlannerParams, PromQlQueryParams, QueryContext,
    QueryParams, SpreadChange, SpreadProvider,
};
pub use error::{QueryError, QueryResult};
pub use eviction::{EvictionGuard, EvictionLock};
pub use session::{GuardState, QueryConfig, QuerySession};
pub use stats::{GroupKey, QueryStats, Stat, StatSnapshot};

/// scanguard version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// scanguard crate name
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
