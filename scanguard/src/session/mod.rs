// Copyright (c) 2025 scanguard Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Query execution sessions
//!
//! This module provides:
//! - The per-execution [`QuerySession`] that owns scan statistics and the
//!   query's eviction guard
//! - Process-wide execution configuration ([`QueryConfig`])

pub mod config;
pub mod query_session;

pub use config::{QueryConfig, DEFAULT_QUERY_CONFIG};
pub use query_session::{GuardState, QuerySession};
