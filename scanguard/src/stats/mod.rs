// Copyright (c) 2025 scanguard Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Scan statistics
//!
//! Counters shared by the concurrent sub-scans of one query, grouped by an
//! ordered label key and merged into query-level totals.

pub mod registry;
pub mod stat;

pub use registry::{GroupKey, QueryStats};
pub use stat::{Stat, StatSnapshot};
