// Copyright (c) 2025 scanguard Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Per-group scan counters
//!
//! A [`Stat`] is one bucket of three independent counters that any number of
//! scan workers may bump concurrently. The counters are not updated as a
//! unit: each one is individually consistent, but a reader may observe a
//! partition increment before the matching chunk increment lands.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Scan counters for one statistics group
#[derive(Default)]
pub struct Stat {
    /// Partitions (time series) scanned
    partitions_scanned: AtomicU64,

    /// Encoded chunks scanned
    chunks_scanned: AtomicU64,

    /// Bytes of result produced
    result_size: AtomicU64,
}

impl fmt::Debug for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stat")
            .field("partitions_scanned", &self.partitions_scanned())
            .field("chunks_scanned", &self.chunks_scanned())
            .field("result_size", &self.result_size())
            .finish()
    }
}

impl Stat {
    /// Create a zero-valued counter group
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_partitions(&self, n: u64) {
        self.partitions_scanned.fetch_add(n, Ordering::Relaxed);
    }

    pub fn increment_chunks(&self, n: u64) {
        self.chunks_scanned.fetch_add(n, Ordering::Relaxed);
    }

    pub fn add_result_size(&self, n: u64) {
        self.result_size.fetch_add(n, Ordering::Relaxed);
    }

    pub fn partitions_scanned(&self) -> u64 {
        self.partitions_scanned.load(Ordering::Relaxed)
    }

    pub fn chunks_scanned(&self) -> u64 {
        self.chunks_scanned.load(Ordering::Relaxed)
    }

    pub fn result_size(&self) -> u64 {
        self.result_size.load(Ordering::Relaxed)
    }

    /// Add another group's counters into this one
    ///
    /// Each counter is read and added independently, so this may run
    /// concurrently with increments on either side. Merging a group into
    /// itself doubles it.
    pub fn merge(&self, other: &Stat) {
        self.increment_partitions(other.partitions_scanned());
        self.increment_chunks(other.chunks_scanned());
        self.add_result_size(other.result_size());
    }

    /// Add a plain snapshot into this group
    pub fn merge_snapshot(&self, snapshot: &StatSnapshot) {
        self.increment_partitions(snapshot.partitions_scanned);
        self.increment_chunks(snapshot.chunks_scanned);
        self.add_result_size(snapshot.result_size);
    }

    /// Copy the current counter values
    pub fn snapshot(&self) -> StatSnapshot {
        StatSnapshot {
            partitions_scanned: self.partitions_scanned(),
            chunks_scanned: self.chunks_scanned(),
            result_size: self.result_size(),
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.snapshot(), f)
    }
}

/// Point-in-time copy of a [`Stat`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatSnapshot {
    pub partitions_scanned: u64,
    pub chunks_scanned: u64,
    pub result_size: u64,
}

impl StatSnapshot {
    /// Component-wise sum, wrapping on overflow the same way the atomics do
    pub fn combine(&self, other: &StatSnapshot) -> StatSnapshot {
        StatSnapshot {
            partitions_scanned: self.partitions_scanned.wrapping_add(other.partitions_scanned),
            chunks_scanned: self.chunks_scanned.wrapping_add(other.chunks_scanned),
            result_size: self.result_size.wrapping_add(other.result_size),
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == StatSnapshot::default()
    }
}

impl fmt::Display for StatSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "partitions={} chunks={} resultBytes={}",
            self.partitions_scanned, self.chunks_scanned, self.result_size
        )
    }
}
