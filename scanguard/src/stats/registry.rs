// Copyright (c) 2025 scanguard Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Per-query registry of scan counters keyed by group
//!
//! Scan workers look up their [`Stat`] through [`QueryStats::counters`]. Creation
//! is a single insert-if-absent step on the owning shard of the map, so when
//! several workers race to create the same group exactly one instance is kept
//! and every racer gets that instance back.

use crate::stats::stat::{Stat, StatSnapshot};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Ordered label sequence identifying a statistics group
///
/// Order is significant. The empty key is the "ungrouped" bucket used before
/// any shard-specific grouping exists.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupKey(Vec<String>);

impl GroupKey {
    pub fn new(labels: Vec<String>) -> Self {
        Self(labels)
    }

    /// The ungrouped key
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn labels(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for GroupKey {
    fn from(labels: Vec<String>) -> Self {
        Self(labels)
    }
}

impl From<&[&str]> for GroupKey {
    fn from(labels: &[&str]) -> Self {
        Self(labels.iter().map(|l| l.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for GroupKey {
    fn from(labels: [&str; N]) -> Self {
        Self(labels.iter().map(|l| l.to_string()).collect())
    }
}

impl From<&GroupKey> for GroupKey {
    fn from(key: &GroupKey) -> Self {
        key.clone()
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

/// Scan statistics for one query, bucketed by group key
#[derive(Debug, Default)]
pub struct QueryStats {
    stats: DashMap<GroupKey, Arc<Stat>>,
}

impl QueryStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the counters for `group`
    ///
    /// An empty key resolves to the only existing group when the registry holds
    /// exactly one; otherwise the key is used verbatim, so the empty key gets a
    /// bucket of its own. The rule is checked on every call.
    pub fn counters(&self, group: impl Into<GroupKey>) -> Arc<Stat> {
        let group = group.into();
        if group.is_empty() {
            if let Some(only) = self.sole_group() {
                return only;
            }
        }
        self.counters_exact(group)
    }

    /// Get or create the counters for exactly `group`, with no default resolution
    pub fn counters_exact(&self, group: GroupKey) -> Arc<Stat> {
        let entry = self
            .stats
            .entry(group)
            .or_insert_with(|| Arc::new(Stat::new()));
        Arc::clone(entry.value())
    }

    /// Look up a group without creating it
    pub fn get(&self, group: &GroupKey) -> Option<Arc<Stat>> {
        self.stats.get(group).map(|entry| Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    /// Group keys in sorted order
    pub fn group_keys(&self) -> Vec<GroupKey> {
        let mut keys: Vec<GroupKey> = self.stats.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    /// Add every group of `other` into this registry
    ///
    /// Matching keys are summed component-wise and missing keys are created.
    /// Keys are taken verbatim. `other` is copied out before any insert, so the
    /// two maps are never locked together and `other` may be `self`.
    pub fn merge(&self, other: &QueryStats) {
        let incoming: Vec<(GroupKey, StatSnapshot)> = other
            .stats
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().snapshot()))
            .collect();

        for (group, snapshot) in incoming {
            self.counters_exact(group).merge_snapshot(&snapshot);
        }
    }

    /// Current values of every group, ordered by key
    pub fn snapshot(&self) -> BTreeMap<GroupKey, StatSnapshot> {
        self.stats
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().snapshot()))
            .collect()
    }

    /// Sum over all groups
    pub fn totals(&self) -> StatSnapshot {
        self.stats
            .iter()
            .fold(StatSnapshot::default(), |acc, entry| {
                acc.combine(&entry.value().snapshot())
            })
    }

    fn sole_group(&self) -> Option<Arc<Stat>> {
        if self.stats.len() != 1 {
            return None;
        }
        let mut iter = self.stats.iter();
        let first = iter.next().map(|entry| Arc::clone(entry.value()));
        // A group may have been added since the length check
        if iter.next().is_some() {
            return None;
        }
        first
    }
}

impl fmt::Display for QueryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (group, snapshot) in self.snapshot() {
            writeln!(f, "{} {}", group, snapshot)?;
        }
        Ok(())
    }
}
