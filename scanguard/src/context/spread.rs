// Copyright (c) 2025 scanguard Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Spread resolution from query filters
//!
//! The spread of a query decides how many shards a lookup fans out to. It can
//! be configured per shard-key combination: a table maps an exact set of
//! `label = value` pairs to a spread, and anything not in the table falls back
//! to a default.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

/// Filter operator applied to one label
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Filter {
    Equals(String),
    NotEquals(String),
    EqualsRegex(String),
    NotEqualsRegex(String),
    In(BTreeSet<String>),
}

/// A label name paired with a filter operator
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnFilter {
    pub column: String,
    pub filter: Filter,
}

impl ColumnFilter {
    pub fn new(column: impl Into<String>, filter: Filter) -> Self {
        Self {
            column: column.into(),
            filter,
        }
    }

    /// Shorthand for an exact-equality filter
    pub fn equals(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(column, Filter::Equals(value.into()))
    }

    /// The compared value if this is an exact-equality filter
    pub fn equals_value(&self) -> Option<&str> {
        match &self.filter {
            Filter::Equals(value) => Some(value.as_str()),
            _ => None,
        }
    }
}

/// Spread in effect from `time` (epoch millis) onwards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpreadChange {
    pub time: i64,
    pub spread: u32,
}

impl SpreadChange {
    pub fn new(time: i64, spread: u32) -> Self {
        Self { time, spread }
    }
}

impl Default for SpreadChange {
    fn default() -> Self {
        Self { time: 0, spread: 1 }
    }
}

/// Source of spread decisions for a set of filters
pub trait SpreadProvider: Send + Sync + fmt::Debug {
    /// Spread changes that apply to a query with these filters
    fn spread_func(&self, filters: &[ColumnFilter]) -> Vec<SpreadChange>;
}

/// Same spread regardless of filters
#[derive(Debug, Clone, Default)]
pub struct StaticSpreadProvider {
    change: SpreadChange,
}

impl StaticSpreadProvider {
    pub fn new(change: SpreadChange) -> Self {
        Self { change }
    }
}

impl SpreadProvider for StaticSpreadProvider {
    fn spread_func(&self, _filters: &[ColumnFilter]) -> Vec<SpreadChange> {
        vec![self.change]
    }
}

/// Boxed spread function shared between providers
pub type SpreadFn = dyn Fn(&[ColumnFilter]) -> Vec<SpreadChange> + Send + Sync;

/// Spread decided by an arbitrary function of the filters
#[derive(Clone)]
pub struct FunctionalSpreadProvider {
    func: Arc<SpreadFn>,
}

impl FunctionalSpreadProvider {
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&[ColumnFilter]) -> Vec<SpreadChange> + Send + Sync + 'static,
    {
        Self {
            func: Arc::new(func),
        }
    }
}

impl fmt::Debug for FunctionalSpreadProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionalSpreadProvider").finish_non_exhaustive()
    }
}

impl SpreadProvider for FunctionalSpreadProvider {
    fn spread_func(&self, filters: &[ColumnFilter]) -> Vec<SpreadChange> {
        (self.func)(filters)
    }
}

/// Exact shard-key mapping to spread
pub type SpreadMap = HashMap<BTreeMap<String, String>, u32>;

/// Builds a [`SpreadMap`] from any collection of `(label, value)` pairs
#[derive(Debug, Clone, Default)]
pub struct SpreadMapBuilder {
    map: SpreadMap,
}

impl SpreadMapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map the exact set of `pairs` to `spread`; a later entry for the same set wins
    pub fn entry<I, K, V>(mut self, pairs: I, spread: u32) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let key = pairs
            .into_iter()
            .map(|(label, value)| (label.into(), value.into()))
            .collect();
        self.map.insert(key, spread);
        self
    }

    pub fn build(self) -> SpreadMap {
        self.map
    }
}

/// Build a spread function from a shard-key table
///
/// The equality filters on shard-key labels form a mapping that is looked up
/// exactly in `spread_map`: all matched labels, no more, no less. A query with
/// no shard-key filters looks up the empty mapping. Misses yield
/// `default_spread`. The result always holds a single change at time 0.
pub fn simple_map_spread_func<I, S>(
    shard_key_names: I,
    spread_map: SpreadMap,
    default_spread: u32,
) -> impl Fn(&[ColumnFilter]) -> Vec<SpreadChange> + Send + Sync + 'static
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let shard_key_names: Vec<String> = shard_key_names.into_iter().map(Into::into).collect();

    move |filters: &[ColumnFilter]| {
        let shard_key_values: BTreeMap<String, String> = filters
            .iter()
            .filter(|f| shard_key_names.contains(&f.column))
            .filter_map(|f| {
                f.equals_value()
                    .map(|value| (f.column.clone(), value.to_string()))
            })
            .collect();

        let spread = spread_map
            .get(&shard_key_values)
            .copied()
            .unwrap_or(default_spread);
        vec![SpreadChange::new(0, spread)]
    }
}

/// [`simple_map_spread_func`] wrapped as a provider for planner overrides
pub fn simple_map_spread_provider<I, S>(
    shard_key_names: I,
    spread_map: SpreadMap,
    default_spread: u32,
) -> FunctionalSpreadProvider
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    FunctionalSpreadProvider::new(simple_map_spread_func(
        shard_key_names,
        spread_map,
        default_spread,
    ))
}
