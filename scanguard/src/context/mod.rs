// Copyright (c) 2025 scanguard Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Query descriptor
//!
//! Everything a query carries from planning into execution: its identity,
//! the request it came from, planner configuration and trace metadata.
//! None of it changes once the query is built.

pub mod planner_params;
pub mod query_context;
pub mod spread;

pub use planner_params::{LimitBreach, PerQueryLimits, PlannerParams};
pub use query_context::{PromQlQueryParams, QueryContext, QueryParams};
pub use spread::{
    simple_map_spread_func, simple_map_spread_provider, ColumnFilter, Filter,
    FunctionalSpreadProvider, SpreadChange, SpreadMap, SpreadMapBuilder, SpreadProvider,
    StaticSpreadProvider,
};
