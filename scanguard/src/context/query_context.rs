// Copyright (c) 2025 scanguard Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Immutable identity and configuration of one query

use crate::context::planner_params::PlannerParams;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Parameters of a PromQL range query as received from the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromQlQueryParams {
    pub promql: String,
    pub start_secs: i64,
    pub step_secs: i64,
    pub end_secs: i64,
    /// Path used when the query is forwarded to a remote partition
    pub remote_query_path: Option<String>,
    pub verbose: bool,
}

impl PromQlQueryParams {
    pub fn new(promql: impl Into<String>, start_secs: i64, step_secs: i64, end_secs: i64) -> Self {
        Self {
            promql: promql.into(),
            start_secs,
            step_secs,
            end_secs,
            remote_query_path: None,
            verbose: false,
        }
    }
}

/// Original request behind a query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryParams {
    PromQl(PromQlQueryParams),
    /// No original request exists, e.g. internally generated sub-queries
    #[default]
    Unavailable,
}

impl QueryParams {
    pub fn is_available(&self) -> bool {
        !matches!(self, QueryParams::Unavailable)
    }

    pub fn promql(&self) -> Option<&str> {
        match self {
            QueryParams::PromQl(params) => Some(params.promql.as_str()),
            QueryParams::Unavailable => None,
        }
    }
}

/// Identity and configuration bound to one query
///
/// The `query_id` is generated once in [`QueryContext::new`]. Cloning keeps it,
/// since a clone describes the same query; [`QueryContext::derive_sub_query`]
/// is the way to get a related query with its own identity. The id doubles as
/// the token the eviction lock is released with.
#[derive(Debug, Clone, Serialize)]
pub struct QueryContext {
    query_id: String,
    submit_time: DateTime<Utc>,
    orig_query_params: QueryParams,
    planner_params: PlannerParams,
    trace_info: BTreeMap<String, String>,
}

impl QueryContext {
    pub fn new(orig_query_params: QueryParams, planner_params: PlannerParams) -> Self {
        Self {
            query_id: uuid::Uuid::new_v4().to_string(),
            submit_time: Utc::now(),
            orig_query_params,
            planner_params,
            trace_info: BTreeMap::new(),
        }
    }

    /// Context for a query that has no original request
    pub fn unavailable() -> Self {
        Self::new(QueryParams::Unavailable, PlannerParams::default())
    }

    pub fn with_planner_params(mut self, planner_params: PlannerParams) -> Self {
        self.planner_params = planner_params;
        self
    }

    pub fn with_trace_info(mut self, trace_info: BTreeMap<String, String>) -> Self {
        self.trace_info = trace_info;
        self
    }

    pub fn with_submit_time(mut self, submit_time: DateTime<Utc>) -> Self {
        self.submit_time = submit_time;
        self
    }

    /// New context with a fresh id, sharing this one's parameters and trace metadata
    pub fn derive_sub_query(&self) -> Self {
        Self::new(self.orig_query_params.clone(), self.planner_params.clone())
            .with_trace_info(self.trace_info.clone())
    }

    pub fn query_id(&self) -> &str {
        &self.query_id
    }

    pub fn submit_time(&self) -> DateTime<Utc> {
        self.submit_time
    }

    pub fn orig_query_params(&self) -> &QueryParams {
        &self.orig_query_params
    }

    pub fn planner_params(&self) -> &PlannerParams {
        &self.planner_params
    }

    pub fn trace_info(&self) -> &BTreeMap<String, String> {
        &self.trace_info
    }

    /// When the query's advisory timeout runs out
    pub fn query_deadline(&self) -> DateTime<Utc> {
        match chrono::Duration::from_std(self.planner_params.query_timeout) {
            Ok(timeout) => self
                .submit_time
                .checked_add_signed(timeout)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            Err(_) => DateTime::<Utc>::MAX_UTC,
        }
    }

    /// Time left before the deadline, zero once it has passed
    pub fn remaining_time(&self, now: DateTime<Utc>) -> Duration {
        (self.query_deadline() - now)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_id_generated_per_construction() {
        let a = QueryContext::unavailable();
        let b = QueryContext::unavailable();
        assert_ne!(a.query_id(), b.query_id());
        assert!(uuid::Uuid::parse_str(a.query_id()).is_ok());
    }

    #[test]
    fn test_clone_keeps_identity() {
        let ctx = QueryContext::unavailable();
        let copy = ctx.clone();
        assert_eq!(ctx.query_id(), copy.query_id());
        assert_eq!(ctx.submit_time(), copy.submit_time());
    }

    #[test]
    fn test_builders_keep_identity() {
        let ctx = QueryContext::unavailable();
        let id = ctx.query_id().to_string();
        let mut trace = BTreeMap::new();
        trace.insert("traceparent".to_string(), "00-abc-def-01".to_string());

        let ctx = ctx
            .with_planner_params(PlannerParams::with_spread(3))
            .with_trace_info(trace);
        assert_eq!(ctx.query_id(), id);
        assert_eq!(ctx.planner_params().spread, Some(3));
        assert_eq!(ctx.trace_info()["traceparent"], "00-abc-def-01");
    }

    #[test]
    fn test_derive_sub_query_gets_new_id() {
        let mut trace = BTreeMap::new();
        trace.insert("span".to_string(), "1".to_string());
        let parent = QueryContext::new(
            QueryParams::PromQl(PromQlQueryParams::new("up", 0, 60, 3600)),
            PlannerParams::default(),
        )
        .with_trace_info(trace);

        let child = parent.derive_sub_query();
        assert_ne!(parent.query_id(), child.query_id());
        assert_eq!(child.orig_query_params().promql(), Some("up"));
        assert_eq!(child.trace_info(), parent.trace_info());
    }

    #[test]
    fn test_query_params_variants() {
        assert!(!QueryParams::default().is_available());
        assert_eq!(QueryParams::Unavailable.promql(), None);

        let params = QueryParams::PromQl(PromQlQueryParams::new("sum(rate(x[5m]))", 10, 15, 70));
        assert!(params.is_available());
        assert_eq!(params.promql(), Some("sum(rate(x[5m]))"));
    }

    #[test]
    fn test_deadline_and_remaining_time() {
        let submitted = Utc::now();
        let ctx = QueryContext::unavailable().with_submit_time(submitted);
        assert_eq!(
            ctx.query_deadline(),
            submitted + chrono::Duration::seconds(30)
        );
        assert_eq!(
            ctx.remaining_time(submitted + chrono::Duration::seconds(10)),
            Duration::from_secs(20)
        );
        assert_eq!(
            ctx.remaining_time(submitted + chrono::Duration::seconds(31)),
            Duration::ZERO
        );
    }

    #[test]
    fn test_context_serializes_to_json() {
        let ctx = QueryContext::new(
            QueryParams::PromQl(PromQlQueryParams::new("up", 0, 60, 120)),
            PlannerParams::default(),
        );
        let json = serde_json::to_value(&ctx).unwrap();
        assert_eq!(json["query_id"], ctx.query_id());
        assert_eq!(json["orig_query_params"]["PromQl"]["promql"], "up");
    }
}
