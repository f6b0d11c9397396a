// Copyright (c) 2025 scanguard Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Execution session for one query attempt
//!
//! A [`QuerySession`] owns the query's scan statistics and at most one
//! eviction guard. The guard slot moves `Unset -> Set -> Released`; `close`
//! is the only path that releases the guard, and it does so at most once.
//! Dropping the session closes it, so early returns and panics in the code
//! that owns the session still release the hold.

use crate::context::{LimitBreach, QueryContext};
use crate::error::{QueryError, QueryResult};
use crate::eviction::{EvictionGuard, EvictionLock};
use crate::session::config::QueryConfig;
use crate::stats::QueryStats;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Observable state of a session's guard slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Unset,
    Set,
    Released,
}

enum GuardSlot {
    Unset,
    Set(Arc<dyn EvictionGuard>),
    Released,
}

impl GuardSlot {
    fn state(&self) -> GuardState {
        match self {
            GuardSlot::Unset => GuardState::Unset,
            GuardSlot::Set(_) => GuardState::Set,
            GuardSlot::Released => GuardState::Released,
        }
    }
}

/// Per-execution state of one query
pub struct QuerySession {
    query_context: QueryContext,
    query_config: Arc<QueryConfig>,
    /// Strict mode rejects a second guard instead of replacing the first
    catch_multiple_lock_set_errors: bool,
    query_stats: QueryStats,
    guard: Mutex<GuardSlot>,

    // Set by downstream executors when results are degraded
    result_could_be_partial: AtomicBool,
    partial_result_reason: Mutex<Option<String>>,
    warnings: Mutex<Vec<String>>,
}

impl QuerySession {
    /// Open a strict session
    pub fn new(query_context: QueryContext, query_config: Arc<QueryConfig>) -> Self {
        Self::with_strictness(query_context, query_config, true)
    }

    /// Open a session, choosing whether a second `set_guard` is an error
    ///
    /// Relaxed mode exists for test harnesses that swap guards freely. In that
    /// mode a replaced guard is never released through this session.
    pub fn with_strictness(
        query_context: QueryContext,
        query_config: Arc<QueryConfig>,
        catch_multiple_lock_set_errors: bool,
    ) -> Self {
        log::debug!(
            "Opening query session {} (strict: {})",
            query_context.query_id(),
            catch_multiple_lock_set_errors
        );
        Self {
            query_context,
            query_config,
            catch_multiple_lock_set_errors,
            query_stats: QueryStats::new(),
            guard: Mutex::new(GuardSlot::Unset),
            result_could_be_partial: AtomicBool::new(false),
            partial_result_reason: Mutex::new(None),
            warnings: Mutex::new(Vec::new()),
        }
    }

    pub fn query_context(&self) -> &QueryContext {
        &self.query_context
    }

    pub fn query_id(&self) -> &str {
        self.query_context.query_id()
    }

    pub fn config(&self) -> &QueryConfig {
        &self.query_config
    }

    pub fn is_strict(&self) -> bool {
        self.catch_multiple_lock_set_errors
    }

    /// Scan statistics of this execution
    pub fn query_stats(&self) -> &QueryStats {
        &self.query_stats
    }

    pub fn guard_state(&self) -> GuardState {
        self.guard.lock().state()
    }

    /// Bind an acquired eviction guard to this execution
    ///
    /// In strict mode a session that already had a guard bound fails with
    /// [`QueryError::DuplicateAcquisition`] and keeps its current guard; the
    /// caller still owns the release of the one it passed in.
    pub fn set_guard(&self, guard: Arc<dyn EvictionGuard>) -> QueryResult<()> {
        let mut slot = self.guard.lock();
        match &*slot {
            GuardSlot::Unset => {}
            _ if self.catch_multiple_lock_set_errors => {
                log::error!(
                    "Eviction guard set twice for query {}",
                    self.query_id()
                );
                return Err(QueryError::DuplicateAcquisition {
                    query_id: self.query_id().to_string(),
                });
            }
            GuardSlot::Set(_) => {
                log::warn!(
                    "Replacing eviction guard of query {}; the previous hold will not be released by this session",
                    self.query_id()
                );
            }
            GuardSlot::Released => {
                log::warn!(
                    "Binding eviction guard to already closed query {}",
                    self.query_id()
                );
            }
        }
        *slot = GuardSlot::Set(guard);
        log::debug!("Eviction guard bound to query {}", self.query_id());
        Ok(())
    }

    /// Take a shared hold on `lock` for this query and bind it
    ///
    /// Returns `Ok(false)` if the hold could not be taken within `timeout`.
    /// If binding fails the fresh hold is released before the error returns.
    pub fn acquire_eviction_lock(
        &self,
        lock: &Arc<EvictionLock>,
        timeout: Duration,
    ) -> QueryResult<bool> {
        if self.catch_multiple_lock_set_errors && self.guard_state() != GuardState::Unset {
            return Err(QueryError::DuplicateAcquisition {
                query_id: self.query_id().to_string(),
            });
        }
        if !lock.try_acquire_shared(self.query_id(), timeout) {
            return Ok(false);
        }
        let guard: Arc<dyn EvictionGuard> = Arc::clone(lock) as Arc<dyn EvictionGuard>;
        if let Err(err) = self.set_guard(guard) {
            lock.release_shared(self.query_id());
            return Err(err);
        }
        Ok(true)
    }

    /// Release the held guard, if any
    ///
    /// Idempotent: a guard is released at most once no matter how many times
    /// this runs. The release call happens outside the slot lock.
    pub fn close(&self) {
        let released = {
            let mut slot = self.guard.lock();
            match std::mem::replace(&mut *slot, GuardSlot::Released) {
                GuardSlot::Set(guard) => Some(guard),
                other => {
                    *slot = other;
                    None
                }
            }
        };

        if let Some(guard) = released {
            guard.release(self.query_id());
            log::debug!(
                "Closed query session {}: {}",
                self.query_id(),
                self.query_stats.totals()
            );
        }
    }

    pub fn result_could_be_partial(&self) -> bool {
        self.result_could_be_partial.load(Ordering::Acquire)
    }

    pub fn set_result_could_be_partial(&self, partial: bool) {
        self.result_could_be_partial.store(partial, Ordering::Release);
    }

    pub fn partial_result_reason(&self) -> Option<String> {
        self.partial_result_reason.lock().clone()
    }

    /// Flag the result as possibly partial and record why
    pub fn mark_partial(&self, reason: impl Into<String>) {
        let reason = reason.into();
        log::info!("Query {} may return partial results: {}", self.query_id(), reason);
        *self.partial_result_reason.lock() = Some(reason);
        self.set_result_could_be_partial(true);
    }

    pub fn add_warning(&self, warning: impl Into<String>) {
        self.warnings.lock().push(warning.into());
    }

    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().clone()
    }

    /// Compare scan totals with the planner's warn limits and record a warning per breach
    pub fn check_warn_limits(&self) -> Vec<LimitBreach> {
        let totals = self.query_stats.totals();
        let breaches = self
            .query_context
            .planner_params()
            .warn_limits
            .check_scan(&totals);
        for breach in &breaches {
            log::warn!("Query {} {}", self.query_id(), breach);
            self.add_warning(breach.to_string());
        }
        breaches
    }
}

impl fmt::Debug for QuerySession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuerySession")
            .field("query_id", &self.query_id())
            .field("strict", &self.catch_multiple_lock_set_errors)
            .field("guard", &self.guard_state())
            .field("groups", &self.query_stats.len())
            .field("result_could_be_partial", &self.result_could_be_partial())
            .finish()
    }
}

impl Drop for QuerySession {
    fn drop(&mut self) {
        self.close();
    }
}
