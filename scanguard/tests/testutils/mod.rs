//! Shared helpers for scanguard integration tests

#![allow(dead_code)]

use parking_lot::Mutex;
use scanguard::{EvictionGuard, QueryConfig, QueryContext, QuerySession};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Guard that records every release it receives
#[derive(Default)]
pub struct RecordingGuard {
    releases: AtomicUsize,
    tokens: Mutex<Vec<String>>,
}

impl RecordingGuard {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn release_count(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    pub fn tokens(&self) -> Vec<String> {
        self.tokens.lock().clone()
    }
}

impl EvictionGuard for RecordingGuard {
    fn release(&self, token: &str) {
        self.releases.fetch_add(1, Ordering::SeqCst);
        self.tokens.lock().push(token.to_string());
    }
}

pub fn strict_session() -> QuerySession {
    QuerySession::new(QueryContext::unavailable(), Arc::new(QueryConfig::for_tests()))
}

pub fn relaxed_session() -> QuerySession {
    QuerySession::with_strictness(
        QueryContext::unavailable(),
        Arc::new(QueryConfig::for_tests()),
        false,
    )
}
