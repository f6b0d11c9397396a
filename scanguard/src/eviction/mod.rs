// Copyright (c) 2025 scanguard Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Eviction guard boundary
//!
//! The columnar store reclaims memory blocks only while no query holds a
//! shared hold on its eviction lock. Acquisition happens on the store side
//! before a guard reaches a [`QuerySession`](crate::session::QuerySession);
//! the session only ever releases it, once, with the query id as token.

pub mod lock;

pub use lock::EvictionLock;

/// A shared hold that blocks block reclamation until released
pub trait EvictionGuard: Send + Sync {
    /// Release the hold registered under `token`
    ///
    /// Implementations must tolerate unmatched or repeated releases.
    fn release(&self, token: &str);
}
