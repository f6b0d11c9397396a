// Copyright (c) 2025 scanguard Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Reference eviction lock
//!
//! Queries take shared holds keyed by their id; the reclaimer takes the lock
//! exclusively, which waits until no shared hold remains. Shared acquisition
//! waits while an exclusive holder is active.

use crate::eviction::EvictionGuard;
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct LockState {
    /// Shared hold count per holder id
    holders: HashMap<String, usize>,
    exclusive: bool,
}

/// Shared/exclusive lock guarding block reclamation
#[derive(Debug, Default)]
pub struct EvictionLock {
    state: Mutex<LockState>,
    changed: Condvar,
}

impl EvictionLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a shared hold for `holder`, waiting up to `timeout` for the reclaimer
    ///
    /// Returns false on timeout. A holder may take several holds; each needs
    /// its own release.
    pub fn try_acquire_shared(&self, holder: &str, timeout: Duration) -> bool {
        let deadline = Instant::now().checked_add(timeout);
        let mut state = self.state.lock();
        while state.exclusive {
            if self.wait(&mut state, deadline) && state.exclusive {
                log::warn!(
                    "Timed out after {:?} waiting for shared eviction lock for {}",
                    timeout,
                    holder
                );
                return false;
            }
        }
        *state.holders.entry(holder.to_string()).or_insert(0) += 1;
        log::debug!("Shared eviction lock acquired by {}", holder);
        true
    }

    /// Drop one shared hold of `holder`
    ///
    /// Returns false if `holder` had none.
    pub fn release_shared(&self, holder: &str) -> bool {
        let mut state = self.state.lock();
        let remaining = match state.holders.get_mut(holder) {
            Some(count) => {
                *count -= 1;
                *count
            }
            None => {
                log::warn!("Ignoring unmatched eviction lock release for {}", holder);
                return false;
            }
        };
        if remaining == 0 {
            state.holders.remove(holder);
        }
        drop(state);
        self.changed.notify_all();
        log::debug!("Shared eviction lock released by {}", holder);
        true
    }

    /// Take the lock for reclamation, waiting up to `timeout` for shared holds to drain
    pub fn try_acquire_exclusive(&self, timeout: Duration) -> bool {
        let deadline = Instant::now().checked_add(timeout);
        let mut state = self.state.lock();
        while state.exclusive || !state.holders.is_empty() {
            if self.wait(&mut state, deadline) && (state.exclusive || !state.holders.is_empty()) {
                log::info!(
                    "Reclamation blocked by {} shared eviction lock holders",
                    state.holders.len()
                );
                return false;
            }
        }
        state.exclusive = true;
        true
    }

    pub fn release_exclusive(&self) {
        let mut state = self.state.lock();
        if !state.exclusive {
            log::warn!("Ignoring release of eviction lock that is not exclusively held");
            return;
        }
        state.exclusive = false;
        drop(state);
        self.changed.notify_all();
    }

    /// Ids currently holding a shared hold, sorted
    pub fn active_holders(&self) -> Vec<String> {
        let mut holders: Vec<String> = self.state.lock().holders.keys().cloned().collect();
        holders.sort();
        holders
    }

    /// Total shared holds across all holders
    pub fn shared_hold_count(&self) -> usize {
        self.state.lock().holders.values().sum()
    }

    pub fn is_exclusively_held(&self) -> bool {
        self.state.lock().exclusive
    }

    /// Returns true when the deadline passed
    fn wait(&self, state: &mut MutexGuard<'_, LockState>, deadline: Option<Instant>) -> bool {
        match deadline {
            Some(deadline) => self.changed.wait_until(state, deadline).timed_out(),
            None => {
                self.changed.wait(state);
                false
            }
        }
    }
}

impl EvictionGuard for EvictionLock {
    fn release(&self, token: &str) {
        self.release_shared(token);
    }
}
