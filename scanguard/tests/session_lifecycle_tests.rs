//! Integration tests for the eviction guard lifecycle of query sessions
//!
//! These tests verify that:
//! 1. A held guard is released exactly once, with the query id as token
//! 2. Strict sessions reject a second guard; relaxed sessions replace it
//! 3. The guard is released when the session is dropped on an error path
//! 4. The closing thread may differ from the thread that bound the guard

#[path = "testutils/mod.rs"]
mod testutils;

use scanguard::{EvictionLock, GuardState, QueryError, QueryResult, QuerySession};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use testutils::{relaxed_session, strict_session, RecordingGuard};

#[test]
fn test_close_twice_releases_once() {
    let guard = RecordingGuard::new();
    let session = strict_session();
    session.set_guard(guard.clone()).unwrap();

    session.close();
    session.close();

    assert_eq!(guard.release_count(), 1);
    assert_eq!(guard.tokens(), vec![session.query_id().to_string()]);
}

#[test]
fn test_strict_duplicate_acquisition() {
    let session = strict_session();
    session.set_guard(RecordingGuard::new()).unwrap();

    match session.set_guard(RecordingGuard::new()) {
        Err(QueryError::DuplicateAcquisition { query_id }) => {
            assert_eq!(query_id, session.query_id());
        }
        other => panic!("expected duplicate acquisition, got {:?}", other),
    }
    assert_eq!(session.guard_state(), GuardState::Set);
}

#[test]
fn test_relaxed_replacement_raises_no_error() {
    let first = RecordingGuard::new();
    let second = RecordingGuard::new();
    let session = relaxed_session();

    assert!(session.set_guard(first.clone()).is_ok());
    assert!(session.set_guard(second.clone()).is_ok());
    drop(session);

    assert_eq!(first.release_count(), 0);
    assert_eq!(second.release_count(), 1);
}

fn run_failing_query(session: &QuerySession, lock: &Arc<EvictionLock>) -> QueryResult<()> {
    session.acquire_eviction_lock(lock, Duration::from_millis(50))?;
    session.query_stats().counters(["shard-0"]).increment_partitions(1);
    Err(QueryError::Config("executor failed".to_string()))
}

#[test]
fn test_guard_released_on_error_path() {
    let lock = Arc::new(EvictionLock::new());
    {
        let session = strict_session();
        assert!(run_failing_query(&session, &lock).is_err());
        assert_eq!(lock.shared_hold_count(), 1);
    }
    assert_eq!(lock.shared_hold_count(), 0);
    assert!(lock.try_acquire_exclusive(Duration::from_millis(50)));
}

#[test]
fn test_guard_released_on_panic() {
    let guard = RecordingGuard::new();
    let for_thread = guard.clone();
    let result = thread::spawn(move || {
        let session = strict_session();
        session.set_guard(for_thread).unwrap();
        panic!("scan worker blew up");
    })
    .join();

    assert!(result.is_err());
    assert_eq!(guard.release_count(), 1);
}

#[test]
fn test_close_from_completion_thread() {
    let guard = RecordingGuard::new();
    let session = Arc::new(strict_session());
    session.set_guard(guard.clone()).unwrap();

    let closers: Vec<_> = (0..4)
        .map(|_| {
            let session = Arc::clone(&session);
            thread::spawn(move || session.close())
        })
        .collect();
    for closer in closers {
        closer.join().unwrap();
    }

    assert_eq!(guard.release_count(), 1);
    assert_eq!(session.guard_state(), GuardState::Released);
}

#[test]
fn test_reclaimer_waits_for_session() {
    let lock = Arc::new(EvictionLock::new());
    let session = strict_session();
    assert!(session
        .acquire_eviction_lock(&lock, Duration::from_millis(50))
        .unwrap());

    assert!(!lock.try_acquire_exclusive(Duration::from_millis(20)));
    session.close();
    assert!(lock.try_acquire_exclusive(Duration::from_millis(20)));
}
