//! Concurrency tests for scan statistics
//!
//! Many workers update one query's statistics at once; totals must not
//! depend on how the updates interleave.

#[path = "testutils/mod.rs"]
mod testutils;

use rayon::prelude::*;
use scanguard::{GroupKey, QueryStats, StatSnapshot};
use std::sync::Arc;
use std::thread;
use testutils::strict_session;

#[test]
fn test_parallel_increments_sum_exactly() {
    let stats = QueryStats::new();
    let per_worker: Vec<u64> = (1..=64).collect();

    per_worker.par_iter().for_each(|&n| {
        let stat = stats.counters(["shard-0"]);
        for _ in 0..n {
            stat.increment_partitions(1);
            stat.increment_chunks(2);
            stat.add_result_size(n);
        }
    });

    let expected_partitions: u64 = per_worker.iter().sum();
    let expected_bytes: u64 = per_worker.iter().map(|n| n * n).sum();
    let totals = stats.totals();
    assert_eq!(totals.partitions_scanned, expected_partitions);
    assert_eq!(totals.chunks_scanned, expected_partitions * 2);
    assert_eq!(totals.result_size, expected_bytes);
    assert_eq!(stats.len(), 1);
}

#[test]
fn test_racing_creators_share_one_group() {
    let stats = Arc::new(QueryStats::new());
    let barrier = Arc::new(std::sync::Barrier::new(32));

    let handles: Vec<_> = (0..32)
        .map(|_| {
            let stats = Arc::clone(&stats);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let stat = stats.counters(["hot", "group"]);
                stat.increment_chunks(1);
                stat
            })
        })
        .collect();
    let returned: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(stats.len(), 1);
    for stat in &returned {
        assert!(Arc::ptr_eq(stat, &returned[0]));
        assert_eq!(stat.chunks_scanned(), 32);
    }
}

#[test]
fn test_workers_across_groups() {
    let session = strict_session();
    let shards: Vec<String> = (0..8).map(|i| format!("shard-{}", i)).collect();

    (0..800u64).into_par_iter().for_each(|task| {
        let shard = &shards[(task % 8) as usize];
        let stat = session.query_stats().counters(GroupKey::new(vec![shard.clone()]));
        stat.increment_partitions(1);
        stat.increment_chunks(task % 3);
    });

    let snapshot = session.query_stats().snapshot();
    assert_eq!(snapshot.len(), 8);
    for stat in snapshot.values() {
        assert_eq!(stat.partitions_scanned, 100);
    }
    let expected_chunks: u64 = (0..800u64).map(|t| t % 3).sum();
    assert_eq!(session.query_stats().totals().chunks_scanned, expected_chunks);
}

fn registry(entries: &[(&str, u64, u64, u64)]) -> QueryStats {
    let stats = QueryStats::new();
    for (group, partitions, chunks, bytes) in entries {
        let stat = stats.counters([*group]);
        stat.increment_partitions(*partitions);
        stat.increment_chunks(*chunks);
        stat.add_result_size(*bytes);
    }
    stats
}

#[test]
fn test_merge_is_commutative_and_associative() {
    let a = || registry(&[("x", 1, 2, 3), ("y", 4, 5, 6)]);
    let b = || registry(&[("x", 10, 20, 30)]);
    let c = || registry(&[("z", 7, 8, 9), ("y", 1, 1, 1)]);

    // (a + b) + c
    let left = a();
    left.merge(&b());
    left.merge(&c());

    // a + (b + c)
    let bc = b();
    bc.merge(&c());
    let right = a();
    right.merge(&bc);

    // c + b + a
    let reversed = c();
    reversed.merge(&b());
    reversed.merge(&a());

    assert_eq!(left.snapshot(), right.snapshot());
    assert_eq!(left.snapshot(), reversed.snapshot());

    let merged = left.snapshot();
    assert_eq!(
        merged[&GroupKey::from(["x"])],
        StatSnapshot {
            partitions_scanned: 11,
            chunks_scanned: 22,
            result_size: 33,
        }
    );
    assert_eq!(merged[&GroupKey::from(["y"])].partitions_scanned, 5);
    assert_eq!(merged[&GroupKey::from(["z"])].result_size, 9);
}

#[test]
fn test_merge_per_worker_registries() {
    let query_total = QueryStats::new();
    let worker_stats: Vec<QueryStats> = (0..4)
        .into_par_iter()
        .map(|worker| {
            let local = QueryStats::new();
            local.counters([format!("shard-{}", worker % 2).as_str()]).increment_partitions(5);
            local
        })
        .collect();

    for local in &worker_stats {
        query_total.merge(local);
    }

    assert_eq!(query_total.len(), 2);
    assert_eq!(query_total.totals().partitions_scanned, 20);
}

#[test]
fn test_merge_concurrent_with_increments() {
    let target = QueryStats::new();
    let source = registry(&[("a", 100, 0, 0)]);

    thread::scope(|scope| {
        scope.spawn(|| {
            for _ in 0..1000 {
                target.counters(["a"]).increment_partitions(1);
            }
        });
        scope.spawn(|| target.merge(&source));
    });

    assert_eq!(target.counters(["a"]).partitions_scanned(), 1100);
}

#[test]
fn test_empty_key_never_resolves_to_a_group_created_concurrently() {
    let stats = QueryStats::new();
    let pre_existing = stats.counters(["shard-0"]);
    let start = std::sync::Barrier::new(8);

    let resolved: Vec<Arc<scanguard::Stat>> = thread::scope(|scope| {
        for creator in 0..4 {
            let stats = &stats;
            let start = &start;
            scope.spawn(move || {
                start.wait();
                for i in 0..200 {
                    stats.counters([format!("shard-{}-{}", creator, i).as_str()]);
                }
            });
        }
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let stats = &stats;
                let start = &start;
                scope.spawn(move || {
                    start.wait();
                    (0..200)
                        .map(|_| stats.counters(GroupKey::empty()))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        readers
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect()
    });

    let ungrouped = stats.get(&GroupKey::empty());
    for stat in &resolved {
        let is_pre_existing = Arc::ptr_eq(stat, &pre_existing);
        let is_ungrouped = ungrouped
            .as_ref()
            .map_or(false, |bucket| Arc::ptr_eq(stat, bucket));
        assert!(is_pre_existing || is_ungrouped);
    }
    assert_eq!(stats.len(), 1 + 4 * 200 + usize::from(ungrouped.is_some()));
}
