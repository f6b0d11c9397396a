// Copyright (c) 2025 scanguard Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Scan simulation and config validation commands

use crate::cli::commands::SimulateArgs;
use crate::cli::output;
use colored::{ColoredString, Colorize};
use rayon::prelude::*;
use scanguard::session::DEFAULT_QUERY_CONFIG;
use scanguard::{
    EvictionLock, GroupKey, PlannerParams, PromQlQueryParams, QueryConfig, QueryContext,
    QueryParams, QueryResult, QuerySession,
};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Run `args.tasks` scan tasks on a worker pool, all under one query session
pub fn handle_simulate(args: SimulateArgs) -> Result<(), Box<dyn Error>> {
    let config = load_config(args.config.as_deref())?;
    let workers = args.workers.unwrap_or(config.parallel_scan_workers);
    if args.groups == 0 {
        return Err("--groups must be at least 1".into());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("scan-worker-{}", i))
        .build()?;

    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)?
        .as_secs() as i64;
    let context = QueryContext::new(
        QueryParams::PromQl(PromQlQueryParams::new(&args.query, now - 3600, 60, now)),
        PlannerParams::default(),
    );
    let session = QuerySession::with_strictness(context, Arc::new(config), !args.relaxed);
    let lock = Arc::new(EvictionLock::new());

    if !session.acquire_eviction_lock(&lock, Duration::from_millis(args.lock_timeout_ms))? {
        return Err("timed out waiting for the eviction lock".into());
    }
    log::info!(
        "Running {} scan tasks over {} groups on {} workers",
        args.tasks,
        args.groups,
        workers
    );

    let groups: Vec<GroupKey> = (0..args.groups)
        .map(|i| GroupKey::new(vec![format!("shard-{}", i)]))
        .collect();

    pool.install(|| {
        (0..args.tasks).into_par_iter().for_each(|task| {
            let mut rng = fastrand::Rng::with_seed(args.seed ^ task);
            let group = &groups[(task % groups.len() as u64) as usize];
            let stat = session.query_stats().counters(group);
            stat.increment_partitions(1);
            stat.increment_chunks(rng.u64(1..=32));
            stat.add_result_size(rng.u64(64..=4096));
        });
    });

    let blocked = !lock.try_acquire_exclusive(Duration::ZERO);
    session.check_warn_limits();
    session.close();
    let reclaimable = lock.try_acquire_exclusive(Duration::from_millis(args.lock_timeout_ms));

    print!("{}", output::format_session_stats(&session));
    print!("{}", output::format_session_notes(&session));
    println!(
        "Reclamation blocked while scanning: {}",
        yes_no(blocked)
    );
    println!("Reclamation possible after close: {}", yes_no(reclaimable));
    Ok(())
}

/// Read `path`, or fall back to the process-wide default configuration
fn load_config(path: Option<&Path>) -> QueryResult<QueryConfig> {
    match path {
        Some(path) => QueryConfig::from_json_file(path),
        None => Ok(DEFAULT_QUERY_CONFIG.clone()),
    }
}

/// Validate a JSON query configuration file
pub fn handle_check_config(path: PathBuf) -> Result<(), Box<dyn Error>> {
    let config = QueryConfig::from_json_file(&path)?;
    println!("{} {}", "✅ valid config:".green(), path.display());
    println!("  parallel_scan_workers: {}", config.parallel_scan_workers);
    println!("  ask_timeout: {:?}", config.ask_timeout);
    println!("  min_step: {:?}", config.min_step);
    Ok(())
}

fn yes_no(value: bool) -> ColoredString {
    if value {
        "yes".green()
    } else {
        "no".red()
    }
}
