// Copyright (c) 2025 scanguard Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Command-line argument definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "scanguard", version, about = "Query scan bookkeeping simulator")]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log level
    #[arg(long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print version information
    Version,

    /// Run concurrent scan workers for one query and report its statistics
    Simulate(SimulateArgs),

    /// Validate a query configuration file
    CheckConfig {
        /// Path to a JSON query configuration
        path: PathBuf,
    },
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// PromQL text recorded as the query's original request
    #[arg(long, default_value = "sum(rate(http_requests_total[5m]))")]
    pub query: String,

    /// Worker threads; defaults to the config's parallel_scan_workers
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Number of statistics groups (shards)
    #[arg(short, long, default_value_t = 4)]
    pub groups: usize,

    /// Number of scan tasks spread over the groups
    #[arg(short, long, default_value_t = 1000)]
    pub tasks: u64,

    /// Seed for the simulated scan sizes
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Let a second guard replace the first instead of failing
    #[arg(long)]
    pub relaxed: bool,

    /// Milliseconds to wait for the shared eviction hold
    #[arg(long, default_value_t = 1000)]
    pub lock_timeout_ms: u64,

    /// JSON query configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}
