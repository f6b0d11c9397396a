// Copyright (c) 2025 scanguard Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! CLI module for scanguard
//!
//! Runs scan simulations against the bookkeeping core and validates
//! query configuration files.

pub mod commands;
pub mod output;
pub mod simulate;

pub use commands::{Cli, Commands};
pub use simulate::{handle_check_config, handle_simulate};
