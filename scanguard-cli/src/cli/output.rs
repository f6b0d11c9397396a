// Copyright (c) 2025 scanguard Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Statistics formatting for CLI output

use colored::*;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use scanguard::{QuerySession, StatSnapshot};

/// Render a session's per-group statistics as a table
pub fn format_session_stats(session: &QuerySession) -> String {
    let stats = session.query_stats();
    let mut output = String::new();

    output.push_str(&format!("{}\n", "Scan Statistics".bold().green()));
    output.push_str(&format!("Query: {}\n", session.query_id()));
    output.push_str(&format!("Groups: {}\n\n", stats.len()));

    if stats.is_empty() {
        output.push_str(&format!("{}\n", "No scans recorded".yellow()));
        return output;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(
        ["Group", "Partitions", "Chunks", "Result Bytes"]
            .iter()
            .map(|h| Cell::new(h).fg(Color::Green)),
    );

    for (group, snapshot) in stats.snapshot() {
        table.add_row(row_cells(group.to_string(), &snapshot));
    }
    table.add_row(row_cells("total".to_string(), &stats.totals()));

    output.push_str(&format!("{}\n", table));
    output
}

fn row_cells(label: String, snapshot: &StatSnapshot) -> Vec<Cell> {
    vec![
        Cell::new(label),
        Cell::new(snapshot.partitions_scanned),
        Cell::new(snapshot.chunks_scanned),
        Cell::new(snapshot.result_size),
    ]
}

/// Render session warnings and the partial-result flag
pub fn format_session_notes(session: &QuerySession) -> String {
    let mut output = String::new();
    for warning in session.warnings() {
        output.push_str(&format!("{} {}\n", "warning:".yellow().bold(), warning));
    }
    if session.result_could_be_partial() {
        output.push_str(&format!(
            "{} {}\n",
            "partial:".red().bold(),
            session.partial_result_reason().unwrap_or_default()
        ));
    }
    output
}
