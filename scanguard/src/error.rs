// Copyright (c) 2025 scanguard Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Query bookkeeping error types

use thiserror::Error;

/// Result type for query bookkeeping operations
pub type QueryResult<T> = Result<T, QueryError>;

/// Query bookkeeping errors
#[derive(Error, Debug)]
pub enum QueryError {
    /// Two code paths tried to bind an eviction guard to the same query execution.
    /// Raised only in strict mode; the caller must abort session setup.
    #[error("Eviction guard already bound to query execution {query_id}")]
    DuplicateAcquisition { query_id: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl QueryError {
    /// Returns true if this error signals a guard double-acquisition logic bug
    pub fn is_duplicate_acquisition(&self) -> bool {
        matches!(self, QueryError::DuplicateAcquisition { .. })
    }
}
