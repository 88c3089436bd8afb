//! Error types for chatpulse-core

use chrono::NaiveDate;
use thiserror::Error;

/// Main error type for the chatpulse-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// The record source failed to deliver a window
    #[error("record fetch failed: {0}")]
    Fetch(String),

    /// The record source did not answer in time
    #[error("record fetch timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Unknown report mode requested
    #[error("unknown report mode: {0}")]
    InvalidMode(String),

    /// Start date after end date
    #[error("invalid date range: {start} is after {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    /// An aggregation task did not complete
    #[error("analysis task failed: {0}")]
    Analysis(String),

    /// Bad glob pattern for export files
    #[error("invalid file pattern: {0}")]
    Glob(String),
}

/// Result type alias for chatpulse-core
pub type Result<T> = std::result::Result<T, Error>;
