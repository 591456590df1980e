//! Error types for agentreview-core

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the agentreview-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// The sessions directory does not exist or is not a directory
    #[error("sessions directory does not exist: {}", .0.display())]
    SessionsDirMissing(PathBuf),

    /// The sessions directory contains no `*.jsonl` logs
    #[error("no session files (*.jsonl) found in {}", .0.display())]
    NoSessionFiles(PathBuf),

    /// Selected record count is above the configured ceiling
    #[error(
        "selected record count {count} exceeds --max-records {max}; \
         narrow the date window or pass --max-records 0 to disable the limit"
    )]
    RecordLimitExceeded { count: usize, max: usize },

    /// A date bound could not be parsed
    #[error("invalid date '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),

    /// A history snapshot could not be used
    #[error("snapshot error in {}: {message}", path.display())]
    Snapshot { path: PathBuf, message: String },
}

/// Result type alias for agentreview-core
pub type Result<T> = std::result::Result<T, Error>;
