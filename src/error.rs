//! Error types for the reword engine.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for scan and refactoring operations.
#[derive(Error, Debug)]
pub enum RewordError {
    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to back up {path}: {source}")]
    BackupFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No files selected for execution")]
    NoFilesSelected,

    #[error("No rules supplied")]
    NoRules,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for reword operations.
pub type Result<T> = std::result::Result<T, RewordError>;
