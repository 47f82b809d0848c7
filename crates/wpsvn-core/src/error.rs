//! Error types shared by the wpsvn crates.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Version string could not be parsed.
    #[error("invalid version '{0}'")]
    InvalidVersion(String),

    /// JSON error.
    #[error("json error: {0}")]
    Json(#[from] sonic_rs::Error),

    /// IO error.
    #[error("io error at {path}: {message}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Error message.
        message: String,
    },
}

impl Error {
    /// Create an IO error with context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;
