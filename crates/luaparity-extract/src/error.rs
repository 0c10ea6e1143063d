//! Extraction error types.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias for extraction operations.
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Errors that abort an extraction run.
///
/// Per-file read failures are collected as strings on the extraction
/// result instead; only output-side failures are fatal.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Failed to write manifest {path}: {error}")]
    ManifestError { path: PathBuf, error: String },

    #[error("I/O error at {path}: {error}")]
    IoError { path: PathBuf, error: io::Error },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ExtractError {
    pub fn manifest(path: impl Into<PathBuf>, error: impl ToString) -> Self {
        Self::ManifestError {
            path: path.into(),
            error: error.to_string(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, error: io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            error,
        }
    }
}
