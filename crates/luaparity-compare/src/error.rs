//! Comparison error types.

use luaparity_corpus::CorpusError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias for comparison operations.
pub type CompareResult<T> = Result<T, CompareError>;

/// Errors that can occur while comparing captured outputs.
#[derive(Debug, Error)]
pub enum CompareError {
    #[error("Results directory not found: {path} (run 'luaparity run' first)")]
    ResultsDirNotFound { path: PathBuf },

    #[error("Failed to load allowlist {path}: {error}")]
    AllowlistError { path: PathBuf, error: String },

    #[error("Failed to write report {path}: {error}")]
    ReportError { path: PathBuf, error: String },

    #[error("I/O error at {path}: {error}")]
    IoError { path: PathBuf, error: io::Error },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Corpus(#[from] CorpusError),
}

impl CompareError {
    pub fn results_dir_not_found(path: impl Into<PathBuf>) -> Self {
        Self::ResultsDirNotFound { path: path.into() }
    }

    pub fn allowlist(path: impl Into<PathBuf>, error: impl ToString) -> Self {
        Self::AllowlistError {
            path: path.into(),
            error: error.to_string(),
        }
    }

    pub fn report(path: impl Into<PathBuf>, error: impl ToString) -> Self {
        Self::ReportError {
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
