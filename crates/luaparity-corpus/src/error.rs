/// Corpus error types
use std::path::PathBuf;
use thiserror::Error;

pub type CorpusResult<T> = Result<T, CorpusError>;

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("Corpus directory not found: {path}")]
    DirNotFound { path: PathBuf },

    #[error("I/O error at {path}: {error}")]
    IoError {
        path: PathBuf,
        error: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CorpusError {
    /// Create a directory-not-found error
    pub fn dir_not_found(path: impl Into<PathBuf>) -> Self {
        Self::DirNotFound { path: path.into() }
    }

    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            error,
        }
    }
}
