/// Runner error types
use std::path::PathBuf;
use thiserror::Error;

use luaparity_corpus::CorpusError;

pub type RunnerResult<T> = Result<T, RunnerError>;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Fixtures directory not found: {path} (run 'luaparity extract' first)")]
    FixturesDirNotFound { path: PathBuf },

    #[error("Lua {version} not found ({command}): install it with 'sudo apt-get install lua{version}'")]
    LuaNotFound { command: String, version: String },

    #[error("No NovaSharp command configured: pass --nova-cmd or --skip-novasharp")]
    MissingNovaCommand,

    #[error("NovaSharp build failed: {0}")]
    BuildFailed(String),

    #[error("Failed to start worker pool: {0}")]
    WorkerPool(String),

    #[error("I/O error at {path}: {error}")]
    IoError {
        path: PathBuf,
        error: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Corpus(#[from] CorpusError),
}

impl RunnerError {
    /// Create a fixtures-directory-not-found error
    pub fn fixtures_dir_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FixturesDirNotFound { path: path.into() }
    }

    /// Create a missing-interpreter error
    pub fn lua_not_found(command: impl Into<String>, version: impl Into<String>) -> Self {
        Self::LuaNotFound {
            command: command.into(),
            version: version.into(),
        }
    }

    /// Create a build failure error
    pub fn build_failed(error: impl ToString) -> Self {
        Self::BuildFailed(error.to_string())
    }

    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            error,
        }
    }
}
