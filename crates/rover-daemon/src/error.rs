use std::path::PathBuf;

use thiserror::Error;

use rover_core::CoreError;
use rover_engine::EngineError;

/// Failures that can keep the daemon from starting or running (§6 `Start`).
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("failed to acquire lock at {0}: daemon already running for this project?")]
    LockFailed(PathBuf),

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config: {0}")]
    Config(#[from] CoreError),

    #[error("engine: {0}")]
    Engine(#[from] EngineError),
}

impl DaemonError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

pub type DaemonResult<T> = Result<T, DaemonError>;
