use thiserror::Error;

use rover_adapters::AdapterError;
use rover_core::{CoreError, Severity};
use rover_storage::StoreError;

/// Unifies storage and adapter failures behind one error type stages can
/// match on by [`Severity`] (§7, §9) instead of by source type.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("store: {0}")]
    Store(#[from] StoreError),
    #[error("adapter: {0}")]
    Adapter(#[from] AdapterError),
    #[error("core: {0}")]
    Core(#[from] CoreError),
}

impl EngineError {
    /// Store errors are always transient (§7): a filesystem hiccup should
    /// not fail a trace, it should be retried next tick.
    pub fn severity(&self) -> Severity {
        match self {
            EngineError::Store(_) => Severity::Transient,
            EngineError::Adapter(_) => Severity::Transient,
            EngineError::Core(core) => core.severity,
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
