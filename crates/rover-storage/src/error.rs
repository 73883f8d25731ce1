use thiserror::Error;

/// All failures a [`crate::store::Store`] operation can produce. Every
/// variant here is `Severity::Transient` in the caller's eyes (§7) — the
/// store itself does not decide retry policy, the stage that called it does.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error at {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("serialization error for {path}: {source}")]
    Json {
        path: std::path::PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("no such span: {0}")]
    MissingSpan(rover_core::SpanId),
    #[error("no such action: {0}")]
    MissingAction(rover_core::ActionId),
}

pub type StoreResult<T> = Result<T, StoreError>;
