use thiserror::Error;

/// Failure from any external collaborator the core calls through an adapter
/// trait. Stages classify these into [`rover_core::Severity`] themselves
/// (§7) — the adapter layer just reports what happened.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("subprocess '{command}' exited with status {status}: {stderr}")]
    ProcessFailed { command: String, status: i32, stderr: String },
    #[error("malformed response from {adapter}: {detail}")]
    MalformedResponse { adapter: &'static str, detail: String },
    #[error("timed out waiting for {0}")]
    Timeout(&'static str),
    #[error("not found: {0}")]
    NotFound(String),
}

pub type AdapterResult<T> = Result<T, AdapterError>;
