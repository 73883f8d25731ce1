use std::fmt;

use thiserror::Error;

/// How a failure should be handled by the stage that hit it (§7, §9).
///
/// Stages never match on error message text to decide retry vs. terminal
/// failure vs. process abort; they match on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Leave the `PendingAction` in place; the next tick retries. Network,
    /// subprocess, and filesystem hiccups, plus malformed AI output at the
    /// coordinator/planner.
    Transient,
    /// This trace cannot proceed. The span is finalized `error`, the
    /// `PendingAction` is removed, and the trace is terminal-failed.
    TraceFatal,
    /// The process cannot continue operating at all (unwritable data
    /// directory, unparseable config). The autopilot must not partially
    /// start or keep running.
    SystemFatal,
}

/// The one error type stage logic returns. Wraps an arbitrary source error
/// with the severity that determines how the runtime reacts to it.
#[derive(Debug, Error)]
pub struct CoreError {
    pub severity: Severity,
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl CoreError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self { severity: Severity::Transient, message: message.into(), source: None }
    }

    pub fn trace_fatal(message: impl Into<String>) -> Self {
        Self { severity: Severity::TraceFatal, message: message.into(), source: None }
    }

    pub fn system_fatal(message: impl Into<String>) -> Self {
        Self { severity: Severity::SystemFatal, message: message.into(), source: None }
    }

    pub fn with_source(
        mut self,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn is_transient(&self) -> bool {
        self.severity == Severity::Transient
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
