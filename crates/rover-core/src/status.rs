use crate::macros::simple_display;
use serde::{Deserialize, Serialize};

/// Terminal state of a [`crate::span::Span`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanStatus {
    Running,
    Completed,
    Failed,
    Error,
}

impl SpanStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}

simple_display!(SpanStatus {
    Running => "running",
    Completed => "completed",
    Failed => "failed",
    Error => "error",
});

/// Lifecycle state of an external sandbox task, as reported by the task
/// manager adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    New,
    InProgress,
    Iterating,
    Completed,
    Failed,
    Merged,
    Pushed,
}

impl TaskStatus {
    /// A task that will not change state again without operator or resolver
    /// intervention (a fresh iteration re-enters `InProgress`).
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

simple_display!(TaskStatus {
    New => "new",
    InProgress => "in_progress",
    Iterating => "iterating",
    Completed => "completed",
    Failed => "failed",
    Merged => "merged",
    Pushed => "pushed",
});
