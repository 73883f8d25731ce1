use serde::{Deserialize, Serialize};

use crate::id::TaskId;
use crate::status::TaskStatus;

/// The external task manager's view of one sandboxed unit of work, as
/// returned by the task manager adapter (§6). The core only ever reads and
/// transitions this; persistence of task/iteration metadata is out of scope
/// (§1 Non-goals).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub status: TaskStatus,
    pub iteration: u32,
    pub base_commit: Option<String>,
    pub workspace: Option<String>,
    pub container_id: Option<String>,
    pub agent_image: Option<String>,
    pub error: Option<String>,
}

impl Task {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: TaskId::new(),
            title: title.into(),
            status: TaskStatus::New,
            iteration: 1,
            base_commit: None,
            workspace: None,
            container_id: None,
            agent_image: None,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_task_starts_fresh() {
        let task = Task::new("fix the bug");
        assert_eq!(task.status, TaskStatus::New);
        assert_eq!(task.iteration, 1);
        assert!(task.error.is_none());
    }
}
