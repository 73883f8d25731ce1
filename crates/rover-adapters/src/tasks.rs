//! Task manager adapter: the sandbox task lifecycle the workflow stage and
//! resolver drive (§6). Task/iteration persistence itself is out of scope
//! (§1 Non-goals) — this trait is the core's only window into it.

use async_trait::async_trait;

use rover_core::{Task, TaskId, TaskStatus};

use crate::error::AdapterResult;

#[async_trait]
pub trait TaskManager: Send + Sync {
    async fn create_task(&self, title: &str) -> AdapterResult<Task>;
    async fn get_task(&self, id: &TaskId) -> AdapterResult<Task>;
    async fn list_tasks(&self) -> AdapterResult<Vec<Task>>;

    async fn mark_in_progress(&self, id: &TaskId) -> AdapterResult<()>;
    async fn mark_iterating(&self, id: &TaskId) -> AdapterResult<()>;
    async fn increment_iteration(&self, id: &TaskId) -> AdapterResult<u32>;
    async fn set_base_commit(&self, id: &TaskId, commit: &str) -> AdapterResult<()>;
    async fn set_workspace(&self, id: &TaskId, workspace: &str) -> AdapterResult<()>;
    async fn set_container_info(&self, id: &TaskId, container_id: &str) -> AdapterResult<()>;
    async fn set_agent_image(&self, id: &TaskId, image: &str) -> AdapterResult<()>;
    async fn reset_to_new(&self, id: &TaskId) -> AdapterResult<()>;

    /// Refreshes `status` from the most recent iteration's result file;
    /// returns the status it observed (§4.6 Monitor phase).
    async fn update_status_from_iteration(&self, id: &TaskId) -> AdapterResult<TaskStatus>;
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    #[derive(Default)]
    pub struct FakeTaskManager {
        tasks: Mutex<HashMap<TaskId, Task>>,
    }

    impl FakeTaskManager {
        pub fn new() -> Self {
            Self::default()
        }

        /// Test hook: force a task's status, as if its sandbox run had
        /// completed with this outcome.
        pub fn set_status(&self, id: &TaskId, status: TaskStatus) {
            if let Some(task) = self.tasks.lock().get_mut(id) {
                task.status = status;
            }
        }

        fn with_task<T>(&self, id: &TaskId, f: impl FnOnce(&mut Task) -> T) -> AdapterResult<T> {
            let mut tasks = self.tasks.lock();
            match tasks.get_mut(id) {
                Some(task) => Ok(f(task)),
                None => Err(crate::error::AdapterError::NotFound(id.to_string())),
            }
        }
    }

    #[async_trait]
    impl TaskManager for FakeTaskManager {
        async fn create_task(&self, title: &str) -> AdapterResult<Task> {
            let task = Task::new(title);
            self.tasks.lock().insert(task.id.clone(), task.clone());
            Ok(task)
        }

        async fn get_task(&self, id: &TaskId) -> AdapterResult<Task> {
            self.tasks
                .lock()
                .get(id)
                .cloned()
                .ok_or_else(|| crate::error::AdapterError::NotFound(id.to_string()))
        }

        async fn list_tasks(&self) -> AdapterResult<Vec<Task>> {
            Ok(self.tasks.lock().values().cloned().collect())
        }

        async fn mark_in_progress(&self, id: &TaskId) -> AdapterResult<()> {
            self.with_task(id, |t| t.status = TaskStatus::InProgress)
        }

        async fn mark_iterating(&self, id: &TaskId) -> AdapterResult<()> {
            self.with_task(id, |t| t.status = TaskStatus::Iterating)
        }

        async fn increment_iteration(&self, id: &TaskId) -> AdapterResult<u32> {
            self.with_task(id, |t| {
                t.iteration += 1;
                t.iteration
            })
        }

        async fn set_base_commit(&self, id: &TaskId, commit: &str) -> AdapterResult<()> {
            self.with_task(id, |t| t.base_commit = Some(commit.to_string()))
        }

        async fn set_workspace(&self, id: &TaskId, workspace: &str) -> AdapterResult<()> {
            self.with_task(id, |t| t.workspace = Some(workspace.to_string()))
        }

        async fn set_container_info(&self, id: &TaskId, container_id: &str) -> AdapterResult<()> {
            self.with_task(id, |t| t.container_id = Some(container_id.to_string()))
        }

        async fn set_agent_image(&self, id: &TaskId, image: &str) -> AdapterResult<()> {
            self.with_task(id, |t| t.agent_image = Some(image.to_string()))
        }

        async fn reset_to_new(&self, id: &TaskId) -> AdapterResult<()> {
            self.with_task(id, |t| {
                t.status = TaskStatus::New;
                t.error = None;
            })
        }

        async fn update_status_from_iteration(&self, id: &TaskId) -> AdapterResult<TaskStatus> {
            self.with_task(id, |t| t.status)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::FakeTaskManager;
    use super::*;

    #[tokio::test]
    async fn created_task_starts_new() {
        let manager = FakeTaskManager::new();
        let task = manager.create_task("fix it").await.expect("create");
        assert_eq!(task.status, TaskStatus::New);
    }

    #[tokio::test]
    async fn transitions_are_observable_via_get() {
        let manager = FakeTaskManager::new();
        let task = manager.create_task("fix it").await.expect("create");
        manager.mark_in_progress(&task.id).await.expect("mark");
        let refreshed = manager.get_task(&task.id).await.expect("get");
        assert_eq!(refreshed.status, TaskStatus::InProgress);
    }

    #[tokio::test]
    async fn increment_iteration_is_monotonic() {
        let manager = FakeTaskManager::new();
        let task = manager.create_task("fix it").await.expect("create");
        let n = manager.increment_iteration(&task.id).await.expect("inc");
        assert_eq!(n, 2);
    }

    #[tokio::test]
    async fn unknown_task_id_is_not_found() {
        let manager = FakeTaskManager::new();
        assert!(manager.get_task(&TaskId::new()).await.is_err());
    }
}
