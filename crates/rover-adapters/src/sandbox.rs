//! Sandbox executor adapter (§6): an opaque service that runs one task's
//! agent image in an isolated container. The core only ever learns a
//! container id back; status is read through [`crate::tasks::TaskManager`].

use std::path::PathBuf;

use async_trait::async_trait;

use rover_core::Task;

use crate::error::AdapterResult;

#[derive(Debug, Clone)]
pub struct SandboxOptions {
    pub image: String,
    pub workspace: PathBuf,
    pub env: Vec<(String, String)>,
}

#[async_trait]
pub trait Sandbox: Send + Sync {
    async fn create_and_start(&self) -> AdapterResult<String>;
}

#[async_trait]
pub trait SandboxExecutor: Send + Sync {
    async fn create_sandbox(
        &self,
        task: &Task,
        options: SandboxOptions,
    ) -> AdapterResult<Box<dyn Sandbox>>;
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use parking_lot::Mutex;

    pub struct FakeSandbox {
        pub container_id: String,
    }

    #[async_trait]
    impl Sandbox for FakeSandbox {
        async fn create_and_start(&self) -> AdapterResult<String> {
            Ok(self.container_id.clone())
        }
    }

    #[derive(Default)]
    pub struct FakeSandboxExecutor {
        /// When set, `create_sandbox` fails for every task — used to exercise
        /// the "sandboxError" launch-failure path in §4.6.
        pub fail_launch: Mutex<bool>,
    }

    impl FakeSandboxExecutor {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl SandboxExecutor for FakeSandboxExecutor {
        async fn create_sandbox(
            &self,
            task: &Task,
            _options: SandboxOptions,
        ) -> AdapterResult<Box<dyn Sandbox>> {
            if *self.fail_launch.lock() {
                return Err(crate::error::AdapterError::ProcessFailed {
                    command: "sandbox create".to_string(),
                    status: 1,
                    stderr: "no capacity".to_string(),
                });
            }
            Ok(Box::new(FakeSandbox { container_id: format!("container-{}", task.id) }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::FakeSandboxExecutor;
    use super::*;
    use rover_core::Task;
    use std::path::PathBuf;

    fn options() -> SandboxOptions {
        SandboxOptions { image: "img".to_string(), workspace: PathBuf::from("/tmp/w"), env: vec![] }
    }

    #[tokio::test]
    async fn creates_a_container_for_the_task() {
        let executor = FakeSandboxExecutor::new();
        let task = Task::new("fix it");
        let sandbox = executor.create_sandbox(&task, options()).await.expect("create");
        let container_id = sandbox.create_and_start().await.expect("start");
        assert!(container_id.contains(task.id.as_str()));
    }

    #[tokio::test]
    async fn launch_failure_is_reported() {
        let executor = FakeSandboxExecutor::new();
        *executor.fail_launch.lock() = true;
        let task = Task::new("fix it");
        assert!(executor.create_sandbox(&task, options()).await.is_err());
    }
}
