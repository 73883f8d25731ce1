use std::sync::Arc;

use tempfile::TempDir;

use rover_adapters::agent::fake::FakeAiAgent;
use rover_adapters::events::fake::FakeEventSource;
use rover_adapters::git::fake::FakeGit;
use rover_adapters::hosting::fake::FakeHosting;
use rover_adapters::sandbox::fake::FakeSandboxExecutor;
use rover_adapters::tasks::fake::FakeTaskManager;
use rover_core::FakeClock;

use super::*;

fn fake_adapters() -> Adapters {
    Adapters {
        agent: Arc::new(FakeAiAgent::new(Vec::<String>::new())),
        tasks: Arc::new(FakeTaskManager::new()),
        git: Arc::new(FakeGit::new()),
        sandbox: Arc::new(FakeSandboxExecutor::new()),
        hosting: Arc::new(FakeHosting::new()),
        events: Arc::new(FakeEventSource::new()),
    }
}

#[tokio::test]
async fn start_creates_the_store_directory_and_lock_file() {
    let dir = TempDir::new().expect("tempdir");
    let daemon = Daemon::start(dir.path(), Arc::new(FakeClock::new(0)), fake_adapters())
        .await
        .expect("daemon starts");

    assert!(dir.path().join(".rover").join("daemon.lock").exists());
    assert!(daemon.status().all_stages().contains_key("poller"));

    daemon.stop().await;
}

#[tokio::test]
async fn a_second_start_against_the_same_project_is_refused() {
    let dir = TempDir::new().expect("tempdir");
    let first = Daemon::start(dir.path(), Arc::new(FakeClock::new(0)), fake_adapters())
        .await
        .expect("first daemon starts");

    let second = Daemon::start(dir.path(), Arc::new(FakeClock::new(0)), fake_adapters()).await;
    assert!(matches!(second, Err(DaemonError::LockFailed(_))));

    first.stop().await;
}

#[tokio::test]
async fn stop_releases_the_lock_so_a_later_start_succeeds() {
    let dir = TempDir::new().expect("tempdir");
    let first = Daemon::start(dir.path(), Arc::new(FakeClock::new(0)), fake_adapters())
        .await
        .expect("first daemon starts");
    first.stop().await;

    let second = Daemon::start(dir.path(), Arc::new(FakeClock::new(0)), fake_adapters()).await;
    assert!(second.is_ok());
    second.expect("second daemon starts").stop().await;
}
