//! `roverd`: runs the autopilot core for one project directory, given as the
//! first CLI argument (or the current directory). No other flags are part
//! of the core's contract (§6) — everything else is `rover.toml`/`ROVER_*`
//! (§4.13).

use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

use rover_adapters::agent::fake::FakeAiAgent;
use rover_adapters::events::fake::FakeEventSource;
use rover_adapters::git::fake::FakeGit;
use rover_adapters::hosting::fake::FakeHosting;
use rover_adapters::sandbox::fake::FakeSandboxExecutor;
use rover_adapters::tasks::fake::FakeTaskManager;
use rover_core::SystemClock;
use rover_engine::Adapters;
use rover_daemon::Daemon;

/// Every adapter trait this core depends on (§6) ships only an in-memory
/// fake in this workspace (no real AI backend, git, container runtime, or
/// hosting integration is part of the core's scope). Wiring the fakes here,
/// loudly, keeps `roverd` runnable end-to-end without pretending any of
/// those integrations exist.
fn demo_adapters() -> Adapters {
    tracing::warn!("roverd is wired to in-memory fake adapters; no real AI, git, sandbox, or hosting backend is connected");
    Adapters {
        agent: Arc::new(FakeAiAgent::new(Vec::<String>::new())),
        tasks: Arc::new(FakeTaskManager::new()),
        git: Arc::new(FakeGit::new()),
        sandbox: Arc::new(FakeSandboxExecutor::new()),
        hosting: Arc::new(FakeHosting::new()),
        events: Arc::new(FakeEventSource::new()),
    }
}

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let project_path = std::env::args()
        .nth(1)
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|| std::env::current_dir().expect("current dir"));

    let daemon = match Daemon::start(&project_path, Arc::new(SystemClock), demo_adapters()).await {
        Ok(daemon) => daemon,
        Err(err) => {
            tracing::error!(%err, "autopilot failed to start");
            std::process::exit(1);
        }
    };

    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("received shutdown signal");
    }
    daemon.stop().await;
}
