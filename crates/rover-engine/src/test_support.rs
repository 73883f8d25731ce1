//! Shared fixture builder for stage tests: a fully-wired [`StepContext`]
//! backed by fakes and a tempdir-rooted [`Store`]. Keeps concrete handles to
//! each fake alongside the trait-object [`Adapters`] bundle so tests can both
//! seed/inspect fakes and hand the bundle to stage code unchanged.

use std::sync::Arc;

use rover_core::FakeClock;
use rover_storage::Store;
use tempfile::TempDir;

use rover_adapters::agent::fake::FakeAiAgent;
use rover_adapters::events::fake::FakeEventSource;
use rover_adapters::git::fake::FakeGit;
use rover_adapters::hosting::fake::FakeHosting;
use rover_adapters::sandbox::fake::FakeSandboxExecutor;
use rover_adapters::tasks::fake::FakeTaskManager;

use crate::adapters_bundle::Adapters;
use crate::config::EngineConfig;
use crate::trace_index::TraceIndex;

pub struct Fixture {
    pub _dir: TempDir,
    pub store: Store,
    pub clock: FakeClock,
    pub agent: Arc<FakeAiAgent>,
    pub tasks: Arc<FakeTaskManager>,
    pub git: Arc<FakeGit>,
    pub sandbox: Arc<FakeSandboxExecutor>,
    pub hosting: Arc<FakeHosting>,
    pub events: Arc<FakeEventSource>,
    pub adapters: Adapters,
    pub trace_index: TraceIndex,
    pub config: EngineConfig,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_agent_script(Vec::<String>::new())
    }

    pub fn with_agent_script(script: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Store::open(dir.path());
        store.ensure().expect("ensure");

        let agent = Arc::new(FakeAiAgent::new(script));
        let tasks = Arc::new(FakeTaskManager::new());
        let git = Arc::new(FakeGit::new());
        let sandbox = Arc::new(FakeSandboxExecutor::new());
        let hosting = Arc::new(FakeHosting::new());
        let events = Arc::new(FakeEventSource::new());

        let adapters = Adapters {
            agent: agent.clone() as Arc<dyn rover_adapters::AiAgent>,
            tasks: tasks.clone() as Arc<dyn rover_adapters::TaskManager>,
            git: git.clone() as Arc<dyn rover_adapters::Git>,
            sandbox: sandbox.clone() as Arc<dyn rover_adapters::SandboxExecutor>,
            hosting: hosting.clone() as Arc<dyn rover_adapters::Hosting>,
            events: events.clone() as Arc<dyn rover_adapters::EventSource>,
        };

        Self {
            _dir: dir,
            store,
            clock: FakeClock::new(1_000),
            agent,
            tasks,
            git,
            sandbox,
            hosting,
            events,
            adapters,
            trace_index: TraceIndex::new(),
            config: EngineConfig::default(),
        }
    }

    pub fn ctx(&self) -> crate::stages::StepContext<'_, FakeClock> {
        crate::stages::StepContext {
            store: &self.store,
            clock: &self.clock,
            adapters: &self.adapters,
            trace_index: &self.trace_index,
            config: &self.config,
        }
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}
