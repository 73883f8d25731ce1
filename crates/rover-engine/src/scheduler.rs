//! Stage scheduler (§5): one periodic ticker per stage, each with its own
//! stagger, period, and concurrency cap enforced inside that stage's own
//! `tick`. Because each stage runs as a single sequential task awaiting one
//! tick at a time, a tick that's still running when the next interval fires
//! is naturally skipped rather than queued — `tokio::time::interval` with
//! `MissedTickBehavior::Delay` coalesces the backlog instead of bursting.
//! Grounded on the teacher's `tokio::select!` accept-loop shape in
//! `crates/daemon/src/listener/mod.rs`, adapted from "accept a connection"
//! to "fire a stage tick".

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use rover_core::Clock;
use rover_storage::Store;

use crate::adapters_bundle::Adapters;
use crate::config::{EngineConfig, StageSchedule};
use crate::error::EngineResult;
use crate::stages::{committer, coordinator, notify, planner, poller, push, resolver, workflow, StepContext};
use crate::trace_index::TraceIndex;

/// Per-stage observability snapshot (§4.12).
#[derive(Debug, Clone, Default)]
pub struct StageStatus {
    pub last_tick_at: Option<i64>,
    pub in_flight: bool,
    pub last_error: Option<String>,
}

/// Read-only status surface for a host UI (§4.12): per-stage `StageStatus`
/// plus the poller's richer fetch-count view from §4.3.
#[derive(Clone)]
pub struct StatusBoard {
    stages: Arc<Mutex<BTreeMap<&'static str, StageStatus>>>,
    poller: Arc<Mutex<poller::PollerStatus>>,
}

impl StatusBoard {
    fn new() -> Self {
        let stages = STAGE_NAMES.iter().map(|name| (*name, StageStatus::default())).collect();
        Self { stages: Arc::new(Mutex::new(stages)), poller: Arc::new(Mutex::new(poller::PollerStatus::default())) }
    }

    pub fn stage(&self, name: &str) -> Option<StageStatus> {
        self.stages.lock().get(name).cloned()
    }

    pub fn all_stages(&self) -> BTreeMap<&'static str, StageStatus> {
        self.stages.lock().clone()
    }

    pub fn poller(&self) -> poller::PollerStatus {
        self.poller.lock().clone()
    }

    fn record_start(&self, name: &'static str, now_ms: i64) {
        if let Some(status) = self.stages.lock().get_mut(name) {
            status.last_tick_at = Some(now_ms);
            status.in_flight = true;
        }
    }

    fn record_done(&self, name: &'static str, error: Option<String>) {
        if let Some(status) = self.stages.lock().get_mut(name) {
            status.in_flight = false;
            status.last_error = error;
        }
    }

    fn record_poller(&self, poller_status: poller::PollerStatus) {
        *self.poller.lock() = poller_status;
    }
}

const STAGE_NAMES: &[&str] =
    &["poller", "coordinator", "planner", "workflow", "committer", "resolver", "push", "notify"];

/// Owns one spawned task per stage. Dropping the scheduler does not stop the
/// tasks; call [`Scheduler::shutdown`] then [`Scheduler::join`] for a clean
/// stop (§6 `Stop()`).
pub struct Scheduler {
    status: StatusBoard,
    shutdown: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl Scheduler {
    /// Spawns the eight stage workers. `clock` is shared, not cloned per
    /// stage, so every stage observes the same notion of "now" (§5).
    pub fn start<K: Clock>(
        store: Store,
        clock: Arc<K>,
        adapters: Adapters,
        trace_index: TraceIndex,
        config: Arc<EngineConfig>,
    ) -> Self {
        let status = StatusBoard::new();
        let shutdown = CancellationToken::new();
        let mut handles = Vec::new();

        let board = status.clone();
        handles.push(spawn_stage(
            "poller",
            config.poller,
            shutdown.clone(),
            status.clone(),
            store.clone(),
            clock.clone(),
            adapters.clone(),
            trace_index.clone(),
            config.clone(),
            move |ctx| {
                let board = board.clone();
                Box::pin(async move {
                    let result = poller::tick(ctx).await?;
                    board.record_poller(result);
                    Ok(())
                })
            },
        ));

        handles.push(spawn_stage(
            "coordinator",
            config.coordinator,
            shutdown.clone(),
            status.clone(),
            store.clone(),
            clock.clone(),
            adapters.clone(),
            trace_index.clone(),
            config.clone(),
            |ctx| Box::pin(async move { coordinator::tick(ctx).await.map(|_| ()) }),
        ));

        handles.push(spawn_stage(
            "planner",
            config.planner,
            shutdown.clone(),
            status.clone(),
            store.clone(),
            clock.clone(),
            adapters.clone(),
            trace_index.clone(),
            config.clone(),
            |ctx| Box::pin(async move { planner::tick(ctx).await.map(|_| ()) }),
        ));

        handles.push(spawn_stage(
            "workflow",
            config.workflow,
            shutdown.clone(),
            status.clone(),
            store.clone(),
            clock.clone(),
            adapters.clone(),
            trace_index.clone(),
            config.clone(),
            |ctx| Box::pin(async move { workflow::tick(ctx).await.map(|_| ()) }),
        ));

        handles.push(spawn_stage(
            "committer",
            config.committer,
            shutdown.clone(),
            status.clone(),
            store.clone(),
            clock.clone(),
            adapters.clone(),
            trace_index.clone(),
            config.clone(),
            |ctx| Box::pin(async move { committer::tick(ctx).await.map(|_| ()) }),
        ));

        handles.push(spawn_stage(
            "resolver",
            config.resolver,
            shutdown.clone(),
            status.clone(),
            store.clone(),
            clock.clone(),
            adapters.clone(),
            trace_index.clone(),
            config.clone(),
            |ctx| Box::pin(async move { resolver::tick(ctx).await.map(|_| ()) }),
        ));

        handles.push(spawn_stage(
            "push",
            config.push,
            shutdown.clone(),
            status.clone(),
            store.clone(),
            clock.clone(),
            adapters.clone(),
            trace_index.clone(),
            config.clone(),
            |ctx| Box::pin(async move { push::tick(ctx).await.map(|_| ()) }),
        ));

        handles.push(spawn_stage(
            "notify",
            config.notify,
            shutdown.clone(),
            status.clone(),
            store,
            clock,
            adapters,
            trace_index,
            config,
            |ctx| Box::pin(async move { notify::tick(ctx).await.map(|_| ()) }),
        ));

        Self { status, shutdown, handles }
    }

    pub fn status(&self) -> StatusBoard {
        self.status.clone()
    }

    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub async fn join(self) {
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn spawn_stage<K, F>(
    name: &'static str,
    schedule: StageSchedule,
    shutdown: CancellationToken,
    status: StatusBoard,
    store: Store,
    clock: Arc<K>,
    adapters: Adapters,
    trace_index: TraceIndex,
    config: Arc<EngineConfig>,
    tick_fn: F,
) -> JoinHandle<()>
where
    K: Clock,
    F: for<'r> Fn(StepContext<'r, Arc<K>>) -> Pin<Box<dyn Future<Output = EngineResult<()>> + Send + 'r>>
        + Send
        + 'static,
{
    tokio::spawn(async move {
        tokio::time::sleep(schedule.initial_delay).await;
        let mut interval = tokio::time::interval(schedule.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => {
                    let now_ms = clock.epoch_ms();
                    status.record_start(name, now_ms);
                    let ctx = StepContext {
                        store: &store,
                        clock: &clock,
                        adapters: &adapters,
                        trace_index: &trace_index,
                        config: &config,
                    };
                    let result = tick_fn(ctx).await;
                    let error = result.err().map(|err| err.to_string());
                    if let Some(err) = &error {
                        warn!(stage = name, error = %err, "stage tick failed");
                    } else {
                        debug!(stage = name, "stage tick completed");
                    }
                    status.record_done(name, error);
                }
            }
        }
    })
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
