//! The seven stage workers (§4.3-§4.10), each a tagged-dispatch record per
//! §9 rather than a class hierarchy: a `process` function keyed by
//! [`rover_core::ActionKind`], with `workflow` additionally exposing a
//! `monitor` pass run before launch on every tick (§4.6).

pub mod coordinator;
pub mod committer;
pub mod notify;
pub mod planner;
pub mod poller;
pub mod push;
pub mod resolver;
pub mod workflow;

use std::future::Future;
use std::time::Duration;

use rover_adapters::error::AdapterError;
use rover_core::Clock;
use rover_storage::Store;

use crate::adapters_bundle::Adapters;
use crate::config::EngineConfig;
use crate::trace_index::TraceIndex;

/// Bounds an adapter call by the configured timeout (§4.13 "AI call
/// timeout", "sandbox task timeout"), turning a hang into the same
/// transient [`AdapterError::Timeout`] a slow adapter would return itself.
pub async fn with_adapter_timeout<T>(
    duration: Duration,
    label: &'static str,
    fut: impl Future<Output = Result<T, AdapterError>>,
) -> Result<T, AdapterError> {
    match tokio::time::timeout(duration, fut).await {
        Ok(result) => result,
        Err(_) => Err(AdapterError::Timeout(label)),
    }
}

/// Everything a stage needs to process one `PendingAction`. Constructed
/// fresh per tick by the scheduler and shared (by reference) across the
/// bounded-parallel handlers within that tick.
pub struct StepContext<'a, C: Clock> {
    pub store: &'a Store,
    pub clock: &'a C,
    pub adapters: &'a Adapters,
    pub trace_index: &'a TraceIndex,
    pub config: &'a EngineConfig,
}

impl<'a, C: Clock> Clone for StepContext<'a, C> {
    fn clone(&self) -> Self {
        Self {
            store: self.store,
            clock: self.clock,
            adapters: self.adapters,
            trace_index: self.trace_index,
            config: self.config,
        }
    }
}

impl<'a, C: Clock> Copy for StepContext<'a, C> {}
