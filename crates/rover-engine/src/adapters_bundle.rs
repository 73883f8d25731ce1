//! Groups the adapter trait objects stages need so a single value can be
//! constructed once at startup and passed to every stage (§9 "global
//! mutable state as value").

use std::sync::Arc;

use rover_adapters::{AiAgent, EventSource, Git, Hosting, SandboxExecutor, TaskManager};

#[derive(Clone)]
pub struct Adapters {
    pub agent: Arc<dyn AiAgent>,
    pub tasks: Arc<dyn TaskManager>,
    pub git: Arc<dyn Git>,
    pub sandbox: Arc<dyn SandboxExecutor>,
    pub hosting: Arc<dyn Hosting>,
    pub events: Arc<dyn EventSource>,
}
