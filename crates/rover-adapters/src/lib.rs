//! Adapter traits for the collaborators the autopilot core treats as
//! external: the AI agent, the sandbox task manager, git, the sandbox
//! executor, remote hosting, and the event source (§1 Non-goals, §6).
//!
//! Every trait ships a `fake` submodule with an in-memory implementation,
//! gated behind `#[cfg(test)]` or the `test-support` feature, so engine-level
//! tests never need a live AI backend, container runtime, or network.

pub mod agent;
pub mod error;
pub mod events;
pub mod git;
pub mod hosting;
pub mod sandbox;
pub mod tasks;

pub use agent::{AgentOptions, AiAgent};
pub use error::{AdapterError, AdapterResult};
pub use events::EventSource;
pub use git::{Git, RebaseConflicts};
pub use hosting::Hosting;
pub use sandbox::{Sandbox, SandboxExecutor, SandboxOptions};
pub use tasks::TaskManager;
