//! The autopilot engine: stage logic (§4.3-§4.10), the span/action writers
//! that back it (§4.2), the in-memory trace index (§4.11), tunables (§4.13),
//! and the scheduler that drives stages on their own periodic tickers (§5).

mod adapters_bundle;
mod config;
mod error;
mod scheduler;
pub mod stages;
mod trace_index;
mod writer;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use adapters_bundle::Adapters;
pub use config::{EngineConfig, StageSchedule};
pub use error::{EngineError, EngineResult};
pub use scheduler::{Scheduler, StageStatus, StatusBoard};
pub use trace_index::TraceIndex;
pub use writer::{enqueue_action, ActionWriter, SpanWriter};
