//! Durable, filesystem-backed state for the autopilot core (§4.1, §6).

mod error;
mod fs_atomic;
mod log;
mod state;
mod store;

pub use error::{StoreError, StoreResult};
pub use log::{LogEntry, RotatingLog, ROTATE_AT_BYTES};
pub use state::{State, CURRENT_STATE_VERSION};
pub use store::Store;
