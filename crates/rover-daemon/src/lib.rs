//! `roverd`: hosts the autopilot core for one project (§6). This crate is
//! the "host process" the core's contract assumes — it resolves layered
//! configuration (§4.13), wires adapters, and owns the daemon's lifecycle;
//! all scheduling and domain logic lives in `rover_engine`.

mod config;
mod error;
mod lifecycle;

pub use config::DaemonConfig;
pub use error::{DaemonError, DaemonResult};
pub use lifecycle::Daemon;
