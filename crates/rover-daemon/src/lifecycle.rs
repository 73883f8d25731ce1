//! Daemon startup and shutdown (§6 `Start(projectId, projectPath)` /
//! `Stop()`). Grounded on the teacher's `lifecycle/startup.rs`: acquire an
//! exclusive lock first, create directories, recover durable state, then
//! start work — generalized from "bind the listener socket" to "start the
//! eight stage schedulers", since this core has no IPC surface of its own
//! (§6 "No CLI, flags ... beyond the configuration overrides of §4.13").

use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::Path;
use std::sync::Arc;

use fs2::FileExt;
use tracing::info;

use rover_core::Clock;
use rover_engine::{Adapters, Scheduler, StatusBoard, TraceIndex};
use rover_storage::Store;

use crate::config::DaemonConfig;
use crate::error::{DaemonError, DaemonResult};

const STORE_DIR_NAME: &str = ".rover";
const LOCK_FILE_NAME: &str = "daemon.lock";

/// A running autopilot for one project. Dropping this without calling
/// [`Daemon::stop`] leaves the stage tasks running detached; always prefer
/// an explicit `stop().await` (§6).
pub struct Daemon {
    _lock_file: std::fs::File,
    store: Store,
    scheduler: Scheduler,
}

impl Daemon {
    /// Acquires the project lock, recovers durable state, and starts all
    /// eight stage schedulers. `adapters` is supplied by the caller (§6's
    /// adapter contracts are implemented outside the core); `clock` is
    /// shared across every spawned stage task via `Arc` (see
    /// `rover_core::Clock`'s blanket impl for `Arc<T>`).
    pub async fn start<K: Clock>(
        project_path: &Path,
        clock: Arc<K>,
        adapters: Adapters,
    ) -> DaemonResult<Self> {
        let config = DaemonConfig::load(project_path)?;

        let store_root = project_path.join(STORE_DIR_NAME);
        std::fs::create_dir_all(&store_root).map_err(|err| DaemonError::io(&store_root, err))?;

        let lock_path = store_root.join(LOCK_FILE_NAME);
        let mut lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|err| DaemonError::io(&lock_path, err))?;
        lock_file.try_lock_exclusive().map_err(|_| DaemonError::LockFailed(lock_path.clone()))?;
        lock_file.set_len(0).map_err(|err| DaemonError::io(&lock_path, err))?;
        writeln!(lock_file, "{}", std::process::id()).map_err(|err| DaemonError::io(&lock_path, err))?;

        let store = Store::open_with_log_limits(&store_root, config.log_rotate_bytes, config.log_max_rotated);
        store.ensure().map_err(rover_engine::EngineError::from)?;

        let trace_index = TraceIndex::recover(&store)?;
        trace_index.rebuild_from_pending(&store)?;

        let engine_config = Arc::new(config.engine.clone());
        let scheduler = Scheduler::start(store.clone(), clock, adapters, trace_index, engine_config);

        info!(project = %project_path.display(), "autopilot started");
        Ok(Self { _lock_file: lock_file, store, scheduler })
    }

    pub fn status(&self) -> StatusBoard {
        self.scheduler.status()
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Cancels every stage task and waits for them to drain (§6 `Stop()`).
    /// In-flight actions are abandoned, not rolled back: the durable
    /// `PendingAction` queue guarantees the next `start` resumes them (§5).
    pub async fn stop(self) {
        self.scheduler.shutdown();
        self.scheduler.join().await;
        info!("autopilot stopped");
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
