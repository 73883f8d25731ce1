//! The sole durable interface for autopilot state (§4.1).
//!
//! A `Store` is constructed once per project and passed by value to every
//! stage — never reached through a global (§9 "global mutable state as
//! value"). Internally it serializes all mutation through one mutex so log
//! rotation and state writes from concurrent stage workers never interleave.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use rover_core::{Action, ActionId, Cursor, EventId, PendingAction, Span, SpanId, TaskMapping, TaskMappingKey, TraceSnapshot};

use crate::error::{StoreError, StoreResult};
use crate::fs_atomic::{read_json, read_json_or_default, write_json_atomic};
use crate::log::{ensure_log_file, LogEntry, RotatingLog};
use crate::state::State;

struct Layout {
    root: PathBuf,
}

impl Layout {
    fn autopilot_dir(&self) -> PathBuf {
        self.root.join("autopilot")
    }
    fn cursor_path(&self) -> PathBuf {
        self.autopilot_dir().join("cursor.json")
    }
    fn state_path(&self) -> PathBuf {
        self.autopilot_dir().join("state.json")
    }
    fn log_path(&self) -> PathBuf {
        self.autopilot_dir().join("log.jsonl")
    }
    fn traces_path(&self) -> PathBuf {
        self.autopilot_dir().join("traces.json")
    }
    fn spans_dir(&self) -> PathBuf {
        self.root.join("spans")
    }
    fn actions_dir(&self) -> PathBuf {
        self.root.join("actions")
    }
    fn span_path(&self, id: &SpanId) -> PathBuf {
        self.spans_dir().join(format!("{id}.json"))
    }
    fn action_path(&self, id: &ActionId) -> PathBuf {
        self.actions_dir().join(format!("{id}.json"))
    }
}

#[derive(Clone)]
pub struct Store {
    layout: Arc<Layout>,
    log: Arc<RotatingLog>,
    write_lock: Arc<Mutex<()>>,
}

impl Store {
    pub fn open(root: impl Into<PathBuf>) -> Self {
        let layout = Arc::new(Layout { root: root.into() });
        let log = Arc::new(RotatingLog::new(layout.log_path()));
        Self { layout, log, write_lock: Arc::new(Mutex::new(())) }
    }

    /// Like [`Store::open`], but with the log rotation size and rotated-copy
    /// count from the daemon's layered config (§4.13) instead of the
    /// compiled-in defaults.
    pub fn open_with_log_limits(root: impl Into<PathBuf>, rotate_at_bytes: u64, max_rotated: u32) -> Self {
        let layout = Arc::new(Layout { root: root.into() });
        let log = Arc::new(RotatingLog::with_limits(layout.log_path(), rotate_at_bytes, max_rotated));
        Self { layout, log, write_lock: Arc::new(Mutex::new(())) }
    }

    /// Creates the base directory structure and seed files if missing. Must
    /// be called once before any other operation (§4.1).
    pub fn ensure(&self) -> StoreResult<()> {
        let _guard = self.write_lock.lock();
        for dir in [self.layout.autopilot_dir(), self.layout.spans_dir(), self.layout.actions_dir()] {
            fs::create_dir_all(&dir).map_err(|source| StoreError::Io { path: dir, source })?;
        }
        ensure_log_file(&self.layout.log_path())?;
        if !self.layout.cursor_path().exists() {
            write_json_atomic(&self.layout.cursor_path(), &Cursor::default())?;
        }
        if !self.layout.state_path().exists() {
            write_json_atomic(&self.layout.state_path(), &State::new())?;
        }
        Ok(())
    }

    // -- cursor -----------------------------------------------------------

    pub fn load_cursor(&self) -> StoreResult<Cursor> {
        read_json_or_default(&self.layout.cursor_path())
    }

    pub fn save_cursor(&self, cursor: &Cursor) -> StoreResult<()> {
        let _guard = self.write_lock.lock();
        write_json_atomic(&self.layout.cursor_path(), cursor)
    }

    pub fn is_event_processed(&self, id: &EventId) -> StoreResult<bool> {
        Ok(self.load_cursor()?.is_processed(id))
    }

    pub fn mark_events_processed(
        &self,
        ids: impl IntoIterator<Item = EventId>,
        now_ms: i64,
    ) -> StoreResult<()> {
        let _guard = self.write_lock.lock();
        let mut cursor = read_json_or_default(&self.layout.cursor_path())?;
        Cursor::mark_processed(&mut cursor, ids, now_ms);
        write_json_atomic(&self.layout.cursor_path(), &cursor)
    }

    // -- state: pending queue + task mappings ------------------------------

    pub fn load_state(&self) -> StoreResult<State> {
        read_json_or_default(&self.layout.state_path())
    }

    pub fn save_state(&self, state: &State) -> StoreResult<()> {
        write_json_atomic(&self.layout.state_path(), state)
    }

    pub fn add_pending(&self, pending: PendingAction) -> StoreResult<()> {
        let _guard = self.write_lock.lock();
        let mut state = read_json_or_default::<State>(&self.layout.state_path())?;
        if !state.pending.iter().any(|p| p.action_id == pending.action_id) {
            state.pending.push(pending);
        }
        write_json_atomic(&self.layout.state_path(), &state)
    }

    pub fn remove_pending(&self, action_id: &ActionId) -> StoreResult<()> {
        let _guard = self.write_lock.lock();
        let mut state = read_json_or_default::<State>(&self.layout.state_path())?;
        state.pending.retain(|p| &p.action_id != action_id);
        write_json_atomic(&self.layout.state_path(), &state)
    }

    pub fn get_pending(&self) -> StoreResult<Vec<PendingAction>> {
        Ok(read_json_or_default::<State>(&self.layout.state_path())?.pending)
    }

    pub fn set_task_mapping(&self, key: TaskMappingKey, mapping: TaskMapping) -> StoreResult<()> {
        let _guard = self.write_lock.lock();
        let mut state = read_json_or_default::<State>(&self.layout.state_path())?;
        state.task_mappings.insert(key, mapping);
        write_json_atomic(&self.layout.state_path(), &state)
    }

    pub fn get_task_mapping(&self, key: &TaskMappingKey) -> StoreResult<Option<TaskMapping>> {
        Ok(read_json_or_default::<State>(&self.layout.state_path())?.task_mappings.get(key).cloned())
    }

    pub fn all_task_mappings(&self) -> StoreResult<BTreeMap<TaskMappingKey, TaskMapping>> {
        Ok(read_json_or_default::<State>(&self.layout.state_path())?.task_mappings)
    }

    // -- append-only log ----------------------------------------------------

    pub fn append_log(&self, entry: LogEntry) -> StoreResult<()> {
        let _guard = self.write_lock.lock();
        self.log.append(&entry)
    }

    // -- spans / actions ----------------------------------------------------

    pub fn write_span(&self, span: &Span) -> StoreResult<()> {
        write_json_atomic(&self.layout.span_path(&span.id), span)
    }

    pub fn read_span(&self, id: &SpanId) -> StoreResult<Span> {
        let path = self.layout.span_path(id);
        if !path.exists() {
            return Err(StoreError::MissingSpan(*id));
        }
        read_json(&path)
    }

    /// Walks `parent` links from `leaf_id` back to the root, returning the
    /// sequence oldest-to-newest (§4.1, §8 round-trip law).
    pub fn get_span_trace(&self, leaf_id: &SpanId) -> StoreResult<Vec<Span>> {
        let mut chain = Vec::new();
        let mut current = Some(*leaf_id);
        while let Some(id) = current {
            let span = self.read_span(&id)?;
            current = span.parent;
            chain.push(span);
        }
        chain.reverse();
        Ok(chain)
    }

    pub fn write_action(&self, action: &Action) -> StoreResult<()> {
        write_json_atomic(&self.layout.action_path(&action.id), action)
    }

    pub fn read_action(&self, id: &ActionId) -> StoreResult<Action> {
        let path = self.layout.action_path(id);
        if !path.exists() {
            return Err(StoreError::MissingAction(*id));
        }
        read_json(&path)
    }

    // -- trace index snapshot -------------------------------------------------

    pub fn save_traces(&self, traces: &TraceSnapshot) -> StoreResult<()> {
        write_json_atomic(&self.layout.traces_path(), traces)
    }

    pub fn load_traces(&self) -> StoreResult<Option<TraceSnapshot>> {
        let path = self.layout.traces_path();
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(read_json(&path)?))
    }

    pub fn root(&self) -> &Path {
        &self.layout.root
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
