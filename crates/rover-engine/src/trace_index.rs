//! In-memory projection of the causal graph into per-trace step lists
//! (§4.11), plus the observability accessors of §4.12.
//!
//! Grounded on the teacher's `MaterializedState` rebuild-from-events idiom
//! (`crates/daemon/src/storage/state/mod.rs`): on restart, prefer a
//! persisted snapshot, and fall back to reconstructing from the
//! authoritative source (spans/actions here, the event log there) when none
//! exists.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use rover_core::{ActionId, ActionKind, ActionStep, SpanStatus, Trace, TraceId, TraceSnapshot};
use rover_storage::Store;

use crate::error::EngineResult;

#[derive(Clone)]
pub struct TraceIndex {
    inner: Arc<Mutex<TraceSnapshot>>,
}

impl TraceIndex {
    pub fn new() -> Self {
        Self { inner: Arc::new(Mutex::new(BTreeMap::new())) }
    }

    /// Adopts a persisted snapshot if present; otherwise starts empty and
    /// relies on [`Self::rebuild_from_pending`] to repopulate traces that
    /// still have outstanding work (§4.11).
    pub fn recover(store: &Store) -> EngineResult<Self> {
        let index = Self::new();
        if let Some(snapshot) = store.load_traces()? {
            *index.inner.lock() = snapshot;
        }
        Ok(index)
    }

    /// For every still-pending action whose trace is missing from the index
    /// (e.g. after a restart with no `traces.json` snapshot), seed a minimal
    /// trace entry from that one pending step. Full history is only ever
    /// advisory here — spans and actions on disk remain authoritative
    /// (§4.11) — so this does not attempt to replay ancestor steps the
    /// pending queue no longer references.
    pub fn rebuild_from_pending(&self, store: &Store) -> EngineResult<()> {
        let pending = store.get_pending()?;
        let mut index = self.inner.lock();
        for p in &pending {
            let trace = index.entry(p.trace_id).or_default();
            if !trace.steps.iter().any(|s| s.action_id == p.action_id) {
                trace.push_step(ActionStep::new(p.action_id, p.action, p.created_at_ms));
            }
        }
        Ok(())
    }

    pub fn snapshot(&self) -> TraceSnapshot {
        self.inner.lock().clone()
    }

    pub fn get(&self, trace_id: &TraceId) -> Option<Trace> {
        self.inner.lock().get(trace_id).cloned()
    }

    pub fn with_trace_mut<T>(&self, trace_id: TraceId, f: impl FnOnce(&mut Trace) -> T) -> T {
        let mut index = self.inner.lock();
        let trace = index.entry(trace_id).or_default();
        f(trace)
    }

    pub fn persist(&self, store: &Store) -> EngineResult<()> {
        store.save_traces(&self.snapshot())?;
        Ok(())
    }

    /// `true` when no trace has a non-terminal `resolve` step, per the §3/§8
    /// at-most-one-resolve-per-trace invariant's natural extension: used by
    /// the resolver stage to decide whether a trace's resolve request is a
    /// duplicate.
    pub fn has_running_resolve(&self, trace_id: &TraceId) -> bool {
        self.inner
            .lock()
            .get(trace_id)
            .map(|t| t.has_running_step(ActionKind::Resolve))
            .unwrap_or(false)
    }

    pub fn is_terminal(&self, trace_id: &TraceId) -> bool {
        self.inner.lock().get(trace_id).map(Trace::is_terminal).unwrap_or(false)
    }

    /// Registers a freshly-enqueued action as a running step, unless this
    /// trace already has one (re-enqueue after a restart is a no-op here).
    pub fn push_pending_step(&self, trace_id: TraceId, action_id: ActionId, action: ActionKind, ts_ms: i64) {
        self.with_trace_mut(trace_id, |t| {
            if !t.steps.iter().any(|s| s.action_id == action_id) {
                t.push_step(ActionStep::new(action_id, action, ts_ms));
            }
        });
    }

    /// Finalizes a step's status once the stage that owns it is done (§4.11).
    pub fn mark_step(&self, trace_id: TraceId, action_id: ActionId, status: SpanStatus, reasoning: impl Into<String>) {
        self.with_trace_mut(trace_id, |t| {
            if let Some(step) = t.steps.iter_mut().find(|s| s.action_id == action_id) {
                step.status = status;
                step.reasoning = reasoning.into();
            }
        });
    }

    pub fn step_status(&self, trace_id: &TraceId, action_id: &ActionId) -> Option<SpanStatus> {
        self.inner
            .lock()
            .get(trace_id)
            .and_then(|t| t.steps.iter().find(|s| s.action_id == *action_id).map(|s| s.status))
    }

    pub fn increment_retry(&self, trace_id: TraceId) -> u32 {
        self.with_trace_mut(trace_id, |t| {
            t.retry_count += 1;
            t.retry_count
        })
    }

    pub fn retry_count(&self, trace_id: &TraceId) -> u32 {
        self.inner.lock().get(trace_id).map(|t| t.retry_count).unwrap_or(0)
    }

    /// Marks every still-`Running` step of this trace as `Failed` (§4.8
    /// resolver "fail" outcome: the trace is terminal).
    pub fn fail_all_running(&self, trace_id: TraceId, reason: impl Into<String>) {
        let reason = reason.into();
        self.with_trace_mut(trace_id, |t| {
            for step in t.steps.iter_mut() {
                if matches!(step.status, SpanStatus::Running) {
                    step.status = SpanStatus::Failed;
                    step.reasoning = reason.clone();
                }
            }
        });
    }
}

impl Default for TraceIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rover_core::ActionId;
    use tempfile::tempdir;

    #[test]
    fn fresh_index_has_no_traces() {
        let index = TraceIndex::new();
        assert!(index.get(&TraceId::new()).is_none());
    }

    #[test]
    fn with_trace_mut_creates_an_entry_on_first_use() {
        let index = TraceIndex::new();
        let trace_id = TraceId::new();
        index.with_trace_mut(trace_id, |t| {
            t.push_step(ActionStep::new(ActionId::new(), ActionKind::Workflow, 0));
        });
        assert_eq!(index.get(&trace_id).map(|t| t.steps.len()), Some(1));
    }

    #[test]
    fn persist_then_recover_round_trips() {
        let dir = tempdir().expect("tempdir");
        let store = Store::open(dir.path());
        store.ensure().expect("ensure");

        let index = TraceIndex::new();
        let trace_id = TraceId::new();
        index.with_trace_mut(trace_id, |t| {
            t.push_step(ActionStep::new(ActionId::new(), ActionKind::Push, 0));
        });
        index.persist(&store).expect("persist");

        let recovered = TraceIndex::recover(&store).expect("recover");
        assert_eq!(recovered.get(&trace_id).map(|t| t.steps.len()), Some(1));
    }

    #[test]
    fn has_running_resolve_reflects_step_status() {
        let index = TraceIndex::new();
        let trace_id = TraceId::new();
        assert!(!index.has_running_resolve(&trace_id));
        index.with_trace_mut(trace_id, |t| {
            t.push_step(ActionStep::new(ActionId::new(), ActionKind::Resolve, 0));
        });
        assert!(index.has_running_resolve(&trace_id));
    }
}
