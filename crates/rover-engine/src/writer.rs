//! Span/action logging primitives (§4.2). These are the only authorized way
//! the pending queue grows or a causal node is recorded — grounded on the
//! teacher's effect-emission + `append_cron_log` discipline in
//! `engine/runtime/handlers/cron/timer.rs`, where every state transition is
//! both emitted as a durable record and appended to a diagnostic log line.

use std::collections::BTreeMap;

use serde_json::Value;

use rover_core::{Action, ActionKind, Clock, PendingAction, Span, SpanId, Step, TraceId};
use rover_storage::{LogEntry, Store};

use crate::error::{EngineError, EngineResult};

/// Creates and persists spans for one stage invocation.
pub struct SpanWriter<'a, C: Clock> {
    store: &'a Store,
    clock: &'a C,
}

impl<'a, C: Clock> SpanWriter<'a, C> {
    pub fn new(store: &'a Store, clock: &'a C) -> Self {
        Self { store, clock }
    }

    pub fn root(&self, step: Step, summary: impl Into<String>) -> EngineResult<Span> {
        let span = Span::root(SpanId::new(), step, self.clock.epoch_ms(), summary);
        self.store.write_span(&span).map_err(EngineError::from)?;
        Ok(span)
    }

    /// A root span carrying the event payload in `meta`, so downstream
    /// stages (notably notify, §4.10) can recover routing details by
    /// walking the span chain back to the root.
    pub fn root_with_meta(
        &self,
        step: Step,
        summary: impl Into<String>,
        meta: BTreeMap<String, Value>,
    ) -> EngineResult<Span> {
        let mut span = Span::root(SpanId::new(), step, self.clock.epoch_ms(), summary);
        span.meta = meta;
        self.store.write_span(&span).map_err(EngineError::from)?;
        Ok(span)
    }

    pub fn child(&self, parent: SpanId, step: Step, summary: impl Into<String>) -> EngineResult<Span> {
        let span = Span::child(SpanId::new(), parent, step, self.clock.epoch_ms(), summary);
        self.store.write_span(&span).map_err(EngineError::from)?;
        Ok(span)
    }

    /// Re-persists a span after the caller finalized it with
    /// `complete`/`fail`/`error`.
    pub fn save(&self, span: &Span) -> EngineResult<()> {
        self.store.write_span(span).map_err(EngineError::from)
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.epoch_ms()
    }
}

/// Creates and persists actions.
pub struct ActionWriter<'a, C: Clock> {
    store: &'a Store,
    clock: &'a C,
}

impl<'a, C: Clock> ActionWriter<'a, C> {
    pub fn new(store: &'a Store, clock: &'a C) -> Self {
        Self { store, clock }
    }

    pub fn write(
        &self,
        action: ActionKind,
        span_id: SpanId,
        reasoning: impl Into<String>,
    ) -> EngineResult<Action> {
        let action = Action::new(action, span_id, self.clock.epoch_ms(), reasoning);
        self.store.write_action(&action).map_err(EngineError::from)?;
        Ok(action)
    }
}

/// Adds a `PendingAction` for `action` and appends the corresponding log
/// line. The one authorized place the pending queue grows (§4.2).
pub fn enqueue_action<C: Clock>(
    store: &Store,
    clock: &C,
    trace_id: TraceId,
    action: &Action,
    step: Step,
    summary: impl Into<String>,
) -> EngineResult<()> {
    let summary = summary.into();
    let pending = PendingAction::new(
        trace_id,
        action.id.clone(),
        action.span_id,
        action.action,
        clock.epoch_ms(),
        summary.clone(),
    );
    store.add_pending(pending).map_err(EngineError::from)?;
    store
        .append_log(LogEntry {
            ts_ms: clock.epoch_ms(),
            trace_id,
            span_id: action.span_id,
            action_id: Some(action.id.clone()),
            step,
            action: Some(action.action),
            summary,
        })
        .map_err(EngineError::from)?;
    Ok(())
}

#[cfg(test)]
#[path = "writer_tests.rs"]
mod tests;
