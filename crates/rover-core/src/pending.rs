use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::action_kind::ActionKind;
use crate::id::{ActionId, SpanId, TraceId};

/// A durable queue entry: "this action still needs a stage to process it."
///
/// Invariant (§3): every `PendingAction` refers to an `Action` that has
/// already been written to disk. The pending queue, not the action/span
/// files, is what defines remaining work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingAction {
    pub trace_id: TraceId,
    pub action_id: ActionId,
    pub span_id: SpanId,
    pub action: ActionKind,
    pub summary: String,
    pub created_at_ms: i64,
    pub meta: BTreeMap<String, Value>,
}

impl PendingAction {
    pub fn new(
        trace_id: TraceId,
        action_id: ActionId,
        span_id: SpanId,
        action: ActionKind,
        created_at_ms: i64,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            trace_id,
            action_id,
            span_id,
            action,
            summary: summary.into(),
            created_at_ms,
            meta: BTreeMap::new(),
        }
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: Value) -> Self {
        self.meta.insert(key.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_action_keeps_its_action_kind() {
        let p = PendingAction::new(
            TraceId::new(),
            ActionId::new(),
            SpanId::new(),
            ActionKind::Resolve,
            0,
            "resolve it",
        );
        assert_eq!(p.action, ActionKind::Resolve);
    }
}
