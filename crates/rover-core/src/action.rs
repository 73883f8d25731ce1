use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::action_kind::ActionKind;
use crate::id::{ActionId, SpanId};

/// An immutable, durable intent: "some stage must still do this."
///
/// Written once by whichever span produced it; never mutated afterward. The
/// pending queue (see [`crate::pending::PendingAction`]) is what tracks
/// whether an action has been consumed yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub id: ActionId,
    pub action: ActionKind,
    pub span_id: SpanId,
    pub timestamp_ms: i64,
    pub meta: BTreeMap<String, Value>,
    pub reasoning: String,
}

impl Action {
    pub fn new(
        action: ActionKind,
        span_id: SpanId,
        timestamp_ms: i64,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            id: ActionId::new(),
            action,
            span_id,
            timestamp_ms,
            meta: BTreeMap::new(),
            reasoning: reasoning.into(),
        }
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: Value) -> Self {
        self.meta.insert(key.into(), value);
        self
    }

    pub fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("action_id", self.id.to_string()),
            ("action", self.action.to_string()),
            ("span_id", self.span_id.to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::SpanId;

    #[test]
    fn new_action_carries_a_fresh_id() {
        let a = Action::new(ActionKind::Plan, SpanId::new(), 0, "plan it");
        let b = Action::new(ActionKind::Plan, SpanId::new(), 0, "plan it");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn with_meta_inserts_a_key() {
        let action = Action::new(ActionKind::Workflow, SpanId::new(), 0, "go")
            .with_meta("title", Value::String("fix bug".into()));
        assert_eq!(action.meta.get("title"), Some(&Value::String("fix bug".into())));
    }
}
