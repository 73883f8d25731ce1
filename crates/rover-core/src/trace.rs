use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::action_kind::ActionKind;
use crate::id::{ActionId, TraceId};
use crate::status::SpanStatus;

/// One step in a trace's linear projection, as rendered to a host UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionStep {
    pub action_id: ActionId,
    pub action: ActionKind,
    pub status: SpanStatus,
    pub timestamp_ms: i64,
    pub reasoning: String,
    pub retry_count: u32,
}

impl ActionStep {
    pub fn new(action_id: ActionId, action: ActionKind, timestamp_ms: i64) -> Self {
        Self {
            action_id,
            action,
            status: SpanStatus::Running,
            timestamp_ms,
            reasoning: String::new(),
            retry_count: 0,
        }
    }
}

/// A trace: every step descended from one root event span, projected as an
/// ordered list for UI/trace-index consumption (§3, §4.11).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Trace {
    pub steps: Vec<ActionStep>,
    pub retry_count: u32,
}

impl Trace {
    pub fn is_terminal(&self) -> bool {
        match self.steps.last() {
            None => false,
            Some(last) if last.status == SpanStatus::Failed => true,
            Some(last) => {
                last.status.is_terminal()
                    && matches!(last.action, ActionKind::Push | ActionKind::Notify | ActionKind::Noop)
            }
        }
    }

    pub fn has_running_step(&self, action: ActionKind) -> bool {
        self.steps
            .iter()
            .any(|s| s.action == action && matches!(s.status, SpanStatus::Running))
    }

    pub fn push_step(&mut self, step: ActionStep) {
        self.steps.push(step);
    }
}

/// Snapshot of the whole trace index, optionally persisted to
/// `autopilot/traces.json` for faster restart (§4.1, §4.11). The spans and
/// actions on disk remain authoritative; this is an accelerator only.
pub type TraceSnapshot = BTreeMap<TraceId, Trace>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_trace_is_not_terminal() {
        assert!(!Trace::default().is_terminal());
    }

    #[test]
    fn trace_with_failed_last_step_is_terminal() {
        let mut trace = Trace::default();
        let mut step = ActionStep::new(ActionId::new(), ActionKind::Resolve, 0);
        step.status = SpanStatus::Failed;
        trace.push_step(step);
        assert!(trace.is_terminal());
    }

    #[test]
    fn trace_with_completed_push_is_terminal() {
        let mut trace = Trace::default();
        let mut step = ActionStep::new(ActionId::new(), ActionKind::Push, 0);
        step.status = SpanStatus::Completed;
        trace.push_step(step);
        assert!(trace.is_terminal());
    }

    #[test]
    fn trace_with_running_workflow_is_not_terminal() {
        let mut trace = Trace::default();
        trace.push_step(ActionStep::new(ActionId::new(), ActionKind::Workflow, 0));
        assert!(!trace.is_terminal());
        assert!(trace.has_running_step(ActionKind::Workflow));
    }
}
