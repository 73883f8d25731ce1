use serde::{Deserialize, Serialize};

use crate::id::{ActionId, SpanId, TaskId, TraceId};

/// Bookkeeping from a launched `workflow` action to the sandbox task it
/// spawned. Owned exclusively by the workflow stage; read by the committer
/// and resolver to attribute task outcomes back to a trace (§3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskMapping {
    pub task_id: TaskId,
    pub branch_name: String,
    pub trace_id: TraceId,
    pub workflow_span_id: SpanId,
}

impl TaskMapping {
    pub fn new(
        task_id: TaskId,
        branch_name: impl Into<String>,
        trace_id: TraceId,
        workflow_span_id: SpanId,
    ) -> Self {
        Self { task_id, branch_name: branch_name.into(), trace_id, workflow_span_id }
    }
}

/// `TaskMapping`s are keyed by the `workflow` action id that created them.
pub type TaskMappingKey = ActionId;
