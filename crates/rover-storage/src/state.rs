use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use rover_core::{PendingAction, TaskMapping, TaskMappingKey};

/// `autopilot/state.json`: the pending queue plus task-launch bookkeeping
/// (§3, §6). Cursor and trace snapshots live in their own files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct State {
    pub version: u32,
    pub pending: Vec<PendingAction>,
    pub task_mappings: BTreeMap<TaskMappingKey, TaskMapping>,
    pub updated_at_ms: i64,
}

pub const CURRENT_STATE_VERSION: u32 = 1;

impl State {
    pub fn new() -> Self {
        Self { version: CURRENT_STATE_VERSION, ..Default::default() }
    }
}
