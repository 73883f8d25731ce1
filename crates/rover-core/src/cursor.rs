use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::id::EventId;

/// Size of the bounded processed-event tail (§3, §8 "Event cursor trims at
/// exactly 200 ids"). Ordering within the tail does not matter, only
/// membership.
pub const CURSOR_TAIL: usize = 200;

/// Dedup window over recently processed event ids.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cursor {
    processed_event_ids: VecDeque<EventId>,
    pub updated_at_ms: i64,
}

impl Cursor {
    pub fn is_processed(&self, id: &EventId) -> bool {
        self.processed_event_ids.contains(id)
    }

    /// Marks `ids` processed, trimming the oldest entries once the tail
    /// exceeds [`CURSOR_TAIL`].
    pub fn mark_processed(&mut self, ids: impl IntoIterator<Item = EventId>, now_ms: i64) {
        for id in ids {
            if !self.processed_event_ids.contains(&id) {
                self.processed_event_ids.push_back(id);
            }
        }
        while self.processed_event_ids.len() > CURSOR_TAIL {
            self.processed_event_ids.pop_front();
        }
        self.updated_at_ms = now_ms;
    }

    pub fn len(&self) -> usize {
        self.processed_event_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processed_event_ids.is_empty()
    }
}

#[cfg(test)]
#[path = "cursor_tests.rs"]
mod tests;
