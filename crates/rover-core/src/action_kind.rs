use crate::macros::simple_display;
use serde::{Deserialize, Serialize};

/// What an [`crate::action::Action`] asks some stage to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Coordinate,
    Plan,
    Workflow,
    Commit,
    Resolve,
    Push,
    Notify,
    /// Coordinator decided there is nothing to do.
    Noop,
    /// Coordinator asked a human a question instead of acting; rewritten to
    /// `Notify` by the coordinator itself before it ever reaches the queue
    /// (see DESIGN.md, Open Question 2) — kept as a variant so the rewrite
    /// has somewhere to record its origin in `meta.original_action`.
    Clarify,
}

impl ActionKind {
    /// `true` for the terminal actions that close out a trace without a
    /// corresponding pending successor.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Noop)
    }
}

simple_display!(ActionKind {
    Coordinate => "coordinate",
    Plan => "plan",
    Workflow => "workflow",
    Commit => "commit",
    Resolve => "resolve",
    Push => "push",
    Notify => "notify",
    Noop => "noop",
    Clarify => "clarify",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_is_terminal() {
        assert!(ActionKind::Noop.is_terminal());
        assert!(!ActionKind::Workflow.is_terminal());
    }
}
