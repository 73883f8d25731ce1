use crate::macros::simple_display;
use serde::{Deserialize, Serialize};

/// The pipeline stage a [`crate::span::Span`] belongs to.
///
/// Order here matches the causal order a single event normally flows
/// through: event -> coordinate -> plan -> workflow -> commit -> resolve ->
/// push -> notify. Iteration can revisit `workflow`/`commit`/`resolve`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Event,
    Coordinate,
    Plan,
    Workflow,
    Commit,
    Resolve,
    Push,
    Notify,
}

simple_display!(Step {
    Event => "event",
    Coordinate => "coordinate",
    Plan => "plan",
    Workflow => "workflow",
    Commit => "commit",
    Resolve => "resolve",
    Push => "push",
    Notify => "notify",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_as_snake_case() {
        assert_eq!(Step::Workflow.to_string(), "workflow");
    }
}
