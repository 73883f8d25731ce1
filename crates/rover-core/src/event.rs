use serde::{Deserialize, Serialize};

use crate::id::EventId;

/// An external activity item fetched by the event source adapter.
///
/// `kind` drives both coordinator prompting and notify-stage routing (§4.10);
/// unrecognized hosting activity is preserved as `Unknown` rather than
/// dropped, since the coordinator may still decide there is something to do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub repo: String,
    pub kind: EventKind,
    pub author: Option<String>,
    pub issue_number: Option<u64>,
    pub pr_number: Option<u64>,
    pub is_pull_request: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    IssueOpened,
    PullRequestOpened,
    CommentCreated,
    PushedRef,
    ReviewSubmitted,
    ReviewCommentCreated,
    Unknown,
}

impl Event {
    /// Is this one of the types the poller forwards into the pipeline at all?
    /// (§4.3 step 2: "Filter to relevant types".)
    pub fn is_relevant(&self) -> bool {
        !matches!(self.kind, EventKind::Unknown)
    }

    /// The issue/PR number this event pertains to, when it has one; used by
    /// notify to pick a comment target (§4.10).
    pub fn target_number(&self) -> Option<NotifyTarget> {
        match self.kind {
            EventKind::IssueOpened => self.issue_number.map(NotifyTarget::Issue),
            EventKind::PullRequestOpened
            | EventKind::ReviewSubmitted
            | EventKind::ReviewCommentCreated => self.pr_number.map(NotifyTarget::PullRequest),
            EventKind::CommentCreated => {
                if self.is_pull_request {
                    self.pr_number.map(NotifyTarget::PullRequest)
                } else {
                    self.issue_number.map(NotifyTarget::Issue)
                }
            }
            EventKind::PushedRef | EventKind::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyTarget {
    Issue(u64),
    PullRequest(u64),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: EventKind) -> Event {
        Event {
            id: EventId::new(),
            repo: "owner/repo".to_string(),
            kind,
            author: None,
            issue_number: Some(42),
            pr_number: Some(7),
            is_pull_request: false,
        }
    }

    #[test]
    fn unknown_events_are_not_relevant() {
        assert!(!event(EventKind::Unknown).is_relevant());
        assert!(event(EventKind::IssueOpened).is_relevant());
    }

    #[test]
    fn push_events_have_no_notify_target() {
        assert_eq!(event(EventKind::PushedRef).target_number(), None);
    }

    #[test]
    fn comment_on_pr_targets_the_pr() {
        let mut e = event(EventKind::CommentCreated);
        e.is_pull_request = true;
        assert_eq!(e.target_number(), Some(NotifyTarget::PullRequest(7)));
    }

    #[test]
    fn comment_on_issue_targets_the_issue() {
        let e = event(EventKind::CommentCreated);
        assert_eq!(e.target_number(), Some(NotifyTarget::Issue(42)));
    }
}
