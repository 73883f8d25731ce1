use super::*;
use crate::test_support::Fixture;
use rover_core::{Action, ActionId, Step};

fn seed_notify_pending(fixture: &Fixture, event_kind: EventKind, extra_meta: &[(&str, Value)]) -> PendingAction {
    let span_writer = crate::writer::SpanWriter::new(&fixture.store, &fixture.clock);
    let mut root_meta = std::collections::BTreeMap::new();
    root_meta.insert("type".to_string(), serde_json::to_value(event_kind).expect("serialize"));
    root_meta.insert("repo".to_string(), Value::String("owner/repo".to_string()));
    for (key, value) in extra_meta {
        root_meta.insert(key.to_string(), value.clone());
    }
    let root = span_writer.root_with_meta(Step::Event, "event", root_meta).expect("root span");

    let push_span = span_writer.child(root.id, Step::Push, "pushed").expect("push span");

    let action = Action {
        id: ActionId::new(),
        action: ActionKind::Notify,
        span_id: push_span.id,
        timestamp_ms: fixture.clock.epoch_ms(),
        meta: Default::default(),
        reasoning: "push complete".to_string(),
    };
    fixture.store.write_action(&action).expect("write action");
    crate::writer::enqueue_action(&fixture.store, &fixture.clock, root.id, &action, Step::Push, "push complete")
        .expect("enqueue");
    fixture
        .store
        .get_pending()
        .expect("get pending")
        .into_iter()
        .find(|p| p.action_id == action.id)
        .expect("just-enqueued pending")
}

#[tokio::test]
async fn an_issue_opened_event_posts_to_the_issue() {
    let fixture = Fixture::with_agent_script(["summary of the trace"]);
    seed_notify_pending(&fixture, EventKind::IssueOpened, &[("issue_number", Value::from(7u64))]);

    let status = tick(fixture.ctx()).await.expect("tick");
    assert_eq!(status.posted, 1);

    let comments = fixture.hosting.comments.lock();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].target, "issue#7");
    assert_eq!(comments[0].repo, "owner/repo");

    let state = fixture.store.load_state().expect("state");
    assert!(state.pending.is_empty());
}

#[tokio::test]
async fn a_pull_request_event_posts_to_the_pr() {
    let fixture = Fixture::with_agent_script(["summary of the trace"]);
    seed_notify_pending(&fixture, EventKind::PullRequestOpened, &[("pr_number", Value::from(3u64))]);

    let status = tick(fixture.ctx()).await.expect("tick");
    assert_eq!(status.posted, 1);
    assert_eq!(fixture.hosting.comments.lock()[0].target, "pr#3");
}

#[tokio::test]
async fn a_push_event_is_silent() {
    let fixture = Fixture::new();
    seed_notify_pending(&fixture, EventKind::PushedRef, &[]);

    let status = tick(fixture.ctx()).await.expect("tick");
    assert_eq!(status.silent, 1);
    assert!(fixture.hosting.comments.lock().is_empty());
}

#[tokio::test]
async fn an_issue_event_with_no_issue_number_is_silent() {
    let fixture = Fixture::new();
    seed_notify_pending(&fixture, EventKind::IssueOpened, &[]);

    let status = tick(fixture.ctx()).await.expect("tick");
    assert_eq!(status.silent, 1);
    assert!(fixture.hosting.comments.lock().is_empty());
}

#[tokio::test]
async fn a_hosting_failure_is_recorded_and_the_pending_item_is_removed() {
    let fixture = Fixture::with_agent_script(["summary of the trace"]);
    *fixture.hosting.fail_next.lock() = true;
    seed_notify_pending(&fixture, EventKind::IssueOpened, &[("issue_number", Value::from(7u64))]);

    let status = tick(fixture.ctx()).await.expect("tick");
    assert_eq!(status.errored, 1);
    assert!(fixture.hosting.comments.lock().is_empty());

    let state = fixture.store.load_state().expect("state");
    assert!(state.pending.is_empty());
}

#[tokio::test]
async fn an_oversized_body_is_truncated() {
    let fixture = Fixture::with_agent_script(["x".repeat(70_000)]);
    seed_notify_pending(&fixture, EventKind::IssueOpened, &[("issue_number", Value::from(7u64))]);

    tick(fixture.ctx()).await.expect("tick");

    let body = &fixture.hosting.comments.lock()[0].body;
    assert!(body.len() <= HARD_CEILING);
    assert!(body.ends_with("[truncated]"));
}
