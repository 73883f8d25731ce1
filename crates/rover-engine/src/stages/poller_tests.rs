use super::*;
use crate::test_support::Fixture;
use rover_core::{EventId, EventKind};

fn relevant_event(number: u64) -> rover_core::Event {
    rover_core::Event {
        id: EventId::new(),
        repo: "owner/repo".to_string(),
        kind: EventKind::IssueOpened,
        author: None,
        issue_number: Some(number),
        pr_number: None,
        is_pull_request: false,
    }
}

fn irrelevant_event() -> rover_core::Event {
    rover_core::Event {
        id: EventId::new(),
        repo: "owner/repo".to_string(),
        kind: EventKind::Unknown,
        author: None,
        issue_number: None,
        pr_number: None,
        is_pull_request: false,
    }
}

#[tokio::test]
async fn new_relevant_events_enqueue_a_coordinate_action() {
    let fixture = Fixture::new();
    fixture.events.push(relevant_event(42));
    fixture.events.push(irrelevant_event());

    let status = tick(fixture.ctx()).await.expect("tick");

    assert_eq!(status.last_fetch_count, 2);
    assert_eq!(status.last_relevant_count, 1);
    assert_eq!(status.last_new_count, 1);

    let state = fixture.store.load_state().expect("load state");
    assert_eq!(state.pending.len(), 1);
    assert_eq!(state.pending[0].action, rover_core::ActionKind::Coordinate);
}

#[tokio::test]
async fn already_processed_events_are_not_enqueued_again() {
    let fixture = Fixture::new();
    let event = relevant_event(7);
    fixture.events.push(event.clone());

    let first = tick(fixture.ctx()).await.expect("tick");
    assert_eq!(first.last_new_count, 1);

    fixture.events.push(event);
    let second = tick(fixture.ctx()).await.expect("tick");
    assert_eq!(second.last_fetch_count, 1);
    assert_eq!(second.last_relevant_count, 1);
    assert_eq!(second.last_new_count, 0);

    let state = fixture.store.load_state().expect("load state");
    assert_eq!(state.pending.len(), 1);
}

#[tokio::test]
async fn a_fetch_failure_surfaces_as_an_engine_error() {
    let fixture = Fixture::new();
    *fixture.events.fail_next.lock() = true;

    let result = tick(fixture.ctx()).await;
    assert!(result.is_err());
}
