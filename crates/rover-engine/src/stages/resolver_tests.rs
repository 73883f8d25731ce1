use super::*;
use crate::test_support::Fixture;
use rover_core::{ActionStep, SpanId, Step, TaskMapping};

fn seed_resolve_pending(fixture: &Fixture, meta: std::collections::BTreeMap<String, Value>) -> PendingAction {
    let span_writer = crate::writer::SpanWriter::new(&fixture.store, &fixture.clock);
    let commit_span = span_writer.root(Step::Commit, "commit").expect("root span");

    let action = Action {
        id: ActionId::new(),
        action: ActionKind::Resolve,
        span_id: commit_span.id,
        timestamp_ms: fixture.clock.epoch_ms(),
        meta,
        reasoning: "resolve it".to_string(),
    };
    fixture.store.write_action(&action).expect("write action");
    crate::writer::enqueue_action(&fixture.store, &fixture.clock, commit_span.id, &action, Step::Commit, "resolve it")
        .expect("enqueue");
    fixture.trace_index.push_pending_step(commit_span.id, action.id, action.action, action.timestamp_ms);
    fixture
        .store
        .get_pending()
        .expect("get pending")
        .into_iter()
        .find(|p| p.action_id == action.id)
        .expect("just-enqueued pending")
}

#[tokio::test]
async fn a_still_running_workflow_step_makes_the_trace_wait() {
    let fixture = Fixture::new();
    let pending = seed_resolve_pending(&fixture, Default::default());
    fixture.trace_index.with_trace_mut(pending.trace_id, |t| {
        t.push_step(ActionStep::new(ActionId::new(), ActionKind::Workflow, 0));
    });

    let status = tick(fixture.ctx()).await.expect("tick");
    assert_eq!(status.waited, 1);
    let state = fixture.store.load_state().expect("state");
    assert!(state.pending.is_empty());
}

#[tokio::test]
async fn all_commits_completed_with_no_failures_pushes() {
    let fixture = Fixture::new();
    let pending = seed_resolve_pending(&fixture, Default::default());
    fixture.trace_index.with_trace_mut(pending.trace_id, |t| {
        let mut step = ActionStep::new(ActionId::new(), ActionKind::Commit, 0);
        step.status = rover_core::SpanStatus::Completed;
        t.push_step(step);
    });

    let status = tick(fixture.ctx()).await.expect("tick");
    assert_eq!(status.pushed, 1);

    let state = fixture.store.load_state().expect("state");
    assert_eq!(state.pending.len(), 1);
    assert_eq!(state.pending[0].action, ActionKind::Push);
}

#[tokio::test]
async fn a_commit_error_bypasses_everything_and_fails_the_trace() {
    let fixture = Fixture::new();
    let mut meta = std::collections::BTreeMap::new();
    meta.insert(
        "commitError".to_string(),
        Value::Object(serde_json::Map::from_iter([("message".to_string(), Value::String("boom".to_string()))])),
    );
    let pending = seed_resolve_pending(&fixture, meta);

    let status = tick(fixture.ctx()).await.expect("tick");
    assert_eq!(status.failed, 1);
    assert!(fixture.trace_index.is_terminal(&pending.trace_id));
}

#[tokio::test]
async fn exhausted_retries_fail_the_trace_instead_of_asking_the_ai() {
    let fixture = Fixture::new();
    let pending = seed_resolve_pending(&fixture, Default::default());
    fixture.trace_index.with_trace_mut(pending.trace_id, |t| {
        let mut step = ActionStep::new(ActionId::new(), ActionKind::Workflow, 0);
        step.status = rover_core::SpanStatus::Failed;
        t.push_step(step);
        t.retry_count = fixture.config.max_retries;
    });

    let status = tick(fixture.ctx()).await.expect("tick");
    assert_eq!(status.failed, 1);
}

#[tokio::test]
async fn an_ambiguous_failure_asks_the_ai_and_iterates() {
    let fixture = Fixture::with_agent_script([
        r#"{"decision":"iterate","reasoning":"looks fixable","iterate_instructions":"try again, smaller diff"}"#,
    ]);
    let pending = seed_resolve_pending(&fixture, Default::default());

    let task = fixture.tasks.create_task("fix it").await.expect("create");
    let failed_workflow_action = Action {
        id: ActionId::new(),
        action: ActionKind::Workflow,
        span_id: SpanId::new(),
        timestamp_ms: fixture.clock.epoch_ms(),
        meta: [("title".to_string(), Value::String("fix it".to_string()))].into_iter().collect(),
        reasoning: "fix it".to_string(),
    };
    fixture.store.write_action(&failed_workflow_action).expect("write action");
    fixture
        .store
        .set_task_mapping(failed_workflow_action.id, TaskMapping::new(task.id, "autopilot/fix-it", pending.trace_id, SpanId::new()))
        .expect("set mapping");

    fixture.trace_index.with_trace_mut(pending.trace_id, |t| {
        let mut step = ActionStep::new(failed_workflow_action.id, ActionKind::Workflow, 0);
        step.status = rover_core::SpanStatus::Failed;
        t.push_step(step);
    });

    let status = tick(fixture.ctx()).await.expect("tick");
    assert_eq!(status.iterated, 1);

    let state = fixture.store.load_state().expect("state");
    assert_eq!(state.pending.len(), 1);
    assert_eq!(state.pending[0].action, ActionKind::Workflow);
    let new_action = fixture.store.read_action(&state.pending[0].action_id).expect("read action");
    assert_eq!(new_action.meta.get("description"), Some(&Value::String("try again, smaller diff".to_string())));
}
