use super::*;
use crate::test_support::Fixture;
use rover_adapters::TaskManager;
use rover_core::Step;

fn seed_workflow_pending(fixture: &Fixture, title: &str, depends_on: Option<ActionId>) -> (PendingAction, ActionId) {
    let span_writer = crate::writer::SpanWriter::new(&fixture.store, &fixture.clock);
    let root = span_writer.root(Step::Event, "event").expect("root span");
    let action_id = ActionId::new();
    let mut meta = std::collections::BTreeMap::new();
    meta.insert("title".to_string(), Value::String(title.to_string()));
    if let Some(dep) = depends_on {
        meta.insert("depends_on_action_id".to_string(), Value::String(dep.to_string()));
    }
    let action = Action {
        id: action_id,
        action: ActionKind::Workflow,
        span_id: root.id,
        timestamp_ms: fixture.clock.epoch_ms(),
        meta,
        reasoning: title.to_string(),
    };
    fixture.store.write_action(&action).expect("write action");
    crate::writer::enqueue_action(&fixture.store, &fixture.clock, root.id, &action, Step::Plan, title)
        .expect("enqueue");
    let pending = fixture
        .store
        .get_pending()
        .expect("get pending")
        .into_iter()
        .find(|p| p.action_id == action_id)
        .expect("just-enqueued pending");
    (pending, action_id)
}

#[tokio::test]
async fn launching_creates_a_task_mapping_and_clears_pending() {
    let fixture = Fixture::new();
    seed_workflow_pending(&fixture, "fix it", None);

    let status = tick(fixture.ctx()).await.expect("tick");
    assert_eq!(status.launched, 1);

    let mappings = fixture.store.all_task_mappings().expect("mappings");
    assert_eq!(mappings.len(), 1);

    let state = fixture.store.load_state().expect("state");
    assert!(state.pending.is_empty());
}

#[tokio::test]
async fn a_workflow_with_an_unmet_dependency_is_skipped() {
    let fixture = Fixture::new();
    let dep_id = ActionId::new();
    seed_workflow_pending(&fixture, "depends on something", Some(dep_id));

    let status = tick(fixture.ctx()).await.expect("tick");
    assert_eq!(status.launched, 0);

    let state = fixture.store.load_state().expect("state");
    assert_eq!(state.pending.len(), 1);
}

#[tokio::test]
async fn capacity_limits_how_many_tasks_launch_per_tick() {
    let mut fixture = Fixture::new();
    fixture.config.max_running_tasks = 1;
    // Pre-fill capacity with one already-running task.
    let blocker = fixture.tasks.create_task("blocker").await.expect("create");
    fixture.tasks.mark_in_progress(&blocker.id).await.expect("mark");

    seed_workflow_pending(&fixture, "queued behind capacity", None);

    let status = tick(fixture.ctx()).await.expect("tick");
    assert_eq!(status.launched, 0);
    let state = fixture.store.load_state().expect("state");
    assert_eq!(state.pending.len(), 1);
}

#[tokio::test]
async fn a_pending_workflow_action_with_an_existing_mapping_is_not_relaunched() {
    let fixture = Fixture::new();
    let (pending, action_id) = seed_workflow_pending(&fixture, "fix it", None);
    let task = fixture.tasks.create_task("fix it").await.expect("create");
    fixture.tasks.mark_in_progress(&task.id).await.expect("mark");
    fixture
        .store
        .set_task_mapping(action_id, rover_core::TaskMapping::new(task.id, "autopilot/fix-it", pending.trace_id, rover_core::SpanId::new()))
        .expect("set mapping");

    let status = tick(fixture.ctx()).await.expect("tick");
    assert_eq!(status.launched, 0);

    let mappings = fixture.store.all_task_mappings().expect("mappings");
    assert_eq!(mappings.len(), 1);
    let state = fixture.store.load_state().expect("state");
    assert!(state.pending.is_empty());
}

#[tokio::test]
async fn monitor_settles_a_completed_task_into_a_commit_action() {
    let fixture = Fixture::new();
    seed_workflow_pending(&fixture, "fix it", None);
    tick(fixture.ctx()).await.expect("launch tick");

    let mappings = fixture.store.all_task_mappings().expect("mappings");
    let (_, mapping) = mappings.into_iter().next().expect("one mapping");
    fixture.tasks.set_status(&mapping.task_id, rover_core::TaskStatus::Completed);

    let status = tick(fixture.ctx()).await.expect("monitor tick");
    assert_eq!(status.monitored_completed, 1);

    let state = fixture.store.load_state().expect("state");
    assert_eq!(state.pending.len(), 1);
    assert_eq!(state.pending[0].action, ActionKind::Commit);
}

#[tokio::test]
async fn monitor_settles_a_failed_task_into_a_commit_action_with_failure_meta() {
    let fixture = Fixture::new();
    seed_workflow_pending(&fixture, "fix it", None);
    tick(fixture.ctx()).await.expect("launch tick");

    let mappings = fixture.store.all_task_mappings().expect("mappings");
    let (_, mapping) = mappings.into_iter().next().expect("one mapping");
    fixture.tasks.set_status(&mapping.task_id, rover_core::TaskStatus::Failed);

    let status = tick(fixture.ctx()).await.expect("monitor tick");
    assert_eq!(status.monitored_failed, 1);

    let state = fixture.store.load_state().expect("state");
    let action = fixture.store.read_action(&state.pending[0].action_id).expect("read action");
    assert_eq!(action.meta.get("task_status"), Some(&Value::String("FAILED".to_string())));
}
