//! Resolver stage (§4.8): the trace-level judge. Decides whether a trace
//! waits, pushes, retries a failed task, or is terminally failed.

use serde::Deserialize;
use serde_json::Value;

use rover_adapters::agent::AgentOptions;
use rover_core::{Action, ActionId, ActionKind, Clock, PendingAction, SpanStatus, Step, Trace};

use crate::error::{EngineError, EngineResult};
use crate::writer::{enqueue_action, ActionWriter, SpanWriter};

use super::StepContext;

#[derive(Debug, Clone, Default)]
pub struct ResolverStatus {
    pub waited: usize,
    pub pushed: usize,
    pub iterated: usize,
    pub failed: usize,
    pub duplicates_dropped: usize,
    pub errored: usize,
}

#[derive(Debug, Deserialize)]
struct ResolveDecision {
    decision: String,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    iterate_instructions: Option<String>,
    #[serde(default)]
    fail_reason: Option<String>,
}

pub async fn tick<C: Clock>(ctx: StepContext<'_, C>) -> EngineResult<ResolverStatus> {
    let mut status = ResolverStatus::default();

    let all_resolve: Vec<PendingAction> =
        ctx.store.get_pending()?.into_iter().filter(|p| p.action == ActionKind::Resolve).collect();

    // De-dup: keep only the first resolve pending action per trace this tick.
    let mut seen = std::collections::HashSet::new();
    let mut primaries = Vec::new();
    for pending in all_resolve {
        if seen.insert(pending.trace_id) {
            primaries.push(pending);
        } else {
            ctx.store.remove_pending(&pending.action_id).map_err(EngineError::from)?;
            status.duplicates_dropped += 1;
        }
    }
    primaries.truncate(ctx.config.resolver.max_parallel);

    let span_writer = SpanWriter::new(ctx.store, ctx.clock);
    let action_writer = ActionWriter::new(ctx.store, ctx.clock);

    for pending in &primaries {
        match process_one(ctx, &span_writer, &action_writer, pending).await {
            Ok(Outcome::Waited) => status.waited += 1,
            Ok(Outcome::Pushed) => status.pushed += 1,
            Ok(Outcome::Iterated) => status.iterated += 1,
            Ok(Outcome::Failed) => status.failed += 1,
            Err(_) => status.errored += 1,
        }
    }
    Ok(status)
}

enum Outcome {
    Waited,
    Pushed,
    Iterated,
    Failed,
}

async fn process_one<C: Clock>(
    ctx: StepContext<'_, C>,
    span_writer: &SpanWriter<'_, C>,
    action_writer: &ActionWriter<'_, C>,
    pending: &PendingAction,
) -> EngineResult<Outcome> {
    let incoming = ctx.store.read_action(&pending.action_id)?;

    if incoming.meta.contains_key("commitError") {
        let mut span = span_writer.child(pending.span_id, Step::Resolve, "commit failed")?;
        span.fail(span_writer.now_ms(), "commit failed");
        span_writer.save(&span)?;
        ctx.trace_index.mark_step(pending.trace_id, pending.action_id.clone(), SpanStatus::Failed, "commit failed");
        ctx.trace_index.fail_all_running(pending.trace_id, "commit failed");
        ctx.store.remove_pending(&pending.action_id).map_err(EngineError::from)?;
        return Ok(Outcome::Failed);
    }

    let trace = ctx.trace_index.get(&pending.trace_id).unwrap_or_default();

    if trace.steps.iter().any(|s| s.action == ActionKind::Workflow && s.status == SpanStatus::Running) {
        ctx.store.remove_pending(&pending.action_id).map_err(EngineError::from)?;
        return Ok(Outcome::Waited);
    }
    if trace.steps.iter().any(|s| s.action == ActionKind::Commit && s.status == SpanStatus::Running) {
        ctx.store.remove_pending(&pending.action_id).map_err(EngineError::from)?;
        return Ok(Outcome::Waited);
    }

    let has_blocking_failure = trace
        .steps
        .iter()
        .any(|s| !matches!(s.action, ActionKind::Resolve | ActionKind::Push) && s.status == SpanStatus::Failed);
    let commits_all_completed = trace
        .steps
        .iter()
        .filter(|s| s.action == ActionKind::Commit)
        .all(|s| s.status == SpanStatus::Completed);

    if commits_all_completed && !has_blocking_failure {
        let mut span = span_writer.child(pending.span_id, Step::Resolve, "ready to push")?;
        span.complete(span_writer.now_ms(), "ready to push");
        span_writer.save(&span)?;

        let push_action = action_writer.write(ActionKind::Push, span.id, "resolved: push")?;
        enqueue_action(ctx.store, ctx.clock, pending.trace_id, &push_action, Step::Resolve, "push")?;
        ctx.trace_index.push_pending_step(pending.trace_id, push_action.id, push_action.action, push_action.timestamp_ms);
        ctx.trace_index.mark_step(pending.trace_id, pending.action_id.clone(), SpanStatus::Completed, "push");
        ctx.store.remove_pending(&pending.action_id).map_err(EngineError::from)?;
        return Ok(Outcome::Pushed);
    }

    if has_blocking_failure && ctx.trace_index.retry_count(&pending.trace_id) >= ctx.config.max_retries {
        return fail_trace(ctx, span_writer, pending, "retries exhausted");
    }

    let decision = ask_resolver_ai(ctx, &trace, &pending.summary).await?;

    match decision.decision.as_str() {
        "fail" => {
            let reason = decision.fail_reason.unwrap_or(decision.reasoning);
            fail_trace(ctx, span_writer, pending, reason)
        }
        _ => {
            let instructions = decision
                .iterate_instructions
                .unwrap_or_else(|| "retry the failed step with a more careful approach".to_string());
            iterate_trace(ctx, span_writer, action_writer, pending, &trace, instructions).await
        }
    }
}

async fn ask_resolver_ai<C: Clock>(
    ctx: StepContext<'_, C>,
    trace: &Trace,
    summary: &str,
) -> EngineResult<ResolveDecision> {
    let failed: Vec<&str> = trace
        .steps
        .iter()
        .filter(|s| s.status == SpanStatus::Failed)
        .map(|s| s.reasoning.as_str())
        .collect();
    let prompt = format!(
        "A trace needs resolution.\nSummary: {summary}\nFailed steps: {failed:?}\nRespond as JSON {{decision: iterate|fail, reasoning, iterate_instructions?, fail_reason?}}."
    );
    let raw = ctx
        .adapters
        .agent
        .invoke(&prompt, AgentOptions { json: true, ..Default::default() })
        .await
        .map_err(EngineError::from)?;

    Ok(match serde_json::from_str::<ResolveDecision>(&raw) {
        Ok(decision) if decision.decision == "iterate" || decision.decision == "fail" => decision,
        _ => ResolveDecision {
            decision: "iterate".to_string(),
            reasoning: "malformed or unrecognized resolver response".to_string(),
            iterate_instructions: Some("retry the failed step with a more careful approach".to_string()),
            fail_reason: None,
        },
    })
}

fn fail_trace<C: Clock>(
    ctx: StepContext<'_, C>,
    span_writer: &SpanWriter<'_, C>,
    pending: &PendingAction,
    reason: impl Into<String>,
) -> EngineResult<Outcome> {
    let reason = reason.into();
    let mut span = span_writer.child(pending.span_id, Step::Resolve, reason.clone())?;
    span.fail(span_writer.now_ms(), reason.clone());
    span_writer.save(&span)?;

    ctx.trace_index.mark_step(pending.trace_id, pending.action_id.clone(), SpanStatus::Failed, reason.clone());
    ctx.trace_index.fail_all_running(pending.trace_id, reason);
    ctx.store.remove_pending(&pending.action_id).map_err(EngineError::from)?;
    Ok(Outcome::Failed)
}

async fn iterate_trace<C: Clock>(
    ctx: StepContext<'_, C>,
    span_writer: &SpanWriter<'_, C>,
    action_writer: &ActionWriter<'_, C>,
    pending: &PendingAction,
    trace: &Trace,
    instructions: String,
) -> EngineResult<Outcome> {
    let failed_workflow_id = trace
        .steps
        .iter()
        .find(|s| s.action == ActionKind::Workflow && s.status == SpanStatus::Failed)
        .map(|s| s.action_id);
    let failed_commit_id = trace
        .steps
        .iter()
        .find(|s| s.action == ActionKind::Commit && s.status == SpanStatus::Failed)
        .map(|s| s.action_id);

    let workflow_action_id = match failed_workflow_id {
        Some(id) => Some(id),
        None => match failed_commit_id {
            Some(commit_id) => {
                let commit_action = ctx.store.read_action(&commit_id)?;
                let task_id_str = commit_action.meta.get("task_id").and_then(Value::as_str).unwrap_or_default();
                ctx.store
                    .all_task_mappings()?
                    .into_iter()
                    .find(|(_, mapping)| mapping.task_id.as_str() == task_id_str)
                    .map(|(key, _)| key)
            }
            None => None,
        },
    };

    let found = match workflow_action_id {
        Some(id) => ctx.store.get_task_mapping(&id)?.map(|mapping| (id, mapping)),
        None => None,
    };
    let (workflow_action_id, mapping) = match found {
        Some(found) => found,
        // No launched task to retry (e.g. a plan item whose dependency
        // failed before it ever launched) — there is nothing to iterate.
        None => return fail_trace(ctx, span_writer, pending, "no task available to iterate"),
    };

    ctx.trace_index.increment_retry(pending.trace_id);
    ctx.adapters.tasks.increment_iteration(&mapping.task_id).await.map_err(EngineError::from)?;
    ctx.adapters.tasks.mark_iterating(&mapping.task_id).await.map_err(EngineError::from)?;

    let mut span = span_writer.child(pending.span_id, Step::Resolve, "iterate")?;
    span.complete(span_writer.now_ms(), "iterate");
    span_writer.save(&span)?;

    let original = ctx.store.read_action(&workflow_action_id)?;
    let mut meta = original.meta.clone();
    meta.insert("description".to_string(), Value::String(instructions.clone()));
    meta.remove("depends_on_action_id");

    let new_action = Action {
        id: ActionId::new(),
        action: ActionKind::Workflow,
        span_id: span.id,
        timestamp_ms: span_writer.now_ms(),
        meta,
        reasoning: instructions,
    };
    ctx.store.write_action(&new_action).map_err(EngineError::from)?;

    enqueue_action(ctx.store, ctx.clock, pending.trace_id, &new_action, Step::Resolve, "iterate")?;
    ctx.trace_index.push_pending_step(pending.trace_id, new_action.id, new_action.action, new_action.timestamp_ms);
    ctx.trace_index.mark_step(pending.trace_id, pending.action_id.clone(), SpanStatus::Completed, "iterate");
    ctx.store.remove_pending(&pending.action_id).map_err(EngineError::from)?;
    Ok(Outcome::Iterated)
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
