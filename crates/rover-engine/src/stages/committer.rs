//! Committer stage (§4.7): turns a settled task outcome into a commit (or a
//! recorded commit failure) and hands off to the resolver.

use serde_json::Value;

use rover_adapters::agent::AgentOptions;
use rover_core::{ActionKind, Clock, PendingAction, Step};

use crate::error::{EngineError, EngineResult};
use crate::writer::{enqueue_action, ActionWriter, SpanWriter};

use super::{with_adapter_timeout, StepContext};

#[derive(Debug, Clone, Default)]
pub struct CommitterStatus {
    pub committed: usize,
    pub skipped_failed_task: usize,
    pub errored: usize,
}

pub async fn tick<C: Clock>(ctx: StepContext<'_, C>) -> EngineResult<CommitterStatus> {
    let batch: Vec<PendingAction> = ctx
        .store
        .get_pending()?
        .into_iter()
        .filter(|p| p.action == ActionKind::Commit)
        .take(ctx.config.committer.max_parallel)
        .collect();

    let span_writer = SpanWriter::new(ctx.store, ctx.clock);
    let action_writer = ActionWriter::new(ctx.store, ctx.clock);

    let mut status = CommitterStatus::default();
    for item in &batch {
        match process_one(ctx, &span_writer, &action_writer, item).await {
            Ok(true) => status.committed += 1,
            Ok(false) => status.skipped_failed_task += 1,
            Err(_) => status.errored += 1,
        }
    }
    Ok(status)
}

/// Returns `Ok(true)` if a commit was made, `Ok(false)` if the task had
/// already failed and the commit was correctly skipped.
async fn process_one<C: Clock>(
    ctx: StepContext<'_, C>,
    span_writer: &SpanWriter<'_, C>,
    action_writer: &ActionWriter<'_, C>,
    pending: &PendingAction,
) -> EngineResult<bool> {
    let upstream = ctx.store.read_action(&pending.action_id)?;
    let task_id_str = upstream.meta.get("task_id").and_then(Value::as_str).unwrap_or_default();
    let task_failed = upstream.meta.get("task_status").and_then(Value::as_str) == Some("FAILED");

    let mut span = span_writer.child(pending.span_id, Step::Commit, "committing")?;

    let (resolve_meta, commit_summary, committed) = if task_failed {
        let message = format!("git commit skipped: task failed ({})", upstream.reasoning);
        span.fail(span_writer.now_ms(), message.clone());
        let mut meta = serde_json::Map::new();
        meta.insert("message".to_string(), Value::String(upstream.reasoning.clone()));
        (
            [("commitError".to_string(), Value::Object(meta))].into_iter().collect(),
            message,
            false,
        )
    } else {
        let task_id: rover_core::TaskId =
            serde_json::from_value(Value::String(task_id_str.to_string())).unwrap_or_default();
        let task = ctx.adapters.tasks.get_task(&task_id).await.map_err(EngineError::from)?;
        let workspace = task.workspace.clone().unwrap_or_default();

        let prompt = format!("Write a one-line commit message for: {}", task.title);
        let message = match with_adapter_timeout(ctx.config.ai_call_timeout, "agent", ctx.adapters.agent.invoke(&prompt, AgentOptions::default())).await {
            Ok(message) if !message.trim().is_empty() => message.trim().to_string(),
            _ => task.title.clone(),
        };
        let message = if ctx.config.commit_attribution_trailer {
            format!("{message}\n\nCo-authored-by: rover-autopilot")
        } else {
            message
        };

        ctx.adapters
            .git
            .add_commit(std::path::Path::new(&workspace), &message)
            .await
            .map_err(EngineError::from)?;

        span.complete(span_writer.now_ms(), message.clone());
        (std::collections::BTreeMap::new(), message, true)
    };

    span_writer.save(&span)?;

    let mut resolve_action = action_writer.write(ActionKind::Resolve, span.id, commit_summary.clone())?;
    resolve_action.meta = resolve_meta;
    ctx.store.write_action(&resolve_action).map_err(EngineError::from)?;
    enqueue_action(ctx.store, ctx.clock, pending.trace_id, &resolve_action, Step::Commit, commit_summary)?;
    ctx.trace_index.push_pending_step(pending.trace_id, resolve_action.id, resolve_action.action, resolve_action.timestamp_ms);

    ctx.trace_index.mark_step(
        pending.trace_id,
        pending.action_id.clone(),
        if committed { rover_core::SpanStatus::Completed } else { rover_core::SpanStatus::Failed },
        span.summary.clone(),
    );
    ctx.store.remove_pending(&pending.action_id).map_err(EngineError::from)?;
    Ok(committed)
}

#[cfg(test)]
#[path = "committer_tests.rs"]
mod tests;
