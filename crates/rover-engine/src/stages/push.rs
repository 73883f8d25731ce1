//! Push stage (§4.9): pushes every task branch this trace launched, then
//! hands off to notify unless the originating event isn't notifiable.

use serde_json::Value;

use rover_core::{ActionKind, Clock, EventKind, PendingAction, Step};

use crate::error::{EngineError, EngineResult};
use crate::writer::{enqueue_action, ActionWriter, SpanWriter};

use super::StepContext;

#[derive(Debug, Clone, Default)]
pub struct PushStatus {
    pub pushed: usize,
    pub errored: usize,
}

pub async fn tick<C: Clock>(ctx: StepContext<'_, C>) -> EngineResult<PushStatus> {
    let batch: Vec<PendingAction> = ctx
        .store
        .get_pending()?
        .into_iter()
        .filter(|p| p.action == ActionKind::Push)
        .take(ctx.config.push.max_parallel)
        .collect();

    let span_writer = SpanWriter::new(ctx.store, ctx.clock);
    let action_writer = ActionWriter::new(ctx.store, ctx.clock);

    let mut status = PushStatus::default();
    for item in &batch {
        match process_one(ctx, &span_writer, &action_writer, item).await {
            Ok(()) => status.pushed += 1,
            Err(_) => status.errored += 1,
        }
    }
    Ok(status)
}

async fn process_one<C: Clock>(
    ctx: StepContext<'_, C>,
    span_writer: &SpanWriter<'_, C>,
    action_writer: &ActionWriter<'_, C>,
    pending: &PendingAction,
) -> EngineResult<()> {
    let mut span = span_writer.child(pending.span_id, Step::Push, "pushing")?;

    let mappings: Vec<_> = ctx
        .store
        .all_task_mappings()?
        .into_iter()
        .filter(|(_, mapping)| mapping.trace_id == pending.trace_id)
        .collect();

    let mut pushed_branches = Vec::new();
    for (_, mapping) in &mappings {
        let task = match ctx.adapters.tasks.get_task(&mapping.task_id).await {
            Ok(task) => task,
            Err(_) => continue,
        };
        let Some(workspace) = task.workspace else { continue };
        if ctx
            .adapters
            .git
            .push(std::path::Path::new(&workspace), &mapping.branch_name)
            .await
            .is_ok()
        {
            pushed_branches.push(mapping.branch_name.clone());
        }
    }

    span.meta.insert(
        "pushed_branches".to_string(),
        Value::Array(pushed_branches.iter().cloned().map(Value::String).collect()),
    );
    span.complete(span_writer.now_ms(), format!("pushed {} branch(es)", pushed_branches.len()));
    span_writer.save(&span)?;

    ctx.trace_index.mark_step(
        pending.trace_id,
        pending.action_id.clone(),
        rover_core::SpanStatus::Completed,
        span.summary.clone(),
    );

    if is_notifiable(ctx, pending.trace_id)? {
        let notify_action = action_writer.write(ActionKind::Notify, span.id, "push complete")?;
        enqueue_action(ctx.store, ctx.clock, pending.trace_id, &notify_action, Step::Push, "push complete")?;
        ctx.trace_index.push_pending_step(pending.trace_id, notify_action.id, notify_action.action, notify_action.timestamp_ms);
    }

    ctx.store.remove_pending(&pending.action_id).map_err(EngineError::from)?;
    Ok(())
}

/// Walks the span chain back to the root event span and checks whether its
/// event type warrants a notification at all (§4.10: push events and
/// unknown types are silent).
fn is_notifiable<C: Clock>(ctx: StepContext<'_, C>, trace_id: rover_core::TraceId) -> EngineResult<bool> {
    let chain = ctx.store.get_span_trace(&trace_id)?;
    let Some(root) = chain.first() else { return Ok(false) };
    let kind = root
        .meta
        .get("type")
        .and_then(|v| serde_json::from_value::<EventKind>(v.clone()).ok());
    Ok(!matches!(kind, None | Some(EventKind::PushedRef) | Some(EventKind::Unknown)))
}

#[cfg(test)]
#[path = "push_tests.rs"]
mod tests;
