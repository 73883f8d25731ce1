//! Coordinator stage (§4.4): turns one queued `coordinate` action into the
//! next stage's action by asking the AI agent what to do about the event.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use rover_adapters::agent::AgentOptions;
use rover_core::{ActionKind, Clock, CoreError, PendingAction, Step};

use crate::error::EngineResult;
use crate::writer::{enqueue_action, ActionWriter, SpanWriter};

use super::{with_adapter_timeout, StepContext};

#[derive(Debug, Clone, Default)]
pub struct CoordinatorStatus {
    pub processed: usize,
    pub errored: usize,
}

#[derive(Debug, Deserialize)]
struct CoordinatorDecision {
    action: String,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    meta: BTreeMap<String, Value>,
}

pub async fn tick<C: Clock>(ctx: StepContext<'_, C>) -> EngineResult<CoordinatorStatus> {
    let batch: Vec<PendingAction> = ctx
        .store
        .get_pending()?
        .into_iter()
        .filter(|p| p.action == ActionKind::Coordinate)
        .take(ctx.config.coordinator.max_parallel)
        .collect();

    let span_writer = SpanWriter::new(ctx.store, ctx.clock);
    let action_writer = ActionWriter::new(ctx.store, ctx.clock);

    let mut status = CoordinatorStatus::default();
    for item in &batch {
        match process_one(ctx, &span_writer, &action_writer, item).await {
            Ok(()) => status.processed += 1,
            // Transient/IO failures are not removed from the pending queue;
            // the next tick's in-progress guard is the scheduler's job, not
            // this function's (§4.4, §7).
            Err(_) => status.errored += 1,
        }
    }
    Ok(status)
}

async fn process_one<C: Clock>(
    ctx: StepContext<'_, C>,
    span_writer: &SpanWriter<'_, C>,
    action_writer: &ActionWriter<'_, C>,
    item: &PendingAction,
) -> EngineResult<()> {
    let mut span = span_writer.child(item.span_id, Step::Coordinate, "coordinating")?;

    let prompt = format!(
        "Decide the next action for this event.\nSummary: {}\nRespond as JSON {{action, reasoning, meta}} where action is one of: plan, workflow, notify, noop, clarify.",
        item.summary
    );
    let options = AgentOptions { json: true, ..Default::default() };

    let raw = match with_adapter_timeout(ctx.config.ai_call_timeout, "agent", ctx.adapters.agent.invoke(&prompt, options)).await {
        Ok(raw) => raw,
        Err(err) => {
            span.error(span_writer.now_ms(), format!("agent invocation failed: {err}"));
            span_writer.save(&span)?;
            return Err(err.into());
        }
    };

    let decision: CoordinatorDecision = match serde_json::from_str(&raw) {
        Ok(decision) => decision,
        Err(err) => {
            span.error(span_writer.now_ms(), format!("malformed coordinator response: {err}"));
            span_writer.save(&span)?;
            return Err(CoreError::transient(format!("malformed coordinator response: {err}")).into());
        }
    };

    // Post-process (§4.4 step 4): `coordinate` may not name itself as a
    // sub-action; `clarify` is folded into `notify` with its origin recorded
    // (DESIGN.md Open Question 2) rather than kept as a distinct downstream
    // stage.
    let (next_action, mut meta) = match decision.action.as_str() {
        "plan" => (ActionKind::Plan, decision.meta),
        "workflow" => (ActionKind::Workflow, decision.meta),
        "notify" => (ActionKind::Notify, decision.meta),
        "noop" | "coordinate" => (ActionKind::Noop, decision.meta),
        "clarify" => (ActionKind::Notify, decision.meta),
        other => {
            let message = format!("coordinator returned unrecognized action {other:?}");
            span.error(span_writer.now_ms(), message.clone());
            span_writer.save(&span)?;
            return Err(CoreError::transient(message).into());
        }
    };
    if decision.action == "clarify" {
        meta.insert("original_action".to_string(), Value::String("clarify".to_string()));
    }

    span.complete(span_writer.now_ms(), decision.reasoning.clone());
    span_writer.save(&span)?;

    let mut action = action_writer.write(next_action, span.id, decision.reasoning.clone())?;
    action.meta = meta.clone();
    ctx.store.write_action(&action).map_err(crate::error::EngineError::from)?;
    enqueue_action(ctx.store, ctx.clock, item.trace_id, &action, Step::Coordinate, item.summary.clone())?;

    ctx.trace_index.mark_step(item.trace_id, item.action_id.clone(), rover_core::SpanStatus::Completed, decision.reasoning);
    ctx.trace_index.push_pending_step(item.trace_id, action.id.clone(), action.action, action.timestamp_ms);

    ctx.store.remove_pending(&item.action_id).map_err(crate::error::EngineError::from)?;
    Ok(())
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
