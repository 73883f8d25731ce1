//! Planner stage (§4.5): turns one `plan` action into a set of sibling
//! `workflow` actions, each allowed to name another as a dependency.

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;
use serde_json::Value;

use rover_adapters::agent::AgentOptions;
use rover_core::{ActionId, ActionKind, Clock, CoreError, PendingAction, Step};

use crate::error::EngineResult;
use crate::writer::{enqueue_action, SpanWriter};

use super::{with_adapter_timeout, StepContext};

#[derive(Debug, Clone, Default)]
pub struct PlannerStatus {
    pub processed: usize,
    pub errored: usize,
    pub items_enqueued: usize,
}

#[derive(Debug, Deserialize)]
struct PlanItem {
    /// Response-local identifier so sibling items can reference each other
    /// before real `ActionId`s exist; never persisted.
    id: String,
    title: String,
    description: String,
    workflow: String,
    #[serde(default)]
    acceptance_criteria: Vec<String>,
    #[serde(default)]
    context: Option<String>,
    #[serde(default)]
    depends_on: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlanResponse {
    items: Vec<PlanItem>,
}

pub async fn tick<C: Clock>(ctx: StepContext<'_, C>) -> EngineResult<PlannerStatus> {
    let batch: Vec<PendingAction> = ctx
        .store
        .get_pending()?
        .into_iter()
        .filter(|p| p.action == ActionKind::Plan)
        .take(ctx.config.planner.max_parallel)
        .collect();

    let span_writer = SpanWriter::new(ctx.store, ctx.clock);

    let mut status = PlannerStatus::default();
    for item in &batch {
        match process_one(ctx, &span_writer, item).await {
            Ok(count) => {
                status.processed += 1;
                status.items_enqueued += count;
            }
            Err(_) => status.errored += 1,
        }
    }
    Ok(status)
}

async fn process_one<C: Clock>(
    ctx: StepContext<'_, C>,
    span_writer: &SpanWriter<'_, C>,
    pending: &PendingAction,
) -> EngineResult<usize> {
    let mut span = span_writer.child(pending.span_id, Step::Plan, "planning")?;

    let prompt = format!(
        "Produce a plan for this event.\nSummary: {}\nRespond as JSON {{items: [{{id, title, description, workflow, acceptance_criteria, context, depends_on}}]}}; depends_on, when present, names another item's id in this same response.",
        pending.summary
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

    let plan: PlanResponse = match serde_json::from_str(&raw) {
        Ok(plan) => plan,
        Err(err) => {
            span.error(span_writer.now_ms(), format!("malformed plan response: {err}"));
            span_writer.save(&span)?;
            return Err(CoreError::transient(format!("malformed plan response: {err}")).into());
        }
    };

    if plan.items.is_empty() {
        span.error(span_writer.now_ms(), "plan had no items");
        span_writer.save(&span)?;
        return Err(CoreError::transient("plan had no items").into());
    }

    // Assign real ids up front so sibling `depends_on` references can resolve
    // to an `ActionId` even though items are written in response order.
    let mut local_ids: HashMap<&str, ActionId> = HashMap::new();
    for item in &plan.items {
        local_ids.insert(item.id.as_str(), ActionId::new());
    }

    span.complete(span_writer.now_ms(), format!("{} plan item(s)", plan.items.len()));
    span_writer.save(&span)?;

    let mut enqueued = 0;
    for item in &plan.items {
        let action_id = local_ids[item.id.as_str()].clone();
        let item_span = span_writer.child(span.id, Step::Plan, item.title.clone())?;

        let mut meta: BTreeMap<String, Value> = BTreeMap::new();
        meta.insert("title".to_string(), Value::String(item.title.clone()));
        meta.insert("description".to_string(), Value::String(item.description.clone()));
        meta.insert("workflow".to_string(), Value::String(item.workflow.clone()));
        meta.insert(
            "acceptance_criteria".to_string(),
            Value::Array(item.acceptance_criteria.iter().cloned().map(Value::String).collect()),
        );
        if let Some(context) = &item.context {
            meta.insert("context".to_string(), Value::String(context.clone()));
        }
        if let Some(dep) = &item.depends_on {
            if let Some(dep_id) = local_ids.get(dep.as_str()) {
                meta.insert("depends_on_action_id".to_string(), Value::String(dep_id.to_string()));
            }
            // A `depends_on` that names an id outside this response's own
            // items is dropped: cross-trace dependencies are rejected at
            // plan time (DESIGN.md Open Question 3), not at workflow launch.
        }

        let action = rover_core::Action {
            id: action_id,
            action: ActionKind::Workflow,
            span_id: item_span.id,
            timestamp_ms: span_writer.now_ms(),
            meta,
            reasoning: item.description.clone(),
        };
        ctx.store.write_action(&action).map_err(crate::error::EngineError::from)?;

        enqueue_action(ctx.store, ctx.clock, pending.trace_id, &action, Step::Plan, item.title.clone())?;
        ctx.trace_index.push_pending_step(pending.trace_id, action.id.clone(), action.action, action.timestamp_ms);
        enqueued += 1;
    }

    ctx.trace_index.mark_step(
        pending.trace_id,
        pending.action_id.clone(),
        rover_core::SpanStatus::Completed,
        format!("{} plan item(s)", plan.items.len()),
    );
    ctx.store.remove_pending(&pending.action_id).map_err(crate::error::EngineError::from)?;
    Ok(enqueued)
}

#[cfg(test)]
#[path = "planner_tests.rs"]
mod tests;
