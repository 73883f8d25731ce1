//! Event poller (§4.3): fetches external activity, filters and
//! de-duplicates it against the cursor, and seeds one trace per new event.

use rover_core::{ActionKind, Step};

use crate::error::EngineResult;
use crate::writer::{enqueue_action, ActionWriter, SpanWriter};

use super::StepContext;
use rover_core::Clock;

/// Snapshot surfaced to the host UI (§4.3, §4.12).
#[derive(Debug, Clone, Default)]
pub struct PollerStatus {
    pub last_fetch_count: usize,
    pub last_relevant_count: usize,
    pub last_new_count: usize,
}

pub async fn tick<C: Clock>(ctx: StepContext<'_, C>) -> EngineResult<PollerStatus> {
    let fetched = ctx.adapters.events.fetch_events(ctx.config.poll_fetch_limit).await?;
    let last_fetch_count = fetched.len();

    let relevant: Vec<_> = fetched.into_iter().filter(|e| e.is_relevant()).collect();
    let last_relevant_count = relevant.len();

    let mut new_events = Vec::new();
    for event in relevant {
        if !ctx.store.is_event_processed(&event.id)? {
            new_events.push(event);
        }
    }
    let last_new_count = new_events.len();

    let span_writer = SpanWriter::new(ctx.store, ctx.clock);
    let action_writer = ActionWriter::new(ctx.store, ctx.clock);

    let mut processed_ids = Vec::new();
    for event in &new_events {
        let summary = format!("{:?} on {}", event.kind, event.repo);
        let mut meta = std::collections::BTreeMap::new();
        meta.insert("type".to_string(), serde_json::to_value(event.kind).unwrap_or_default());
        meta.insert("repo".to_string(), serde_json::Value::String(event.repo.clone()));
        meta.insert("is_pull_request".to_string(), serde_json::Value::Bool(event.is_pull_request));
        if let Some(issue_number) = event.issue_number {
            meta.insert("issue_number".to_string(), serde_json::Value::from(issue_number));
        }
        if let Some(pr_number) = event.pr_number {
            meta.insert("pr_number".to_string(), serde_json::Value::from(pr_number));
        }
        if let Some(author) = &event.author {
            meta.insert("author".to_string(), serde_json::Value::String(author.clone()));
        }
        let root = span_writer.root_with_meta(Step::Event, summary.clone(), meta)?;
        let action = action_writer.write(ActionKind::Coordinate, root.id, summary.clone())?;
        enqueue_action(ctx.store, ctx.clock, root.id, &action, Step::Event, summary)?;
        ctx.trace_index.push_pending_step(root.id, action.id.clone(), action.action, action.timestamp_ms);
        processed_ids.push(event.id.clone());
    }
    if !processed_ids.is_empty() {
        ctx.store.mark_events_processed(processed_ids, ctx.clock.epoch_ms())?;
    }

    Ok(PollerStatus { last_fetch_count, last_relevant_count, last_new_count })
}

#[cfg(test)]
#[path = "poller_tests.rs"]
mod tests;
