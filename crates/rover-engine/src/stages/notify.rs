//! Notify stage (§4.10): posts a summary comment, if the originating event
//! has somewhere to post one.

use serde_json::Value;

use rover_adapters::agent::AgentOptions;
use rover_core::{ActionKind, Clock, EventKind, PendingAction, Span, Step};

use crate::error::{EngineError, EngineResult};
use crate::writer::SpanWriter;

use super::{with_adapter_timeout, StepContext};

const TRUNCATE_AT: usize = 60_000;
const HARD_CEILING: usize = 65_536;

#[derive(Debug, Clone, Default)]
pub struct NotifyStatus {
    pub posted: usize,
    pub silent: usize,
    pub errored: usize,
}

enum Channel {
    Issue { repo: String, number: u64 },
    PullRequest { repo: String, number: u64 },
    None,
}

pub async fn tick<C: Clock>(ctx: StepContext<'_, C>) -> EngineResult<NotifyStatus> {
    let batch: Vec<PendingAction> = ctx
        .store
        .get_pending()?
        .into_iter()
        .filter(|p| p.action == ActionKind::Notify)
        .take(ctx.config.notify.max_parallel)
        .collect();

    let span_writer = SpanWriter::new(ctx.store, ctx.clock);

    let mut status = NotifyStatus::default();
    for item in &batch {
        match process_one(ctx, &span_writer, item).await {
            Ok(true) => status.posted += 1,
            Ok(false) => status.silent += 1,
            Err(_) => status.errored += 1,
        }
    }
    Ok(status)
}

async fn process_one<C: Clock>(
    ctx: StepContext<'_, C>,
    span_writer: &SpanWriter<'_, C>,
    pending: &PendingAction,
) -> EngineResult<bool> {
    let mut span = span_writer.child(pending.span_id, Step::Notify, "notifying")?;

    let chain = ctx.store.get_span_trace(&pending.trace_id)?;
    let channel = resolve_channel(&chain);

    let (posted, post_result) = match &channel {
        Channel::None => (false, Ok(())),
        Channel::Issue { repo, number } => {
            let body = compose_body(ctx, &chain).await;
            (true, ctx.adapters.hosting.comment_issue(repo, *number, &body).await)
        }
        Channel::PullRequest { repo, number } => {
            let body = compose_body(ctx, &chain).await;
            (true, ctx.adapters.hosting.comment_pr(repo, *number, &body).await)
        }
    };

    let (final_status, summary) = match (&channel, post_result) {
        (Channel::None, Ok(())) => (rover_core::SpanStatus::Completed, "no notification channel for this event".to_string()),
        (Channel::Issue { .. }, Ok(())) => (rover_core::SpanStatus::Completed, "commented on issue".to_string()),
        (Channel::PullRequest { .. }, Ok(())) => (rover_core::SpanStatus::Completed, "commented on pull request".to_string()),
        (_, Err(err)) => (rover_core::SpanStatus::Failed, format!("failed to post comment: {err}")),
    };
    let failed = final_status == rover_core::SpanStatus::Failed;
    if failed {
        span.fail(span_writer.now_ms(), summary);
    } else {
        span.complete(span_writer.now_ms(), summary);
    }
    span_writer.save(&span)?;
    ctx.trace_index.mark_step(pending.trace_id, pending.action_id.clone(), final_status, span.summary.clone());
    ctx.store.remove_pending(&pending.action_id).map_err(EngineError::from)?;
    Ok(posted && !failed)
}

fn resolve_channel(chain: &[Span]) -> Channel {
    let Some(root) = chain.first() else { return Channel::None };
    let repo = root.meta.get("repo").and_then(Value::as_str).unwrap_or_default().to_string();
    let kind = root.meta.get("type").and_then(|v| serde_json::from_value::<EventKind>(v.clone()).ok());
    let issue_number = root.meta.get("issue_number").and_then(Value::as_u64);
    let pr_number = root.meta.get("pr_number").and_then(Value::as_u64);
    let is_pull_request = root.meta.get("is_pull_request").and_then(Value::as_bool).unwrap_or(false);

    match kind {
        Some(EventKind::IssueOpened) => match issue_number {
            Some(number) => Channel::Issue { repo, number },
            None => Channel::None,
        },
        Some(EventKind::PullRequestOpened) | Some(EventKind::ReviewSubmitted) | Some(EventKind::ReviewCommentCreated) => {
            match pr_number {
                Some(number) => Channel::PullRequest { repo, number },
                None => Channel::None,
            }
        }
        Some(EventKind::CommentCreated) => {
            if is_pull_request {
                pr_number.map(|number| Channel::PullRequest { repo: repo.clone(), number }).unwrap_or(Channel::None)
            } else {
                issue_number.map(|number| Channel::Issue { repo: repo.clone(), number }).unwrap_or(Channel::None)
            }
        }
        Some(EventKind::PushedRef) | Some(EventKind::Unknown) | None => Channel::None,
    }
}

async fn compose_body<C: Clock>(ctx: StepContext<'_, C>, chain: &[Span]) -> String {
    let trace_summary = chain.iter().map(|s| s.summary.as_str()).collect::<Vec<_>>().join(" -> ");
    let prompt = format!("Summarize this autopilot trace for a human reader.\nSteps: {trace_summary}");
    let body = match with_adapter_timeout(ctx.config.ai_call_timeout, "agent", ctx.adapters.agent.invoke(&prompt, AgentOptions::default())).await {
        Ok(text) if !text.trim().is_empty() => text,
        _ => {
            let concatenated: String = chain.iter().map(|s| s.summary.as_str()).collect::<Vec<_>>().join("\n");
            if concatenated.trim().is_empty() {
                format!("Autopilot finished processing: {trace_summary}")
            } else {
                concatenated
            }
        }
    };
    truncate(body)
}

fn truncate(body: String) -> String {
    if body.len() <= TRUNCATE_AT {
        return body;
    }
    let mut truncated: String = body.chars().take(TRUNCATE_AT).collect();
    truncated.push_str("\n\n[truncated]");
    if truncated.len() > HARD_CEILING {
        truncated.truncate(HARD_CEILING);
    }
    truncated
}

#[cfg(test)]
#[path = "notify_tests.rs"]
mod tests;
