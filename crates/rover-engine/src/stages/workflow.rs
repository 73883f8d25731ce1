//! Workflow stage (§4.6): two phases run every tick, monitor before launch.
//! Monitor settles already-launched tasks into a `commit` action; launch
//! starts new ones up to the running-task cap, honoring plan-item
//! dependencies.

use serde_json::Value;

use rover_adapters::sandbox::SandboxOptions;
use rover_core::{Action, ActionId, ActionKind, Clock, PendingAction, SpanStatus, Step, TaskMapping, TaskStatus};

use crate::error::{EngineError, EngineResult};
use crate::writer::{enqueue_action, ActionWriter, SpanWriter};

use super::{with_adapter_timeout, StepContext};

const DEFAULT_AGENT_IMAGE: &str = "rover/agent:default";

#[derive(Debug, Clone, Default)]
pub struct WorkflowStatus {
    pub launched: usize,
    pub monitored_completed: usize,
    pub monitored_failed: usize,
}

pub async fn tick<C: Clock>(ctx: StepContext<'_, C>) -> EngineResult<WorkflowStatus> {
    let mut status = WorkflowStatus::default();
    monitor(ctx, &mut status).await?;
    launch(ctx, &mut status).await?;
    Ok(status)
}

async fn monitor<C: Clock>(ctx: StepContext<'_, C>, status: &mut WorkflowStatus) -> EngineResult<()> {
    let mappings = ctx.store.all_task_mappings()?;
    let span_writer = SpanWriter::new(ctx.store, ctx.clock);
    let action_writer = ActionWriter::new(ctx.store, ctx.clock);

    for (workflow_action_id, mapping) in mappings {
        if ctx.trace_index.step_status(&mapping.trace_id, &workflow_action_id) != Some(SpanStatus::Running) {
            continue;
        }

        // May legitimately fail if the sandbox hasn't written a result file
        // yet; treated as "still running" rather than an error (§4.6).
        if ctx.adapters.tasks.update_status_from_iteration(&mapping.task_id).await.is_err() {
            continue;
        }
        let task = match ctx.adapters.tasks.get_task(&mapping.task_id).await {
            Ok(task) => task,
            Err(_) => continue,
        };

        match task.status {
            TaskStatus::Completed => {
                let mut workflow_span = ctx.store.read_span(&mapping.workflow_span_id)?;
                workflow_span.complete(ctx.clock.epoch_ms(), "task completed");
                span_writer.save(&workflow_span)?;
                ctx.trace_index.mark_step(mapping.trace_id, workflow_action_id, SpanStatus::Completed, "task completed");

                let mut action = action_writer.write(ActionKind::Commit, workflow_span.id, "task completed")?;
                action.meta.insert("task_id".to_string(), Value::String(mapping.task_id.to_string()));
                action.meta.insert("task_status".to_string(), Value::String("COMPLETED".to_string()));
                ctx.store.write_action(&action).map_err(EngineError::from)?;
                enqueue_action(ctx.store, ctx.clock, mapping.trace_id, &action, Step::Workflow, "task completed")?;
                ctx.trace_index.push_pending_step(mapping.trace_id, action.id, action.action, action.timestamp_ms);
                status.monitored_completed += 1;
            }
            TaskStatus::Failed => {
                let reason = task.error.clone().unwrap_or_else(|| "task failed".to_string());
                let mut workflow_span = ctx.store.read_span(&mapping.workflow_span_id)?;
                workflow_span.fail(ctx.clock.epoch_ms(), reason.clone());
                span_writer.save(&workflow_span)?;
                ctx.trace_index.mark_step(mapping.trace_id, workflow_action_id, SpanStatus::Failed, reason.clone());

                let mut action = action_writer.write(ActionKind::Commit, workflow_span.id, reason.clone())?;
                action.meta.insert("task_id".to_string(), Value::String(mapping.task_id.to_string()));
                action.meta.insert("task_status".to_string(), Value::String("FAILED".to_string()));
                ctx.store.write_action(&action).map_err(EngineError::from)?;
                enqueue_action(ctx.store, ctx.clock, mapping.trace_id, &action, Step::Workflow, reason)?;
                ctx.trace_index.push_pending_step(mapping.trace_id, action.id, action.action, action.timestamp_ms);
                status.monitored_failed += 1;
            }
            TaskStatus::New | TaskStatus::InProgress | TaskStatus::Iterating | TaskStatus::Merged | TaskStatus::Pushed => {}
        }
    }
    Ok(())
}

async fn launch<C: Clock>(ctx: StepContext<'_, C>, status: &mut WorkflowStatus) -> EngineResult<()> {
    let running_tasks = ctx
        .adapters
        .tasks
        .list_tasks()
        .await
        .map_err(EngineError::from)?
        .into_iter()
        .filter(|t| matches!(t.status, TaskStatus::InProgress | TaskStatus::Iterating))
        .count();
    let mut available = ctx.config.max_running_tasks.saturating_sub(running_tasks);
    if available == 0 {
        return Ok(());
    }

    let candidates: Vec<PendingAction> = ctx
        .store
        .get_pending()?
        .into_iter()
        .filter(|p| p.action == ActionKind::Workflow)
        .take(ctx.config.workflow.max_parallel)
        .collect();

    let span_writer = SpanWriter::new(ctx.store, ctx.clock);

    for pending in candidates {
        if available == 0 {
            break;
        }
        let action = ctx.store.read_action(&pending.action_id)?;

        // A mapping already exists for this action: a prior process was
        // killed after `try_launch` created it but before it removed this
        // PendingAction (§8 S6). The task is already running; finish the
        // interrupted cleanup instead of launching a second task for it.
        if ctx.store.get_task_mapping(&action.id)?.is_some() {
            ctx.trace_index.mark_step(pending.trace_id, pending.action_id.clone(), SpanStatus::Running, "already launched");
            ctx.store.remove_pending(&pending.action_id).map_err(EngineError::from)?;
            continue;
        }

        let base_branch = match resolve_dependency(ctx, &action).await? {
            Dependency::None(current) => current,
            Dependency::Ready(branch) => branch,
            Dependency::NotReady => continue,
            Dependency::Failed => {
                ctx.trace_index.mark_step(pending.trace_id, pending.action_id.clone(), SpanStatus::Failed, "dependency failed");
                ctx.store.remove_pending(&pending.action_id).map_err(EngineError::from)?;
                continue;
            }
        };

        match try_launch(ctx, &span_writer, &pending, &action, &base_branch).await {
            Ok(()) => {
                available -= 1;
                status.launched += 1;
            }
            Err(_) => {
                // Transient launch failure: the PendingAction stays in place
                // and is retried next tick (§7).
            }
        }
    }
    Ok(())
}

enum Dependency {
    /// No `depends_on_action_id`; base off the repo's current branch.
    None(String),
    Ready(String),
    NotReady,
    Failed,
}

async fn resolve_dependency<C: Clock>(ctx: StepContext<'_, C>, action: &Action) -> EngineResult<Dependency> {
    let Some(dep_id_str) = action.meta.get("depends_on_action_id").and_then(Value::as_str) else {
        let branch = ctx.adapters.git.current_branch(ctx.store.root()).await.map_err(EngineError::from)?;
        return Ok(Dependency::None(branch));
    };
    let Ok(dep_id) = dep_id_str.parse::<ActionId>() else {
        return Ok(Dependency::NotReady);
    };
    let Some(dep_mapping) = ctx.store.get_task_mapping(&dep_id)? else {
        return Ok(Dependency::NotReady);
    };
    let Ok(dep_task) = ctx.adapters.tasks.get_task(&dep_mapping.task_id).await else {
        return Ok(Dependency::NotReady);
    };
    match dep_task.status {
        TaskStatus::Completed => Ok(Dependency::Ready(dep_mapping.branch_name)),
        TaskStatus::Failed => Ok(Dependency::Failed),
        // Still running: this item waits for it, without consuming a slot.
        _ => Ok(Dependency::NotReady),
    }
}

async fn try_launch<C: Clock>(
    ctx: StepContext<'_, C>,
    span_writer: &SpanWriter<'_, C>,
    pending: &PendingAction,
    action: &Action,
    base_branch: &str,
) -> EngineResult<()> {
    let title = action
        .meta
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or(&pending.summary)
        .to_string();

    let task = ctx.adapters.tasks.create_task(&title).await.map_err(EngineError::from)?;
    ctx.adapters.tasks.mark_in_progress(&task.id).await.map_err(EngineError::from)?;

    let branch_name = format!("autopilot/{}", task.id.as_str());
    let worktree = ctx
        .adapters
        .git
        .create_worktree(&branch_name, base_branch)
        .await
        .map_err(EngineError::from)?;
    let base_commit = ctx.adapters.git.head_commit(&worktree).await.map_err(EngineError::from)?;
    ctx.adapters.tasks.set_base_commit(&task.id, &base_commit).await.map_err(EngineError::from)?;
    ctx.adapters
        .tasks
        .set_workspace(&task.id, &worktree.to_string_lossy())
        .await
        .map_err(EngineError::from)?;

    let workflow_span = span_writer.child(pending.span_id, Step::Workflow, title.clone())?;

    let sandbox_options = SandboxOptions {
        image: DEFAULT_AGENT_IMAGE.to_string(),
        workspace: worktree.clone(),
        env: Vec::new(),
    };
    match with_adapter_timeout(ctx.config.sandbox_task_timeout, "sandbox", ctx.adapters.sandbox.create_sandbox(&task, sandbox_options)).await {
        Ok(sandbox) => match with_adapter_timeout(ctx.config.sandbox_task_timeout, "sandbox", sandbox.create_and_start()).await {
            Ok(container_id) => {
                ctx.adapters.tasks.set_container_info(&task.id, &container_id).await.map_err(EngineError::from)?;
                ctx.adapters.tasks.set_agent_image(&task.id, DEFAULT_AGENT_IMAGE).await.map_err(EngineError::from)?;
            }
            Err(err) => {
                ctx.adapters.tasks.reset_to_new(&task.id).await.map_err(EngineError::from)?;
                tracing::warn!(task_id = %task.id, %err, "sandbox failed to start; workflow proceeds to monitoring");
            }
        },
        Err(err) => {
            ctx.adapters.tasks.reset_to_new(&task.id).await.map_err(EngineError::from)?;
            tracing::warn!(task_id = %task.id, %err, "sandbox launch failed; workflow proceeds to monitoring");
        }
    }

    ctx.store
        .set_task_mapping(
            action.id,
            TaskMapping::new(task.id, branch_name, pending.trace_id, workflow_span.id),
        )
        .map_err(EngineError::from)?;

    ctx.trace_index.mark_step(pending.trace_id, pending.action_id.clone(), SpanStatus::Running, "launched");
    ctx.store.remove_pending(&pending.action_id).map_err(EngineError::from)?;
    Ok(())
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
