//! Layered daemon configuration (§4.13): compiled-in defaults, an optional
//! per-project `rover.toml`, then environment variable overrides. Parsing or
//! validation failure is always [`CoreError::system_fatal`] — the autopilot
//! never starts half-configured.
//!
//! Grounded on the teacher's `env.rs` (env-var-override-of-a-default
//! pattern), generalized from flat getters to a struct so every knob is
//! visible in one place and the result can be handed to `rover_engine` as a
//! plain value.

use std::path::Path;
use std::time::Duration;

use rover_core::{CoreError, CoreResult, CURSOR_TAIL};
use rover_engine::{EngineConfig, StageSchedule};
use rover_storage::ROTATE_AT_BYTES;
use serde::Deserialize;

/// Default rotated-log copies kept alongside the active `log.jsonl`.
const DEFAULT_MAX_ROTATED: u32 = 3;

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub engine: EngineConfig,
    pub log_rotate_bytes: u64,
    pub log_max_rotated: u32,
    requested_cursor_tail_size: Option<usize>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            log_rotate_bytes: ROTATE_AT_BYTES,
            log_max_rotated: DEFAULT_MAX_ROTATED,
            requested_cursor_tail_size: None,
        }
    }
}

/// Mirrors [`DaemonConfig`]/[`EngineConfig`] field-for-field, but every field
/// is optional so a `rover.toml` only needs to name what it overrides.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    stages: StageFileConfig,
    max_running_tasks: Option<usize>,
    max_retries: Option<u32>,
    poll_fetch_limit: Option<usize>,
    commit_attribution_trailer: Option<bool>,
    ai_call_timeout_secs: Option<u64>,
    sandbox_task_timeout_secs: Option<u64>,
    cursor_tail_size: Option<usize>,
    log_rotate_bytes: Option<u64>,
    log_max_rotated: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct StageFileConfig {
    poller: StageScheduleFileConfig,
    coordinator: StageScheduleFileConfig,
    planner: StageScheduleFileConfig,
    workflow: StageScheduleFileConfig,
    committer: StageScheduleFileConfig,
    resolver: StageScheduleFileConfig,
    push: StageScheduleFileConfig,
    notify: StageScheduleFileConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct StageScheduleFileConfig {
    initial_delay_ms: Option<u64>,
    period_ms: Option<u64>,
    max_parallel: Option<usize>,
}

impl DaemonConfig {
    /// Loads defaults, merges an optional `<project_path>/rover.toml`, then
    /// applies `ROVER_*` environment overrides. `project_path` is the same
    /// path passed to `Start` (§6) — config resolution happens once, at
    /// startup, not per call.
    pub fn load(project_path: &Path) -> CoreResult<Self> {
        let mut config = Self::default();

        let toml_path = project_path.join("rover.toml");
        if toml_path.exists() {
            let text = std::fs::read_to_string(&toml_path).map_err(|err| {
                CoreError::system_fatal(format!("reading {}: {err}", toml_path.display()))
            })?;
            let file: FileConfig = toml::from_str(&text).map_err(|err| {
                CoreError::system_fatal(format!("parsing {}: {err}", toml_path.display()))
            })?;
            config.apply_file(file);
        }

        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    fn apply_file(&mut self, file: FileConfig) {
        apply_stage(&mut self.engine.poller, file.stages.poller);
        apply_stage(&mut self.engine.coordinator, file.stages.coordinator);
        apply_stage(&mut self.engine.planner, file.stages.planner);
        apply_stage(&mut self.engine.workflow, file.stages.workflow);
        apply_stage(&mut self.engine.committer, file.stages.committer);
        apply_stage(&mut self.engine.resolver, file.stages.resolver);
        apply_stage(&mut self.engine.push, file.stages.push);
        apply_stage(&mut self.engine.notify, file.stages.notify);

        if let Some(v) = file.max_running_tasks {
            self.engine.max_running_tasks = v;
        }
        if let Some(v) = file.max_retries {
            self.engine.max_retries = v;
        }
        if let Some(v) = file.poll_fetch_limit {
            self.engine.poll_fetch_limit = v;
        }
        if let Some(v) = file.commit_attribution_trailer {
            self.engine.commit_attribution_trailer = v;
        }
        if let Some(v) = file.ai_call_timeout_secs {
            self.engine.ai_call_timeout = Duration::from_secs(v);
        }
        if let Some(v) = file.sandbox_task_timeout_secs {
            self.engine.sandbox_task_timeout = Duration::from_secs(v);
        }
        if let Some(v) = file.log_rotate_bytes {
            self.log_rotate_bytes = v;
        }
        if let Some(v) = file.log_max_rotated {
            self.log_max_rotated = v;
        }
        // cursor_tail_size is validated, not applied: CURSOR_TAIL is a fixed
        // invariant (§3 "trims at exactly 200"), not a tunable.
        self.requested_cursor_tail_size = file.cursor_tail_size;
    }

    fn apply_env(&mut self) -> CoreResult<()> {
        env_u64("ROVER_POLLER_INITIAL_DELAY_MS", &mut self.engine.poller.initial_delay)?;
        env_u64("ROVER_POLLER_PERIOD_MS", &mut self.engine.poller.period)?;
        env_usize("ROVER_POLLER_MAX_PARALLEL", &mut self.engine.poller.max_parallel)?;

        env_u64("ROVER_COORDINATOR_INITIAL_DELAY_MS", &mut self.engine.coordinator.initial_delay)?;
        env_u64("ROVER_COORDINATOR_PERIOD_MS", &mut self.engine.coordinator.period)?;
        env_usize("ROVER_COORDINATOR_MAX_PARALLEL", &mut self.engine.coordinator.max_parallel)?;

        env_u64("ROVER_PLANNER_INITIAL_DELAY_MS", &mut self.engine.planner.initial_delay)?;
        env_u64("ROVER_PLANNER_PERIOD_MS", &mut self.engine.planner.period)?;
        env_usize("ROVER_PLANNER_MAX_PARALLEL", &mut self.engine.planner.max_parallel)?;

        env_u64("ROVER_WORKFLOW_INITIAL_DELAY_MS", &mut self.engine.workflow.initial_delay)?;
        env_u64("ROVER_WORKFLOW_PERIOD_MS", &mut self.engine.workflow.period)?;
        env_usize("ROVER_WORKFLOW_MAX_PARALLEL", &mut self.engine.workflow.max_parallel)?;

        env_u64("ROVER_COMMITTER_INITIAL_DELAY_MS", &mut self.engine.committer.initial_delay)?;
        env_u64("ROVER_COMMITTER_PERIOD_MS", &mut self.engine.committer.period)?;
        env_usize("ROVER_COMMITTER_MAX_PARALLEL", &mut self.engine.committer.max_parallel)?;

        env_u64("ROVER_RESOLVER_INITIAL_DELAY_MS", &mut self.engine.resolver.initial_delay)?;
        env_u64("ROVER_RESOLVER_PERIOD_MS", &mut self.engine.resolver.period)?;
        env_usize("ROVER_RESOLVER_MAX_PARALLEL", &mut self.engine.resolver.max_parallel)?;

        env_u64("ROVER_PUSH_INITIAL_DELAY_MS", &mut self.engine.push.initial_delay)?;
        env_u64("ROVER_PUSH_PERIOD_MS", &mut self.engine.push.period)?;
        env_usize("ROVER_PUSH_MAX_PARALLEL", &mut self.engine.push.max_parallel)?;

        env_u64("ROVER_NOTIFY_INITIAL_DELAY_MS", &mut self.engine.notify.initial_delay)?;
        env_u64("ROVER_NOTIFY_PERIOD_MS", &mut self.engine.notify.period)?;
        env_usize("ROVER_NOTIFY_MAX_PARALLEL", &mut self.engine.notify.max_parallel)?;

        if let Some(v) = env_parse::<usize>("ROVER_MAX_RUNNING_TASKS")? {
            self.engine.max_running_tasks = v;
        }
        if let Some(v) = env_parse::<u32>("ROVER_MAX_RETRIES")? {
            self.engine.max_retries = v;
        }
        if let Some(v) = env_parse::<usize>("ROVER_POLL_FETCH_LIMIT")? {
            self.engine.poll_fetch_limit = v;
        }
        if let Some(v) = env_parse::<bool>("ROVER_COMMIT_ATTRIBUTION_TRAILER")? {
            self.engine.commit_attribution_trailer = v;
        }
        if let Some(v) = env_parse::<u64>("ROVER_AI_CALL_TIMEOUT_SECS")? {
            self.engine.ai_call_timeout = Duration::from_secs(v);
        }
        if let Some(v) = env_parse::<u64>("ROVER_SANDBOX_TASK_TIMEOUT_SECS")? {
            self.engine.sandbox_task_timeout = Duration::from_secs(v);
        }
        if let Some(v) = env_parse::<u64>("ROVER_LOG_ROTATE_BYTES")? {
            self.log_rotate_bytes = v;
        }
        if let Some(v) = env_parse::<u32>("ROVER_LOG_MAX_ROTATED")? {
            self.log_max_rotated = v;
        }
        if let Some(v) = env_parse::<usize>("ROVER_CURSOR_TAIL_SIZE")? {
            self.requested_cursor_tail_size = Some(v);
        }
        Ok(())
    }

    /// Rejects a config that cannot be run at all, per §4.13's "never
    /// partially-defaulted, unvalidated" rule.
    fn validate(&self) -> CoreResult<()> {
        if let Some(requested) = self.requested_cursor_tail_size {
            if requested != CURSOR_TAIL {
                return Err(CoreError::system_fatal(format!(
                    "cursor tail size is fixed at {CURSOR_TAIL}, got {requested} requested in config"
                )));
            }
        }
        for (name, schedule) in [
            ("poller", &self.engine.poller),
            ("coordinator", &self.engine.coordinator),
            ("planner", &self.engine.planner),
            ("workflow", &self.engine.workflow),
            ("committer", &self.engine.committer),
            ("resolver", &self.engine.resolver),
            ("push", &self.engine.push),
            ("notify", &self.engine.notify),
        ] {
            if schedule.period.is_zero() {
                return Err(CoreError::system_fatal(format!("{name} stage period must be non-zero")));
            }
            if schedule.max_parallel == 0 {
                return Err(CoreError::system_fatal(format!("{name} stage max_parallel must be non-zero")));
            }
        }
        if self.engine.max_running_tasks == 0 {
            return Err(CoreError::system_fatal("max_running_tasks must be non-zero"));
        }
        if self.log_max_rotated == 0 {
            return Err(CoreError::system_fatal("log_max_rotated must be non-zero"));
        }
        Ok(())
    }
}

fn apply_stage(schedule: &mut StageSchedule, file: StageScheduleFileConfig) {
    if let Some(ms) = file.initial_delay_ms {
        schedule.initial_delay = Duration::from_millis(ms);
    }
    if let Some(ms) = file.period_ms {
        schedule.period = Duration::from_millis(ms);
    }
    if let Some(v) = file.max_parallel {
        schedule.max_parallel = v;
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> CoreResult<Option<T>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| CoreError::system_fatal(format!("{key}: invalid value {raw:?}"))),
        Err(_) => Ok(None),
    }
}

fn env_u64(key: &str, target: &mut Duration) -> CoreResult<()> {
    if let Some(ms) = env_parse::<u64>(key)? {
        *target = Duration::from_millis(ms);
    }
    Ok(())
}

fn env_usize(key: &str, target: &mut usize) -> CoreResult<()> {
    if let Some(v) = env_parse::<usize>(key)? {
        *target = v;
    }
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
