//! Tunables for the scheduler and stages (§4.13, §5). `rover-daemon` loads
//! these from layered config and hands the result to the engine as a value,
//! never a global (§9).

use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct StageSchedule {
    pub initial_delay: Duration,
    pub period: Duration,
    pub max_parallel: usize,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub poller: StageSchedule,
    pub coordinator: StageSchedule,
    pub planner: StageSchedule,
    pub workflow: StageSchedule,
    pub committer: StageSchedule,
    pub resolver: StageSchedule,
    pub push: StageSchedule,
    pub notify: StageSchedule,

    /// Cap on sandbox tasks in `{IN_PROGRESS, ITERATING}` at once (§4.6).
    pub max_running_tasks: usize,
    /// Iteration ceiling before the resolver must fail rather than iterate
    /// (§3, §8).
    pub max_retries: u32,
    /// How many events the poller asks the event source for per tick.
    pub poll_fetch_limit: usize,
    /// Whether the committer appends an attribution trailer to commit
    /// messages (DESIGN.md Open Question 4).
    pub commit_attribution_trailer: bool,
    /// Upper bound on a single AI agent call (§4.13).
    pub ai_call_timeout: Duration,
    /// Upper bound on a single sandbox-creation call (§4.13).
    pub sandbox_task_timeout: Duration,
}

impl Default for EngineConfig {
    /// Matches the approximate stagger and cadence described in §5: poller
    /// at 0s/60s, then each downstream stage 5s apart at a steady 30s period.
    fn default() -> Self {
        let stage = |delay_secs: u64, period_secs: u64, max_parallel: usize| StageSchedule {
            initial_delay: Duration::from_secs(delay_secs),
            period: Duration::from_secs(period_secs),
            max_parallel,
        };
        Self {
            poller: stage(0, 60, 1),
            coordinator: stage(5, 30, 3),
            planner: stage(10, 30, 3),
            workflow: stage(15, 30, 3),
            committer: stage(20, 30, 3),
            resolver: stage(25, 30, 3),
            push: stage(27, 30, 3),
            notify: stage(29, 30, 3),
            max_running_tasks: 3,
            max_retries: 3,
            poll_fetch_limit: 50,
            commit_attribution_trailer: false,
            ai_call_timeout: Duration::from_secs(120),
            sandbox_task_timeout: Duration::from_secs(600),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_spec_constants() {
        let config = EngineConfig::default();
        assert_eq!(config.max_running_tasks, 3);
        assert_eq!(config.max_retries, 3);
    }
}
