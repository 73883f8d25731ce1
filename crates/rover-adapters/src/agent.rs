//! AI agent adapter: the one place the core turns a prompt into a decision.
//!
//! Grounded on the teacher's `AgentAdapter` trait
//! (`crates/daemon/src/adapters/agent/mod.rs`) — an async-trait with a
//! single request/response method and a dedicated error enum.

use async_trait::async_trait;

use crate::error::AdapterResult;

#[derive(Debug, Clone, Default)]
pub struct AgentOptions {
    /// When set, the caller expects the response body to be JSON and will
    /// fail to parse it otherwise (coordinator/planner/resolver/notify all
    /// set this for their structured decisions).
    pub json: bool,
    pub model: Option<String>,
    pub system_prompt: Option<String>,
}

/// Invokes an AI backend with a prompt and returns its raw text response.
#[async_trait]
pub trait AiAgent: Send + Sync {
    async fn invoke(&self, prompt: &str, options: AgentOptions) -> AdapterResult<String>;
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// Replays a fixed script of responses, one per call, in order. Panics
    /// (test-only) if exhausted, so a test's assumed call count is verified
    /// by construction.
    pub struct FakeAiAgent {
        responses: Mutex<VecDeque<String>>,
        pub prompts_seen: Mutex<Vec<String>>,
    }

    impl FakeAiAgent {
        pub fn new(responses: impl IntoIterator<Item = impl Into<String>>) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
                prompts_seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl AiAgent for FakeAiAgent {
        async fn invoke(&self, prompt: &str, _options: AgentOptions) -> AdapterResult<String> {
            self.prompts_seen.lock().push(prompt.to_string());
            match self.responses.lock().pop_front() {
                Some(response) => Ok(response),
                None => Err(crate::error::AdapterError::NotFound(
                    "fake agent script exhausted".to_string(),
                )),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::FakeAiAgent;
    use super::*;

    #[tokio::test]
    async fn fake_agent_replays_responses_in_order() {
        let agent = FakeAiAgent::new(["first", "second"]);
        let a = agent.invoke("p1", AgentOptions::default()).await.expect("first");
        let b = agent.invoke("p2", AgentOptions::default()).await.expect("second");
        assert_eq!(a, "first");
        assert_eq!(b, "second");
        assert_eq!(agent.prompts_seen.lock().len(), 2);
    }

    #[tokio::test]
    async fn fake_agent_errors_once_exhausted() {
        let agent = FakeAiAgent::new(Vec::<String>::new());
        assert!(agent.invoke("p", AgentOptions::default()).await.is_err());
    }
}
