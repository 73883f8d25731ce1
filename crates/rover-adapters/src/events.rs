//! External event source adapter (§6): the activity stream the poller
//! drains. The processed-ids cursor lives in the store, not here (§4.3).

use async_trait::async_trait;

use rover_core::Event;

use crate::error::AdapterResult;

#[async_trait]
pub trait EventSource: Send + Sync {
    async fn fetch_events(&self, limit: usize) -> AdapterResult<Vec<Event>>;
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    #[derive(Default)]
    pub struct FakeEventSource {
        queued: Mutex<VecDeque<Event>>,
        pub fail_next: Mutex<bool>,
    }

    impl FakeEventSource {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push(&self, event: Event) {
            self.queued.lock().push_back(event);
        }
    }

    #[async_trait]
    impl EventSource for FakeEventSource {
        async fn fetch_events(&self, limit: usize) -> AdapterResult<Vec<Event>> {
            if std::mem::take(&mut *self.fail_next.lock()) {
                return Err(crate::error::AdapterError::Timeout("event source"));
            }
            let mut queue = self.queued.lock();
            let n = limit.min(queue.len());
            Ok(queue.drain(..n).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::FakeEventSource;
    use super::*;
    use rover_core::EventKind;

    fn sample() -> Event {
        Event {
            id: rover_core::EventId::new(),
            repo: "owner/repo".to_string(),
            kind: EventKind::IssueOpened,
            author: None,
            issue_number: Some(1),
            pr_number: None,
            is_pull_request: false,
        }
    }

    #[tokio::test]
    async fn fetch_respects_the_limit() {
        let source = FakeEventSource::new();
        source.push(sample());
        source.push(sample());
        let events = source.fetch_events(1).await.expect("fetch");
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn fail_next_forces_one_error() {
        let source = FakeEventSource::new();
        *source.fail_next.lock() = true;
        assert!(source.fetch_events(10).await.is_err());
        source.push(sample());
        assert_eq!(source.fetch_events(10).await.expect("fetch").len(), 1);
    }
}
