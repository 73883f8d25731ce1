//! Remote hosting adapter (§6): the narrow slice the core actually uses —
//! posting a comment to an issue or PR. Fetching issue/PR activity is the
//! event source adapter's job, not this one.

use async_trait::async_trait;

use crate::error::AdapterResult;

#[async_trait]
pub trait Hosting: Send + Sync {
    async fn comment_issue(&self, repo: &str, issue_number: u64, body: &str) -> AdapterResult<()>;
    async fn comment_pr(&self, repo: &str, pr_number: u64, body: &str) -> AdapterResult<()>;
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct PostedComment {
        pub repo: String,
        pub target: String,
        pub body: String,
    }

    #[derive(Default)]
    pub struct FakeHosting {
        pub comments: Mutex<Vec<PostedComment>>,
        pub fail_next: Mutex<bool>,
    }

    impl FakeHosting {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl Hosting for FakeHosting {
        async fn comment_issue(&self, repo: &str, issue_number: u64, body: &str) -> AdapterResult<()> {
            if std::mem::take(&mut *self.fail_next.lock()) {
                return Err(crate::error::AdapterError::Timeout("hosting"));
            }
            self.comments.lock().push(PostedComment {
                repo: repo.to_string(),
                target: format!("issue#{issue_number}"),
                body: body.to_string(),
            });
            Ok(())
        }

        async fn comment_pr(&self, repo: &str, pr_number: u64, body: &str) -> AdapterResult<()> {
            if std::mem::take(&mut *self.fail_next.lock()) {
                return Err(crate::error::AdapterError::Timeout("hosting"));
            }
            self.comments.lock().push(PostedComment {
                repo: repo.to_string(),
                target: format!("pr#{pr_number}"),
                body: body.to_string(),
            });
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::FakeHosting;
    use super::*;

    #[tokio::test]
    async fn records_issue_comments_with_target() {
        let hosting = FakeHosting::new();
        hosting.comment_issue("owner/repo", 42, "done").await.expect("comment");
        assert_eq!(hosting.comments.lock()[0].target, "issue#42");
    }
}
