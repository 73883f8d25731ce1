//! Git porcelain adapter (§6). File-level operations only; the core never
//! shells out to git directly, matching the teacher's subprocess-wrapped
//! adapter style in `crates/daemon/src/adapters/agent/mod.rs`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::AdapterResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebaseConflicts {
    pub paths: Vec<String>,
}

#[async_trait]
pub trait Git: Send + Sync {
    async fn create_worktree(&self, branch: &str, base: &str) -> AdapterResult<PathBuf>;
    async fn current_branch(&self, repo: &Path) -> AdapterResult<String>;
    /// The commit `HEAD` points to in `repo`; captured as a task's
    /// `base_commit` right after its worktree is created (§4.6).
    async fn head_commit(&self, repo: &Path) -> AdapterResult<String>;
    async fn add_commit(&self, repo: &Path, message: &str) -> AdapterResult<String>;
    async fn push(&self, repo: &Path, branch: &str) -> AdapterResult<()>;
    async fn rebase_onto(&self, repo: &Path, onto: &str) -> AdapterResult<Option<RebaseConflicts>>;
    async fn continue_rebase(&self, repo: &Path) -> AdapterResult<()>;
    async fn abort_rebase(&self, repo: &Path) -> AdapterResult<()>;
    async fn blame(&self, repo: &Path, file: &str) -> AdapterResult<String>;
    async fn sparse_checkout_exclude(&self, repo: &Path, patterns: &[String]) -> AdapterResult<()>;
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    pub struct FakeGit {
        pub commits: Mutex<Vec<(PathBuf, String)>>,
        pub pushed_branches: Mutex<Vec<String>>,
        pub next_commit_sha: Mutex<Option<String>>,
    }

    impl FakeGit {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl Git for FakeGit {
        async fn create_worktree(&self, branch: &str, _base: &str) -> AdapterResult<PathBuf> {
            Ok(PathBuf::from(format!("/tmp/worktrees/{branch}")))
        }

        async fn current_branch(&self, _repo: &Path) -> AdapterResult<String> {
            Ok("main".to_string())
        }

        async fn head_commit(&self, _repo: &Path) -> AdapterResult<String> {
            Ok("0000000000000000000000000000000000000000".to_string())
        }

        async fn add_commit(&self, repo: &Path, message: &str) -> AdapterResult<String> {
            self.commits.lock().push((repo.to_path_buf(), message.to_string()));
            Ok(self.next_commit_sha.lock().clone().unwrap_or_else(|| "deadbeef".to_string()))
        }

        async fn push(&self, _repo: &Path, branch: &str) -> AdapterResult<()> {
            self.pushed_branches.lock().push(branch.to_string());
            Ok(())
        }

        async fn rebase_onto(&self, _repo: &Path, _onto: &str) -> AdapterResult<Option<RebaseConflicts>> {
            Ok(None)
        }

        async fn continue_rebase(&self, _repo: &Path) -> AdapterResult<()> {
            Ok(())
        }

        async fn abort_rebase(&self, _repo: &Path) -> AdapterResult<()> {
            Ok(())
        }

        async fn blame(&self, _repo: &Path, _file: &str) -> AdapterResult<String> {
            Ok(String::new())
        }

        async fn sparse_checkout_exclude(&self, _repo: &Path, _patterns: &[String]) -> AdapterResult<()> {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::FakeGit;
    use super::*;

    #[tokio::test]
    async fn fake_git_records_commits() {
        let git = FakeGit::new();
        git.add_commit(Path::new("/repo"), "fix bug").await.expect("commit");
        assert_eq!(git.commits.lock().len(), 1);
    }

    #[tokio::test]
    async fn fake_git_records_pushed_branches() {
        let git = FakeGit::new();
        git.push(Path::new("/repo"), "autopilot/fix-1").await.expect("push");
        assert_eq!(git.pushed_branches.lock()[0], "autopilot/fix-1");
    }
}
