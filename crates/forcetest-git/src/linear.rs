//! Most-recent-first commit enumeration on an up-to-date branch.

use async_trait::async_trait;
use forcetest_core::{Commit, CommitQuery, CommitSource, CommitStream, CommitSummary, Result};
use tracing::info;

use crate::Git;
use crate::git::log_args;

/// Checks out and pulls the branch, then lists its latest commits.
#[derive(Debug, Clone)]
pub struct LinearCommits {
    git: Git,
    source_path: String,
}

impl LinearCommits {
    pub fn new(git: Git, source_path: &str) -> Self {
        Self {
            git,
            source_path: source_path.to_string(),
        }
    }
}

#[async_trait]
impl CommitSource for LinearCommits {
    fn name(&self) -> &str {
        "linear"
    }

    async fn commits(&self, query: &CommitQuery) -> Result<CommitStream> {
        info!(branch = %query.branch, repo = %self.git.repo().display(), "Updating branch");
        self.git.checkout(&query.branch).await?;
        self.git.pull().await?;

        info!(
            branch = %query.branch,
            start = %query.start(),
            limit = query.limit,
            "Listing recent commits"
        );
        Ok(self
            .git
            .stream_log(log_args(query, None, &self.source_path))?)
    }

    async fn describe(&self, commit: &Commit) -> Result<CommitSummary> {
        Ok(self.git.describe(commit).await?)
    }
}
