//! Branch-versus-baseline commit enumeration.

use async_trait::async_trait;
use forcetest_core::{Commit, CommitQuery, CommitSource, CommitStream, CommitSummary, Result};
use tracing::info;

use crate::Git;
use crate::git::log_args;

/// Lists commits reachable from a branch but not from the baseline branch.
///
/// When the branch is the baseline itself, its whole history is listed.
#[derive(Debug, Clone)]
pub struct RangeCommits {
    git: Git,
    baseline: String,
    source_path: String,
}

impl RangeCommits {
    pub fn new(git: Git, baseline: &str, source_path: &str) -> Self {
        Self {
            git,
            baseline: baseline.to_string(),
            source_path: source_path.to_string(),
        }
    }

    fn args(&self, query: &CommitQuery) -> Vec<String> {
        let exclude = (query.branch != self.baseline).then_some(self.baseline.as_str());
        log_args(query, exclude, &self.source_path)
    }
}

#[async_trait]
impl CommitSource for RangeCommits {
    fn name(&self) -> &str {
        "range"
    }

    async fn commits(&self, query: &CommitQuery) -> Result<CommitStream> {
        info!(
            branch = %query.branch,
            baseline = %self.baseline,
            start = %query.start(),
            limit = query.limit,
            "Listing commits not on baseline"
        );
        Ok(self.git.stream_log(self.args(query))?)
    }

    async fn describe(&self, commit: &Commit) -> Result<CommitSummary> {
        Ok(self.git.describe(commit).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excludes_baseline() {
        let source = RangeCommits::new(Git::new("."), "master", "src");
        let args = source.args(&CommitQuery::new("REL_16_STABLE").with_limit(20));
        assert!(args.contains(&"^master".to_string()));
        assert!(args.contains(&"--max-count=20".to_string()));
    }

    #[test]
    fn test_baseline_lists_own_history() {
        let source = RangeCommits::new(Git::new("."), "master", "src");
        let args = source.args(&CommitQuery::new("master"));
        assert!(!args.iter().any(|a| a.starts_with('^')));
        assert!(!args.iter().any(|a| a.starts_with("--max-count")));
    }
}
