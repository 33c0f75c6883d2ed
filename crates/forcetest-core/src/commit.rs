//! Commit identifiers and the commit source trait.
//!
//! A commit source turns a branch (and optional starting revision) into a
//! stream of commit hashes, most recent first.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use derive_more::Display;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::Result;

/// A commit hash as reported by the version-control tool.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[display("{_0}")]
pub struct Commit(String);

impl Commit {
    /// Parse one line of `git log --format=%H` output.
    ///
    /// Surrounding whitespace and quotes are stripped. Returns `None` for
    /// blank lines.
    pub fn from_log_line(line: &str) -> Option<Self> {
        let hash = line.trim().trim_matches('"');
        if hash.is_empty() {
            None
        } else {
            Some(Self(hash.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First seven characters of the hash.
    pub fn short(&self) -> &str {
        self.0.get(..7).unwrap_or(&self.0)
    }
}

impl From<&str> for Commit {
    fn from(hash: &str) -> Self {
        Self(hash.to_string())
    }
}

impl From<String> for Commit {
    fn from(hash: String) -> Self {
        Self(hash)
    }
}

/// Human-readable details for a commit, only fetched for verbose output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    /// First line of the commit message.
    pub subject: String,
    /// Author date, if it could be parsed.
    pub date: Option<DateTime<FixedOffset>>,
}

/// What to enumerate for one branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitQuery {
    pub branch: String,
    /// Revision to start from instead of the branch tip.
    pub revision: Option<String>,
    /// Maximum number of commits; 0 means no limit.
    pub limit: u32,
}

impl CommitQuery {
    pub fn new(branch: impl Into<String>) -> Self {
        Self {
            branch: branch.into(),
            revision: None,
            limit: 0,
        }
    }

    pub fn with_revision(mut self, revision: Option<String>) -> Self {
        self.revision = revision;
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// The ref history starts from.
    pub fn start(&self) -> &str {
        self.revision.as_deref().unwrap_or(&self.branch)
    }

    /// The limit as a cap on stream length, `None` when unbounded.
    pub fn cap(&self) -> Option<usize> {
        (self.limit > 0).then_some(self.limit as usize)
    }
}

/// Stream of commits, most recent first.
pub type CommitStream = BoxStream<'static, Result<Commit>>;

/// Trait for commit enumeration strategies.
#[async_trait]
pub trait CommitSource: Send + Sync {
    /// Get the strategy name.
    fn name(&self) -> &str;

    /// Enumerate commits for a branch.
    async fn commits(&self, query: &CommitQuery) -> Result<CommitStream>;

    /// Look up the subject line and author date of a commit.
    async fn describe(&self, commit: &Commit) -> Result<CommitSummary>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_log_line_strips_quotes() {
        let commit = Commit::from_log_line("\"abc123\"\n").unwrap();
        assert_eq!(commit.as_str(), "abc123");
    }

    #[test]
    fn test_from_log_line_blank() {
        assert!(Commit::from_log_line("   ").is_none());
        assert!(Commit::from_log_line("\"\"").is_none());
    }

    #[test]
    fn test_short_hash() {
        let commit = Commit::from("0123456789abcdef");
        assert_eq!(commit.short(), "0123456");

        let tiny = Commit::from("abc");
        assert_eq!(tiny.short(), "abc");
    }

    #[test]
    fn test_query_start_and_cap() {
        let query = CommitQuery::new("release/16").with_limit(5);
        assert_eq!(query.start(), "release/16");
        assert_eq!(query.cap(), Some(5));

        let query = query
            .with_revision(Some("deadbeef".to_string()))
            .with_limit(0);
        assert_eq!(query.start(), "deadbeef");
        assert_eq!(query.cap(), None);
    }
}
