//! Commit enumeration for forcetest.
//!
//! Two strategies implement [`CommitSource`]:
//! - [`RangeCommits`]: commits on a branch that are not on a baseline branch
//! - [`LinearCommits`]: the latest commits on a branch after pulling it
//!
//! Both shell out to `git` in an existing local clone and only report commits
//! that touch the configured source subtree.

pub mod error;
pub mod git;
pub mod linear;
pub mod range;

pub use error::{GitError, GitResult};
pub use git::Git;
pub use linear::LinearCommits;
pub use range::RangeCommits;

use forcetest_config::{CommitMode, RunConfig};
use forcetest_core::CommitSource;
use std::sync::Arc;

/// Create the commit source selected by the run configuration.
pub fn commit_source(config: &RunConfig) -> Arc<dyn CommitSource> {
    let git = Git::new(&config.repository);
    match config.mode {
        CommitMode::Range => Arc::new(RangeCommits::new(
            git,
            &config.baseline,
            &config.source_path,
        )),
        CommitMode::Linear => Arc::new(LinearCommits::new(git, &config.source_path)),
    }
}
