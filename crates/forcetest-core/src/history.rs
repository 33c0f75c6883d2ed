//! Build history lookup used to skip commits that were already tested.

use async_trait::async_trait;

use crate::{Commit, Result, TestKind};

/// Trait for stores that record finished builds.
#[async_trait]
pub trait BuildHistory: Send + Sync {
    /// Whether a successful build of `kind` for `commit` already ran on `worker`.
    async fn has_successful_build(
        &self,
        commit: &Commit,
        kind: TestKind,
        worker: &str,
    ) -> Result<bool>;
}
