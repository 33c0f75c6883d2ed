//! Successful-build lookups.

use async_trait::async_trait;
use forcetest_core::{BuildHistory, Commit, Result, TestKind};
use sqlx::PgPool;
use tracing::debug;

use crate::DbResult;

/// Buildbot result code for a successful build.
const SUCCESS: i32 = 0;

/// Matches a successful build of a builder family on a worker whose requested
/// or checked-out revision is the commit. Property values are stored as JSON
/// `[value, source]` pairs.
const SUCCESSFUL_BUILD_QUERY: &str = r#"
    SELECT EXISTS (
        SELECT 1
        FROM builds b
        JOIN builders bldr ON bldr.id = b.builderid
        JOIN workers w ON w.id = b.workerid
        JOIN build_properties bp ON bp.buildid = b.id
        WHERE b.results = $1
          AND w.name = $2
          AND (bldr.name = $3 OR bldr.name LIKE $4)
          AND bp.name IN ('revision', 'got_revision')
          AND (bp.value::jsonb ->> 0) = $5
    )
"#;

/// Builder names that count as a run of `kind`: the bare kind or any
/// `<kind>-` prefixed builder.
pub fn builder_patterns(kind: TestKind) -> (String, String) {
    (kind.as_str().to_string(), format!("{}-%", kind.as_str()))
}

/// PostgreSQL implementation of BuildHistory.
pub struct PgBuildHistory {
    pool: PgPool,
}

impl PgBuildHistory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn lookup(&self, commit: &Commit, kind: TestKind, worker: &str) -> DbResult<bool> {
        let (exact, family) = builder_patterns(kind);
        let found = sqlx::query_scalar::<_, bool>(SUCCESSFUL_BUILD_QUERY)
            .bind(SUCCESS)
            .bind(worker)
            .bind(exact)
            .bind(family)
            .bind(commit.as_str())
            .fetch_one(&self.pool)
            .await?;

        debug!(commit = %commit, kind = %kind, worker = %worker, found, "Checked build history");
        Ok(found)
    }
}

#[async_trait]
impl BuildHistory for PgBuildHistory {
    async fn has_successful_build(
        &self,
        commit: &Commit,
        kind: TestKind,
        worker: &str,
    ) -> Result<bool> {
        Ok(self.lookup(commit, kind, worker).await?)
    }
}
