//! Build history lookups for forcetest.
//!
//! Reads the scheduler's own PostgreSQL results database to find builds that
//! already succeeded, so they are not queued again.

pub mod error;
pub mod history;

pub use error::{DbError, DbResult};
pub use history::PgBuildHistory;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Create a connection pool for the results database.
///
/// Lookups run one at a time, so a single connection is enough.
pub async fn create_pool(database_url: &str) -> DbResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(database_url)
        .await?;
    Ok(pool)
}
