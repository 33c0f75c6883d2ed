//! Database error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type DbResult<T> = std::result::Result<T, DbError>;

impl From<DbError> for forcetest_core::Error {
    fn from(err: DbError) -> Self {
        forcetest_core::Error::History(err.to_string())
    }
}
