//! Error types for forcetest.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("git error: {0}")]
    Git(String),

    #[error("build history lookup failed: {0}")]
    History(String),

    #[error("scheduler error: {0}")]
    Scheduler(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
