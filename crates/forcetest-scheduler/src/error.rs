//! Scheduler client errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("login rejected with status {0}")]
    LoginRejected(u16),

    #[error("{url} returned status {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("scheduler rejected call: {0}")]
    Rpc(String),

    #[error("invalid scheduler URL: {0}")]
    InvalidUrl(String),
}

pub type SchedulerResult<T> = std::result::Result<T, SchedulerError>;

impl From<SchedulerError> for forcetest_core::Error {
    fn from(err: SchedulerError) -> Self {
        match err {
            SchedulerError::LoginRejected(_) => forcetest_core::Error::Unauthorized(err.to_string()),
            other => forcetest_core::Error::Scheduler(other.to_string()),
        }
    }
}
