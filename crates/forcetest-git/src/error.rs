//! Git operation errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("git {command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("unexpected git output: {0}")]
    UnexpectedOutput(String),
}

pub type GitResult<T> = std::result::Result<T, GitError>;

impl From<GitError> for forcetest_core::Error {
    fn from(err: GitError) -> Self {
        forcetest_core::Error::Git(err.to_string())
    }
}
