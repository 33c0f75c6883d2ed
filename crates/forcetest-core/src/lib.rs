//! Core domain types and traits for queueing forced performance-test builds.
//!
//! This crate contains:
//! - Commit identifiers and the commit source trait
//! - Test kinds and their fixed parameter templates
//! - Force requests and the build scheduler trait
//! - The build history (dedup) trait
//! - Worker selection and secret handling

pub mod commit;
pub mod error;
pub mod history;
pub mod request;
pub mod secret;
pub mod test_kind;
pub mod worker;

pub use commit::{Commit, CommitQuery, CommitSource, CommitStream, CommitSummary};
pub use error::{Error, Result};
pub use history::BuildHistory;
pub use request::{BuildScheduler, ForceParams, ForceRequest, JsonRpcRequest};
pub use secret::Secret;
pub use test_kind::TestKind;
pub use worker::WorkerSelection;
