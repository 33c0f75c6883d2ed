//! Build scheduling for forcetest.
//!
//! Talks to a Buildbot master over its REST and JSON-RPC API and drives the
//! per-branch, per-commit, per-test, per-worker dispatch loop.

pub mod client;
pub mod dispatch;
pub mod error;

pub use client::BuildbotClient;
pub use dispatch::{DispatchEvent, DispatchReport, Dispatcher, Disposition};
pub use error::{SchedulerError, SchedulerResult};
