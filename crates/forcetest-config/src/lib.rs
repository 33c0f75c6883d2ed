//! Configuration for forcetest.
//!
//! This crate handles:
//! - The immutable run configuration built once at startup
//! - Optional KDL settings files (forcetest.kdl)
//! - Commit enumeration mode selection

pub mod error;
pub mod run;
pub mod settings;

pub use error::{ConfigError, ConfigResult};
pub use run::{
    CommitMode, DEFAULT_BASELINE, DEFAULT_LIMIT, DEFAULT_SERVER_URL, DEFAULT_SOURCE_PATH,
    RunConfig, RunConfigBuilder,
};
pub use settings::{Settings, load_settings, parse_settings};
