//! Settings file parsing.
//!
//! A settings file supplies site defaults so operators don't repeat them on
//! every invocation:
//!
//! ```kdl
//! server "http://buildbot.example.org:8010"
//! repository "/srv/postgres"
//! source-path "src"
//! baseline "master"
//! mode "range"
//! database "postgres://buildbot@db/buildbot"
//! limit 20
//! workers "w1" "w2"
//! tests "dbt2" "dbt3"
//! ```
//!
//! Command-line flags take precedence over anything set here.

use crate::{CommitMode, ConfigError, ConfigResult};
use forcetest_core::TestKind;
use kdl::{KdlDocument, KdlNode};
use std::path::{Path, PathBuf};

/// Values read from a settings file. Unset nodes stay `None`/empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub server: Option<String>,
    pub repository: Option<PathBuf>,
    pub source_path: Option<String>,
    pub baseline: Option<String>,
    pub mode: Option<CommitMode>,
    pub database: Option<String>,
    pub limit: Option<u32>,
    pub workers: Vec<String>,
    pub tests: Vec<TestKind>,
}

/// Read and parse a settings file.
pub fn load_settings(path: &Path) -> ConfigResult<Settings> {
    let content = std::fs::read_to_string(path)?;
    parse_settings(&content)
}

/// Parse settings from KDL text.
pub fn parse_settings(kdl: &str) -> ConfigResult<Settings> {
    let doc: KdlDocument = kdl.parse()?;
    let mut settings = Settings::default();

    for node in doc.nodes() {
        match node.name().value() {
            "server" => settings.server = Some(require_string(node)?),
            "repository" => settings.repository = Some(PathBuf::from(require_string(node)?)),
            "source-path" => settings.source_path = Some(require_string(node)?),
            "baseline" => settings.baseline = Some(require_string(node)?),
            "database" => settings.database = Some(require_string(node)?),
            "mode" => {
                let mode = require_string(node)?;
                settings.mode = Some(mode.parse().map_err(|message| ConfigError::InvalidValue {
                    field: "mode".to_string(),
                    message,
                })?);
            }
            "limit" => {
                let limit = node
                    .entries()
                    .iter()
                    .find(|e| e.name().is_none())
                    .and_then(|e| e.value().as_integer())
                    .ok_or_else(|| ConfigError::MissingField("limit value".to_string()))?;
                settings.limit =
                    Some(u32::try_from(limit).map_err(|_| ConfigError::InvalidValue {
                        field: "limit".to_string(),
                        message: format!("{} is out of range", limit),
                    })?);
            }
            "workers" => settings.workers = get_all_string_args(node),
            "tests" => {
                settings.tests = get_all_string_args(node)
                    .iter()
                    .map(|name| {
                        name.parse::<TestKind>()
                            .map_err(|e| ConfigError::InvalidValue {
                                field: "tests".to_string(),
                                message: e.to_string(),
                            })
                    })
                    .collect::<ConfigResult<_>>()?;
            }
            _ => {} // Ignore unknown nodes
        }
    }

    Ok(settings)
}

fn require_string(node: &KdlNode) -> ConfigResult<String> {
    get_first_string_arg(node)
        .ok_or_else(|| ConfigError::MissingField(format!("{} value", node.name().value())))
}

fn get_first_string_arg(node: &KdlNode) -> Option<String> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_string())
        .map(|s| s.to_string())
}

fn get_all_string_args(node: &KdlNode) -> Vec<String> {
    node.entries()
        .iter()
        .filter(|e| e.name().is_none())
        .filter_map(|e| e.value().as_string())
        .map(|s| s.to_string())
        .collect()
}
