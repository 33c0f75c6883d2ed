//! The run configuration.
//!
//! Built once at startup from command-line values layered over an optional
//! settings file, then passed by reference to every stage. Nothing mutates it
//! after [`RunConfigBuilder::build`].

use crate::{ConfigError, ConfigResult, Settings};
use forcetest_core::{CommitQuery, Secret, TestKind, WorkerSelection};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use url::Url;

pub const DEFAULT_SERVER_URL: &str = "http://147.75.56.225:8010";
pub const DEFAULT_LIMIT: u32 = 20;
pub const DEFAULT_BASELINE: &str = "master";
pub const DEFAULT_SOURCE_PATH: &str = "src";

/// How commits are enumerated for a branch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitMode {
    /// Commits on the branch that are not on the baseline branch.
    #[default]
    Range,
    /// The most recent commits on the branch after pulling it.
    Linear,
}

impl fmt::Display for CommitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitMode::Range => f.write_str("range"),
            CommitMode::Linear => f.write_str("linear"),
        }
    }
}

impl FromStr for CommitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "range" => Ok(CommitMode::Range),
            "linear" => Ok(CommitMode::Linear),
            other => Err(format!(
                "unknown mode '{}' (expected range or linear)",
                other
            )),
        }
    }
}

/// Everything a run needs to know.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Branches to queue builds for, each processed independently.
    pub branches: Vec<String>,
    /// Scheduler base URL.
    pub server_url: Url,
    /// Login name, also recorded as the build owner.
    pub user: String,
    pub secret: Secret,
    /// Commits per branch; 0 means no limit.
    pub limit: u32,
    /// Enabled test kinds, in dispatch order.
    pub tests: Vec<TestKind>,
    pub workers: WorkerSelection,
    pub dry_run: bool,
    pub verbose: bool,
    /// Skip tuples that already have a successful build.
    pub only_missing: bool,
    /// Start enumeration here instead of at the branch tip.
    pub revision: Option<String>,
    pub mode: CommitMode,
    /// Range-mode baseline branch.
    pub baseline: String,
    /// Local clone to read history from.
    pub repository: PathBuf,
    /// Subtree commits must touch.
    pub source_path: String,
    /// Results database, required when `only_missing` is set.
    pub database_url: Option<String>,
}

impl RunConfig {
    /// The enumeration query for one branch.
    pub fn commit_query(&self, branch: &str) -> CommitQuery {
        CommitQuery::new(branch)
            .with_revision(self.revision.clone())
            .with_limit(self.limit)
    }
}

/// Builder for [`RunConfig`].
///
/// Unset values fall back to the settings file, then to built-in defaults.
#[derive(Debug, Default)]
pub struct RunConfigBuilder {
    branches: Vec<String>,
    user: String,
    secret: Option<Secret>,
    server_url: Option<String>,
    limit: Option<u32>,
    tests: Vec<TestKind>,
    workers: Vec<String>,
    dry_run: bool,
    verbose: bool,
    only_missing: bool,
    revision: Option<String>,
    mode: Option<CommitMode>,
    baseline: Option<String>,
    repository: Option<PathBuf>,
    source_path: Option<String>,
    database_url: Option<String>,
    settings: Settings,
}

impl RunConfigBuilder {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            ..Default::default()
        }
    }

    pub fn with_branches(mut self, branches: Vec<String>) -> Self {
        self.branches = branches;
        self
    }

    pub fn with_secret(mut self, secret: Secret) -> Self {
        self.secret = Some(secret);
        self
    }

    pub fn with_server_url(mut self, url: Option<String>) -> Self {
        self.server_url = url;
        self
    }

    pub fn with_limit(mut self, limit: Option<u32>) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_tests(mut self, tests: Vec<TestKind>) -> Self {
        self.tests = tests;
        self
    }

    pub fn with_workers(mut self, workers: Vec<String>) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_only_missing(mut self, only_missing: bool) -> Self {
        self.only_missing = only_missing;
        self
    }

    pub fn with_revision(mut self, revision: Option<String>) -> Self {
        self.revision = revision;
        self
    }

    pub fn with_mode(mut self, mode: Option<CommitMode>) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_baseline(mut self, baseline: Option<String>) -> Self {
        self.baseline = baseline;
        self
    }

    pub fn with_repository(mut self, repository: Option<PathBuf>) -> Self {
        self.repository = repository;
        self
    }

    pub fn with_source_path(mut self, source_path: Option<String>) -> Self {
        self.source_path = source_path;
        self
    }

    pub fn with_database_url(mut self, database_url: Option<String>) -> Self {
        self.database_url = database_url;
        self
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Resolve and validate the configuration.
    pub fn build(self) -> ConfigResult<RunConfig> {
        let Self {
            branches,
            user,
            secret,
            server_url,
            limit,
            tests,
            workers,
            dry_run,
            verbose,
            only_missing,
            revision,
            mode,
            baseline,
            repository,
            source_path,
            database_url,
            settings,
        } = self;

        let branches = dedup(branches);
        if branches.is_empty() {
            return Err(ConfigError::MissingField("branch".to_string()));
        }

        if user.trim().is_empty() {
            return Err(ConfigError::MissingField("user".to_string()));
        }

        let server = server_url
            .or(settings.server)
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
        let server_url = parse_server_url(&server)?;

        let tests = if tests.is_empty() { settings.tests } else { tests };
        let tests = if tests.is_empty() {
            TestKind::ALL.to_vec()
        } else {
            TestKind::ALL
                .into_iter()
                .filter(|kind| tests.contains(kind))
                .collect()
        };

        let workers = if workers.is_empty() {
            settings.workers
        } else {
            workers
        };

        let database_url = database_url.or(settings.database);
        if only_missing && database_url.is_none() {
            return Err(ConfigError::MissingField(
                "database url (required with only-missing)".to_string(),
            ));
        }

        Ok(RunConfig {
            branches,
            server_url,
            user,
            secret: secret.unwrap_or_else(|| Secret::new("")),
            limit: limit.or(settings.limit).unwrap_or(DEFAULT_LIMIT),
            tests,
            workers: WorkerSelection::from_names(dedup(workers)),
            dry_run,
            verbose,
            only_missing,
            revision,
            mode: mode.or(settings.mode).unwrap_or_default(),
            baseline: baseline
                .or(settings.baseline)
                .unwrap_or_else(|| DEFAULT_BASELINE.to_string()),
            repository: repository
                .or(settings.repository)
                .unwrap_or_else(|| PathBuf::from(".")),
            source_path: source_path
                .or(settings.source_path)
                .unwrap_or_else(|| DEFAULT_SOURCE_PATH.to_string()),
            database_url,
        })
    }
}

fn parse_server_url(server: &str) -> ConfigResult<Url> {
    let url = Url::parse(server).map_err(|e| ConfigError::InvalidValue {
        field: "server-url".to_string(),
        message: format!("{}: {}", server, e),
    })?;

    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(ConfigError::InvalidValue {
            field: "server-url".to_string(),
            message: format!("{} is not an http(s) base URL", server),
        });
    }

    Ok(url)
}

/// Drop repeated names, keeping first-seen order.
fn dedup(names: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(names.len());
    for name in names {
        if !seen.contains(&name) {
            seen.push(name);
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> RunConfigBuilder {
        RunConfigBuilder::new("alice")
            .with_secret(Secret::new("pw"))
            .with_branches(vec!["release/16".to_string()])
    }

    #[test]
    fn test_defaults() {
        let config = builder().build().unwrap();
        assert_eq!(config.server_url.as_str(), "http://147.75.56.225:8010/");
        assert_eq!(config.limit, 20);
        assert_eq!(config.tests, TestKind::ALL.to_vec());
        assert_eq!(config.workers, WorkerSelection::All);
        assert_eq!(config.mode, CommitMode::Range);
        assert_eq!(config.baseline, "master");
        assert_eq!(config.source_path, "src");
        assert_eq!(config.repository, PathBuf::from("."));
        assert!(!config.dry_run);
        assert!(!config.only_missing);
    }

    #[test]
    fn test_missing_branch() {
        let result = RunConfigBuilder::new("alice").build();
        assert!(matches!(result, Err(ConfigError::MissingField(f)) if f == "branch"));
    }

    #[test]
    fn test_missing_user() {
        let result = RunConfigBuilder::new(" ")
            .with_branches(vec!["master".to_string()])
            .build();
        assert!(matches!(result, Err(ConfigError::MissingField(f)) if f == "user"));
    }

    #[test]
    fn test_tests_are_put_in_dispatch_order() {
        let config = builder()
            .with_tests(vec![TestKind::Dbt7, TestKind::Dbt2, TestKind::Dbt7])
            .build()
            .unwrap();
        assert_eq!(config.tests, vec![TestKind::Dbt2, TestKind::Dbt7]);
    }

    #[test]
    fn test_duplicate_branches_and_workers_collapse() {
        let config = builder()
            .with_branches(vec![
                "b".to_string(),
                "a".to_string(),
                "b".to_string(),
            ])
            .with_workers(vec!["w2".to_string(), "w1".to_string(), "w2".to_string()])
            .build()
            .unwrap();
        assert_eq!(config.branches, vec!["b", "a"]);
        assert_eq!(
            config.workers,
            WorkerSelection::Named(vec!["w2".to_string(), "w1".to_string()])
        );
    }

    #[test]
    fn test_only_missing_requires_database() {
        let result = builder().with_only_missing(true).build();
        assert!(matches!(result, Err(ConfigError::MissingField(_))));

        let config = builder()
            .with_only_missing(true)
            .with_database_url(Some("postgres://localhost/buildbot".to_string()))
            .build()
            .unwrap();
        assert!(config.only_missing);
    }

    #[test]
    fn test_invalid_server_url() {
        let result = builder()
            .with_server_url(Some("not a url".to_string()))
            .build();
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));

        let result = builder()
            .with_server_url(Some("ftp://example.org".to_string()))
            .build();
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_settings_fill_unset_values() {
        let settings = Settings {
            server: Some("http://bb.example.org:8010".to_string()),
            mode: Some(CommitMode::Linear),
            limit: Some(3),
            workers: vec!["w9".to_string()],
            tests: vec![TestKind::Dbt5],
            database: Some("postgres://db/buildbot".to_string()),
            ..Default::default()
        };

        let config = builder()
            .with_only_missing(true)
            .with_settings(settings)
            .build()
            .unwrap();
        assert_eq!(config.server_url.host_str(), Some("bb.example.org"));
        assert_eq!(config.mode, CommitMode::Linear);
        assert_eq!(config.limit, 3);
        assert_eq!(config.tests, vec![TestKind::Dbt5]);
        assert_eq!(
            config.workers,
            WorkerSelection::Named(vec!["w9".to_string()])
        );
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://db/buildbot")
        );
    }

    #[test]
    fn test_flags_override_settings() {
        let settings = Settings {
            limit: Some(3),
            mode: Some(CommitMode::Linear),
            workers: vec!["w9".to_string()],
            ..Default::default()
        };

        let config = builder()
            .with_limit(Some(0))
            .with_mode(Some(CommitMode::Range))
            .with_workers(vec!["w1".to_string()])
            .with_settings(settings)
            .build()
            .unwrap();
        assert_eq!(config.limit, 0);
        assert_eq!(config.mode, CommitMode::Range);
        assert_eq!(
            config.workers,
            WorkerSelection::Named(vec!["w1".to_string()])
        );
    }

    #[test]
    fn test_commit_query() {
        let config = builder()
            .with_limit(Some(2))
            .with_revision(Some("abc".to_string()))
            .build()
            .unwrap();
        let query = config.commit_query("release/16");
        assert_eq!(query.branch, "release/16");
        assert_eq!(query.start(), "abc");
        assert_eq!(query.limit, 2);
    }

    #[test]
    fn test_secret_not_in_debug() {
        let config = builder().build().unwrap();
        let debug = format!("{:?}", config);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("\"pw\""));
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("linear".parse::<CommitMode>().unwrap(), CommitMode::Linear);
        assert!("other".parse::<CommitMode>().is_err());
    }
}
