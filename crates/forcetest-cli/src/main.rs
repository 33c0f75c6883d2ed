//! force-tests CLI tool.
//!
//! Queues performance test builds on a Buildbot master for commits on one or
//! more branches of a local PostgreSQL clone.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use forcetest_config::{CommitMode, RunConfig, RunConfigBuilder, Settings, load_settings};
use forcetest_core::{Secret, TestKind};
use forcetest_db::PgBuildHistory;
use forcetest_scheduler::{BuildbotClient, Dispatcher};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod output;

#[derive(Parser, Debug)]
#[command(name = "force-tests")]
#[command(about = "Queue up performance tests to run", long_about = None)]
#[command(after_help = "Run from within a PostgreSQL git clone, or point --repository at one.")]
struct Cli {
    /// Branch to queue up tests against (repeatable)
    #[arg(long = "branch", required = true)]
    branches: Vec<String>,

    /// Buildbot URL [default: http://147.75.56.225:8010]
    #[arg(long, env = "FORCETEST_SERVER_URL")]
    server_url: Option<String>,

    /// Do not actually submit build requests
    #[arg(long)]
    dry_run: bool,

    /// Limit the number of commits queued per branch, 0 for no limit [default: 20]
    #[arg(long)]
    limit: Option<u32>,

    /// Only queue tests that have no successful build yet
    #[arg(long)]
    only_missing: bool,

    /// Revision to start listing commits from
    #[arg(long)]
    revision: Option<String>,

    /// Test to run: dbt2, dbt3, dbt5, dbt7 (repeatable) [default: all]
    #[arg(long = "test")]
    tests: Vec<TestKind>,

    /// Buildbot login, also recorded as the build owner
    #[arg(long)]
    user: String,

    /// Print progress
    #[arg(long)]
    verbose: bool,

    /// Worker to queue tests on (repeatable) [default: all]
    #[arg(long = "worker")]
    workers: Vec<String>,

    /// How commits are listed: range (not on baseline) or linear (latest)
    #[arg(long)]
    mode: Option<CommitMode>,

    /// Baseline branch for range mode [default: master]
    #[arg(long)]
    baseline: Option<String>,

    /// Local clone to read history from [default: .]
    #[arg(long)]
    repository: Option<PathBuf>,

    /// Only commits touching this path are queued [default: src]
    #[arg(long)]
    source_path: Option<String>,

    /// Buildbot results database, used with --only-missing
    #[arg(long, env = "FORCETEST_DATABASE_URL")]
    database_url: Option<String>,

    /// KDL settings file
    #[arg(long, env = "FORCETEST_CONFIG")]
    config: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

impl Cli {
    fn into_config(self, settings: Settings, secret: Secret) -> Result<RunConfig> {
        RunConfigBuilder::new(self.user)
            .with_secret(secret)
            .with_branches(self.branches)
            .with_server_url(self.server_url)
            .with_limit(self.limit)
            .with_tests(self.tests)
            .with_workers(self.workers)
            .with_dry_run(self.dry_run)
            .with_verbose(self.verbose)
            .with_only_missing(self.only_missing)
            .with_revision(self.revision)
            .with_mode(self.mode)
            .with_baseline(self.baseline)
            .with_repository(self.repository)
            .with_source_path(self.source_path)
            .with_database_url(self.database_url)
            .with_settings(settings)
            .build()
            .context("Invalid configuration")
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => subscriber.init(),
        LogFormat::Json => subscriber.json().init(),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let settings = match &cli.config {
        Some(path) => load_settings(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?,
        None => Settings::default(),
    };

    let secret = rpassword::prompt_password("secret: ").context("Failed to read secret")?;
    let config = cli.into_config(settings, Secret::new(secret))?;

    if config.verbose {
        output::print_config(&config);
    }

    let scheduler = Arc::new(
        BuildbotClient::new(config.server_url.clone()).context("Failed to create HTTP client")?,
    );
    let source = forcetest_git::commit_source(&config);
    info!(mode = %config.mode, source = source.name(), "Using commit source");

    let mut dispatcher = Dispatcher::new(&config, scheduler, source);

    if config.only_missing {
        let database_url = config
            .database_url
            .as_deref()
            .context("--only-missing needs --database-url")?;
        let pool = forcetest_db::create_pool(database_url)
            .await
            .context("Failed to connect to results database")?;
        dispatcher = dispatcher.with_history(Arc::new(PgBuildHistory::new(pool)));
    }

    let verbose = config.verbose;
    let report = dispatcher
        .run(|event| {
            if verbose {
                output::print_event(event);
            }
        })
        .await?;

    if verbose {
        output::print_report(&report);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> std::result::Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("force-tests").chain(args.iter().copied()))
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_requires_branch_and_user() {
        assert!(parse(&["--user", "alice"]).is_err());
        assert!(parse(&["--branch", "master"]).is_err());
        assert!(parse(&["--branch", "master", "--user", "alice"]).is_ok());
    }

    #[test]
    fn test_repeatable_options() {
        let cli = parse(&[
            "--branch",
            "master",
            "--branch",
            "REL_16_STABLE",
            "--user",
            "alice",
            "--test",
            "dbt2",
            "--test",
            "dbt7",
            "--worker",
            "w1",
            "--limit",
            "0",
            "--dry-run",
            "--mode",
            "linear",
        ])
        .unwrap();

        assert_eq!(cli.branches, vec!["master", "REL_16_STABLE"]);
        assert_eq!(cli.tests, vec![TestKind::Dbt2, TestKind::Dbt7]);
        assert_eq!(cli.workers, vec!["w1"]);
        assert_eq!(cli.limit, Some(0));
        assert!(cli.dry_run);
        assert_eq!(cli.mode, Some(CommitMode::Linear));
    }

    #[test]
    fn test_unknown_test_kind_rejected() {
        assert!(parse(&["--branch", "master", "--user", "alice", "--test", "dbt4"]).is_err());
    }

    #[test]
    fn test_into_config_defaults() {
        let cli = parse(&["--branch", "master", "--user", "alice"]).unwrap();
        let config = cli
            .into_config(Settings::default(), Secret::new("pw"))
            .unwrap();

        assert_eq!(config.limit, 20);
        assert_eq!(config.tests, TestKind::ALL.to_vec());
        assert_eq!(config.user, "alice");
        assert_eq!(config.secret.expose(), "pw");
    }

    #[test]
    fn test_only_missing_without_database_fails() {
        let cli = parse(&["--branch", "master", "--user", "alice", "--only-missing"]).unwrap();
        if cli.database_url.is_some() {
            // FORCETEST_DATABASE_URL is set in this environment.
            return;
        }
        assert!(
            cli.into_config(Settings::default(), Secret::new("pw"))
                .is_err()
        );
    }
}
