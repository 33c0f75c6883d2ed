//! Thin wrapper around the `git` command line.

use chrono::DateTime;
use forcetest_core::{Commit, CommitQuery, CommitStream, CommitSummary};
use futures::{StreamExt, TryStreamExt};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout, Command};
use tracing::debug;

use crate::{GitError, GitResult};

/// Runs git commands inside one local clone.
#[derive(Debug, Clone)]
pub struct Git {
    repo: PathBuf,
}

impl Git {
    pub fn new(repo: impl AsRef<Path>) -> Self {
        Self {
            repo: repo.as_ref().to_path_buf(),
        }
    }

    pub fn repo(&self) -> &Path {
        &self.repo
    }

    fn command(&self, args: &[String]) -> Command {
        let mut command = Command::new("git");
        command.arg("-C").arg(&self.repo).args(args);
        command
    }

    /// Run a git command to completion and return its stdout.
    pub async fn run(&self, args: &[String]) -> GitResult<String> {
        debug!(repo = %self.repo.display(), args = ?args, "Running git");

        let output = self
            .command(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            return Err(GitError::CommandFailed {
                command: args.join(" "),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Run `git log` and stream the hashes it prints, one per line.
    ///
    /// The process is killed if the stream is dropped early. A non-zero exit
    /// is reported as the last item of the stream.
    pub fn stream_log(&self, args: Vec<String>) -> GitResult<CommitStream> {
        debug!(repo = %self.repo.display(), args = ?args, "Streaming git log");

        let mut child = self
            .command(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| GitError::UnexpectedOutput("git log stdout not captured".to_string()))?;

        let state = LogState {
            lines: BufReader::new(stdout).lines(),
            child,
            command: args.join(" "),
        };

        Ok(futures::stream::try_unfold(state, next_commit)
            .map_err(forcetest_core::Error::from)
            .boxed())
    }

    /// Subject line and author date of a commit.
    pub async fn describe(&self, commit: &Commit) -> GitResult<CommitSummary> {
        let output = self
            .run(&[
                "log".to_string(),
                "-1".to_string(),
                "--format=%s%n%aI".to_string(),
                commit.to_string(),
            ])
            .await?;

        parse_summary(&output)
    }

    pub async fn checkout(&self, branch: &str) -> GitResult<()> {
        self.run(&["checkout".to_string(), branch.to_string()])
            .await
            .map(|_| ())
    }

    pub async fn pull(&self) -> GitResult<()> {
        self.run(&["pull".to_string(), "--ff-only".to_string()])
            .await
            .map(|_| ())
    }
}

struct LogState {
    lines: Lines<BufReader<ChildStdout>>,
    child: Child,
    command: String,
}

async fn next_commit(mut state: LogState) -> GitResult<Option<(Commit, LogState)>> {
    while let Some(line) = state.lines.next_line().await? {
        if let Some(commit) = Commit::from_log_line(&line) {
            return Ok(Some((commit, state)));
        }
    }

    let mut stderr = String::new();
    if let Some(mut pipe) = state.child.stderr.take() {
        pipe.read_to_string(&mut stderr).await?;
    }

    let status = state.child.wait().await?;
    if !status.success() {
        return Err(GitError::CommandFailed {
            command: state.command,
            stderr: stderr.trim().to_string(),
        });
    }

    Ok(None)
}

/// Arguments for `git log` listing hashes that touch `source_path`.
///
/// `exclude` adds a `^<ref>` so only commits missing from that ref are listed.
pub fn log_args(query: &CommitQuery, exclude: Option<&str>, source_path: &str) -> Vec<String> {
    let mut args = vec!["log".to_string(), query.start().to_string()];

    if let Some(exclude) = exclude {
        args.push(format!("^{}", exclude));
    }

    args.push("--format=%H".to_string());

    if query.limit > 0 {
        args.push(format!("--max-count={}", query.limit));
    }

    args.push("--".to_string());
    args.push(source_path.to_string());
    args
}

fn parse_summary(output: &str) -> GitResult<CommitSummary> {
    let mut lines = output.lines();
    let subject = lines
        .next()
        .ok_or_else(|| GitError::UnexpectedOutput("empty commit description".to_string()))?
        .trim()
        .to_string();
    let date = lines
        .next()
        .and_then(|d| DateTime::parse_from_rfc3339(d.trim()).ok());

    Ok(CommitSummary { subject, date })
}
