//! Request dispatcher - walks branches, commits, test kinds and workers in
//! order and submits one force request per tuple.

use forcetest_config::RunConfig;
use forcetest_core::{
    BuildHistory, BuildScheduler, Commit, CommitSource, CommitSummary, ForceRequest, Result,
    TestKind, WorkerSelection,
};
use futures::TryStreamExt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What happened to one (commit, test kind, worker) tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// A successful build is already on record.
    SkippedExisting,
    /// Dry run; nothing was posted.
    SkippedDryRun,
    /// Posted to the scheduler. The call may still have failed.
    Submitted,
}

/// Progress reported while dispatching.
#[derive(Debug, Clone)]
pub enum DispatchEvent {
    WorkersResolved {
        workers: Vec<String>,
    },
    BranchStarted {
        branch: String,
    },
    CommitQueued {
        /// 1-based position within the branch.
        index: usize,
        commit: Commit,
        /// Only looked up for verbose runs.
        summary: Option<CommitSummary>,
    },
    Request {
        branch: String,
        commit: Commit,
        kind: TestKind,
        worker: String,
        disposition: Disposition,
    },
}

/// Totals for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub commits: usize,
    pub submitted: usize,
    pub skipped_existing: usize,
    pub skipped_dry_run: usize,
    /// Submissions whose call returned an error.
    pub failed: usize,
}

/// Drives a whole run against the scheduler.
pub struct Dispatcher<'a> {
    config: &'a RunConfig,
    scheduler: Arc<dyn BuildScheduler>,
    source: Arc<dyn CommitSource>,
    history: Option<Arc<dyn BuildHistory>>,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        config: &'a RunConfig,
        scheduler: Arc<dyn BuildScheduler>,
        source: Arc<dyn CommitSource>,
    ) -> Self {
        Self {
            config,
            scheduler,
            source,
            history: None,
        }
    }

    /// Consult `history` before each submission when `only_missing` is set.
    pub fn with_history(mut self, history: Arc<dyn BuildHistory>) -> Self {
        self.history = Some(history);
        self
    }

    /// Log in, resolve workers, then dispatch every branch in order.
    pub async fn run<F>(&self, mut on_event: F) -> Result<DispatchReport>
    where
        F: FnMut(&DispatchEvent),
    {
        self.scheduler
            .login(&self.config.user, &self.config.secret)
            .await?;

        let workers = self.resolve_workers().await?;
        on_event(&DispatchEvent::WorkersResolved {
            workers: workers.clone(),
        });

        let mut report = DispatchReport::default();
        for branch in &self.config.branches {
            self.dispatch_branch(branch, &workers, &mut report, &mut on_event)
                .await?;
        }

        info!(
            commits = report.commits,
            submitted = report.submitted,
            skipped_existing = report.skipped_existing,
            skipped_dry_run = report.skipped_dry_run,
            failed = report.failed,
            "Dispatch finished"
        );

        Ok(report)
    }

    /// Explicit workers as given, otherwise everything the scheduler knows.
    pub async fn resolve_workers(&self) -> Result<Vec<String>> {
        match &self.config.workers {
            WorkerSelection::Named(names) => Ok(names.clone()),
            WorkerSelection::All => {
                let workers = self.scheduler.list_workers().await?;
                if workers.is_empty() {
                    warn!("Scheduler reported no workers; nothing will be queued");
                }
                Ok(workers)
            }
        }
    }

    async fn dispatch_branch<F>(
        &self,
        branch: &str,
        workers: &[String],
        report: &mut DispatchReport,
        on_event: &mut F,
    ) -> Result<()>
    where
        F: FnMut(&DispatchEvent),
    {
        on_event(&DispatchEvent::BranchStarted {
            branch: branch.to_string(),
        });

        let query = self.config.commit_query(branch);
        let cap = query.cap();
        let mut commits = self.source.commits(&query).await?;
        let mut index = 0;

        loop {
            if cap.is_some_and(|cap| index >= cap) {
                debug!(branch = %branch, limit = self.config.limit, "Limit reached");
                break;
            }
            let Some(commit) = commits.try_next().await? else {
                break;
            };
            index += 1;
            report.commits += 1;

            let summary = if self.config.verbose {
                self.describe(&commit).await
            } else {
                None
            };
            on_event(&DispatchEvent::CommitQueued {
                index,
                commit: commit.clone(),
                summary,
            });

            self.dispatch_commit(branch, &commit, workers, report, on_event)
                .await;
        }

        Ok(())
    }

    async fn dispatch_commit<F>(
        &self,
        branch: &str,
        commit: &Commit,
        workers: &[String],
        report: &mut DispatchReport,
        on_event: &mut F,
    ) where
        F: FnMut(&DispatchEvent),
    {
        for &kind in &self.config.tests {
            for worker in workers {
                let disposition = self.dispatch_one(branch, commit, kind, worker, report).await;
                on_event(&DispatchEvent::Request {
                    branch: branch.to_string(),
                    commit: commit.clone(),
                    kind,
                    worker: worker.clone(),
                    disposition,
                });
            }
        }
    }

    async fn dispatch_one(
        &self,
        branch: &str,
        commit: &Commit,
        kind: TestKind,
        worker: &str,
        report: &mut DispatchReport,
    ) -> Disposition {
        if self.already_built(commit, kind, worker).await {
            debug!(commit = %commit, kind = %kind, worker = %worker, "Already built, skipping");
            report.skipped_existing += 1;
            return Disposition::SkippedExisting;
        }

        let request = ForceRequest::new(kind, worker, commit, branch, &self.config.user);

        if self.config.dry_run {
            debug!(scheduler = %request.scheduler_name(), commit = %commit, "Dry run, not submitting");
            report.skipped_dry_run += 1;
            return Disposition::SkippedDryRun;
        }

        match self.scheduler.force(&request).await {
            Ok(()) => {
                info!(
                    scheduler = %request.scheduler_name(),
                    branch = %branch,
                    commit = %commit,
                    "Queued build"
                );
            }
            Err(e) => {
                warn!(
                    scheduler = %request.scheduler_name(),
                    commit = %commit,
                    error = %e,
                    "Force request failed, continuing"
                );
                report.failed += 1;
            }
        }
        report.submitted += 1;
        Disposition::Submitted
    }

    /// A lookup failure counts as "not built" so the build is queued anyway.
    async fn already_built(&self, commit: &Commit, kind: TestKind, worker: &str) -> bool {
        let Some(history) = self.history.as_ref().filter(|_| self.config.only_missing) else {
            return false;
        };

        match history.has_successful_build(commit, kind, worker).await {
            Ok(found) => found,
            Err(e) => {
                warn!(
                    commit = %commit,
                    kind = %kind,
                    worker = %worker,
                    error = %e,
                    "Build history lookup failed, queueing anyway"
                );
                false
            }
        }
    }

    async fn describe(&self, commit: &Commit) -> Option<CommitSummary> {
        match self.source.describe(commit).await {
            Ok(summary) => Some(summary),
            Err(e) => {
                warn!(commit = %commit, error = %e, "Could not describe commit");
                None
            }
        }
    }
}
