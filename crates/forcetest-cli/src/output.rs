//! Verbose progress output.

use forcetest_config::RunConfig;
use forcetest_core::CommitSummary;
use forcetest_scheduler::{DispatchEvent, DispatchReport, Disposition};

pub fn print_config(config: &RunConfig) {
    for line in config_lines(config) {
        println!("{}", line);
    }
}

pub fn print_event(event: &DispatchEvent) {
    println!("{}", format_event(event));
}

pub fn print_report(report: &DispatchReport) {
    println!(
        "Done: {} commits, {} submitted ({} failed), {} already built, {} dry run",
        report.commits,
        report.submitted,
        report.failed,
        report.skipped_existing,
        report.skipped_dry_run
    );
}

fn config_lines(config: &RunConfig) -> Vec<String> {
    let tests: Vec<&str> = config.tests.iter().map(|t| t.as_str()).collect();
    let mut lines = vec![
        format!("Branches: {:?}", config.branches),
        format!("Limit: {}", config.limit),
        format!("Tests: {:?}", tests),
    ];
    if config.dry_run {
        lines.push("Dry run: no build requests will be submitted".to_string());
    }
    lines
}

fn format_event(event: &DispatchEvent) -> String {
    match event {
        DispatchEvent::WorkersResolved { workers } => format!("Workers: {:?}", workers),
        DispatchEvent::BranchStarted { branch } => format!("queueing for branch {}", branch),
        DispatchEvent::CommitQueued {
            index,
            commit,
            summary,
        } => match summary {
            Some(CommitSummary {
                subject,
                date: Some(date),
            }) => format!(
                "{}: queueing commit {} {} {}",
                index,
                commit,
                date.format("%Y-%m-%d %H:%M"),
                subject
            ),
            Some(CommitSummary { subject, date: None }) => {
                format!("{}: queueing commit {} {}", index, commit, subject)
            }
            None => format!("{}: queueing commit {}", index, commit),
        },
        DispatchEvent::Request {
            kind,
            worker,
            disposition,
            ..
        } => format!(
            "  {} {}",
            kind.scheduler_name(worker),
            describe(*disposition)
        ),
    }
}

fn describe(disposition: Disposition) -> &'static str {
    match disposition {
        Disposition::SkippedExisting => "skipped (already built)",
        Disposition::SkippedDryRun => "skipped (dry run)",
        Disposition::Submitted => "submitted",
    }
}
