//! Run-level statistics
//!
//! This module accumulates month reports into a summary of the whole run
//! and prints it once the run ends.

use crate::output::MonthReport;
use chrono::{DateTime, Utc};

/// Summary of one invocation over a span of years and months
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    /// Month passes that ran to completion
    pub months_completed: usize,

    /// Month passes that raised an error, as (year, month)
    pub months_failed: Vec<(i32, u32)>,

    pub documents_discovered: usize,
    pub documents_saved: usize,
    pub documents_skipped: usize,
    pub documents_missing: usize,

    /// The run stopped early on operator request
    pub cancelled: bool,
}

impl RunSummary {
    pub fn start() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            months_completed: 0,
            months_failed: Vec::new(),
            documents_discovered: 0,
            documents_saved: 0,
            documents_skipped: 0,
            documents_missing: 0,
            cancelled: false,
        }
    }

    pub fn record(&mut self, report: &MonthReport) {
        self.months_completed += 1;
        self.documents_discovered += report.discovered;
        self.documents_saved += report.saved;
        self.documents_skipped += report.skipped;
        self.documents_missing += report.missing.len();
    }

    pub fn record_failure(&mut self, year: i32, month: u32) {
        self.months_failed.push((year, month));
    }

    pub fn finish(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        self
    }

    /// Wall-clock length of the run, if it has finished
    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }
}

/// Prints the run summary to stdout in a formatted manner
pub fn print_summary(summary: &RunSummary) {
    println!("=== Mirror Run Summary ===\n");

    println!("Started: {}", summary.started_at.to_rfc3339());
    if let Some(finished) = summary.finished_at {
        println!("Finished: {}", finished.to_rfc3339());
    }
    if let Some(seconds) = summary.duration_seconds() {
        println!("Duration: {}s", seconds);
    }
    println!();

    println!("Months:");
    println!("  Completed: {}", summary.months_completed);
    println!("  Failed: {}", summary.months_failed.len());
    for (year, month) in &summary.months_failed {
        println!("    - {}/{:02}", year, month);
    }
    println!();

    println!("Documents:");
    println!("  Discovered: {}", summary.documents_discovered);
    println!("  Downloaded this run: {}", summary.documents_saved);
    println!("  Already present: {}", summary.documents_skipped);
    println!("  Still missing: {}", summary.documents_missing);

    if summary.cancelled {
        println!("\nRun was interrupted before all months were processed.");
    }
}
