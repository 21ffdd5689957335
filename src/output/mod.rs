//! Output module for run reporting
//!
//! This module handles:
//! - Per-month outcome tallies and the missing-file verification report
//! - Run-wide statistics and the final printed summary

mod report;
pub mod stats;

pub use report::MonthReport;
pub use stats::{print_summary, RunSummary};
