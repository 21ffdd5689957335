//! Per-month results and the post-run verification report

use crate::state::DocumentOutcome;
use crate::url::DocumentRef;

/// How many missing links are listed before the rest are summarized
const MISSING_PREVIEW: usize = 5;

/// What one month's pass achieved
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonthReport {
    pub year: i32,
    pub month: u32,

    /// Distinct documents listed in the month's index
    pub discovered: usize,

    pub saved: usize,
    pub skipped: usize,
    pub empty: usize,
    pub cancelled: usize,

    /// URLs still without a text file after the pass
    pub missing: Vec<String>,
}

impl MonthReport {
    /// Report for a month whose index listed nothing
    pub fn empty(year: i32, month: u32) -> Self {
        Self {
            year,
            month,
            ..Self::default()
        }
    }

    /// Tallies worker outcomes and attaches the verification result
    pub fn from_outcomes(
        year: i32,
        month: u32,
        discovered: usize,
        outcomes: &[DocumentOutcome],
        missing: &[&DocumentRef],
    ) -> Self {
        let count = |wanted: DocumentOutcome| outcomes.iter().filter(|o| **o == wanted).count();

        Self {
            year,
            month,
            discovered,
            saved: count(DocumentOutcome::Saved),
            skipped: count(DocumentOutcome::Skipped),
            empty: count(DocumentOutcome::Empty),
            cancelled: count(DocumentOutcome::Cancelled),
            missing: missing.iter().map(|doc| doc.url.clone()).collect(),
        }
    }

    /// Every discovered document has a text file on disk
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    /// Logs the verification result
    pub fn log_verification(&self) {
        if self.is_complete() {
            tracing::info!(
                "Verification successful: all {} documents for {}/{:02} present",
                self.discovered,
                self.year,
                self.month
            );
            return;
        }

        tracing::warn!(
            "{} files missing for {}/{:02} after scrape:",
            self.missing.len(),
            self.year,
            self.month
        );
        for url in self.missing.iter().take(MISSING_PREVIEW) {
            tracing::warn!("  - {}", url);
        }
        if self.missing.len() > MISSING_PREVIEW {
            tracing::warn!("  ... and {} more", self.missing.len() - MISSING_PREVIEW);
        }
    }
}
