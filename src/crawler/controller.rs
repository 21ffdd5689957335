//! Run controller: sweeps a span of years and months
//!
//! Each (year, month) pass runs in its own task so that an error or panic in
//! one month is logged and counted without stopping the sweep. Cancellation
//! is checked before every month; a month already in progress finishes.

use crate::crawler::pool::Orchestrator;
use crate::output::RunSummary;
use crate::MirrorError;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Every month of the year, in calendar order
pub const ALL_MONTHS: [u32; 12] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12];

/// Direction of the year sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearOrder {
    Ascending,
    Descending,
}

/// Inclusive range of years and the order to visit them in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearSpan {
    low: i32,
    high: i32,
    order: YearOrder,
}

impl YearSpan {
    /// Span covering both bounds, visited in `order`
    pub fn new(a: i32, b: i32, order: YearOrder) -> Self {
        Self {
            low: a.min(b),
            high: a.max(b),
            order,
        }
    }

    /// Span from `start` to `end`; descending when `start` is the later year
    pub fn between(start: i32, end: i32) -> Self {
        let order = if start > end {
            YearOrder::Descending
        } else {
            YearOrder::Ascending
        };
        Self::new(start, end, order)
    }

    pub fn order(&self) -> YearOrder {
        self.order
    }

    /// Years in visiting order
    pub fn years(&self) -> Vec<i32> {
        let years = self.low..=self.high;
        match self.order {
            YearOrder::Ascending => years.collect(),
            YearOrder::Descending => years.rev().collect(),
        }
    }
}

/// Drives month passes across a span of years
pub struct Controller {
    orchestrator: Arc<Orchestrator>,
}

impl Controller {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
        }
    }

    /// Processes every month of `months` (all twelve when empty) for every
    /// year of `span`
    pub async fn run(
        &self,
        span: YearSpan,
        months: &[u32],
        cancel: &CancellationToken,
    ) -> RunSummary {
        let months = if months.is_empty() {
            &ALL_MONTHS[..]
        } else {
            months
        };
        let mut summary = RunSummary::start();

        'years: for year in span.years() {
            tracing::info!("Year {}", year);

            for &month in months {
                if cancel.is_cancelled() {
                    tracing::warn!("Run interrupted before {}/{:02}", year, month);
                    summary.cancelled = true;
                    break 'years;
                }

                match self.run_isolated(year, month, cancel).await {
                    Ok(report) => summary.record(&report),
                    Err(e) => {
                        tracing::error!("Error in {}/{:02}: {}", year, month, e);
                        summary.record_failure(year, month);
                    }
                }
            }
        }

        summary.finish()
    }

    /// Runs one month in its own task so a panic is reported as an error
    async fn run_isolated(
        &self,
        year: i32,
        month: u32,
        cancel: &CancellationToken,
    ) -> Result<crate::output::MonthReport, MirrorError> {
        let orchestrator = Arc::clone(&self.orchestrator);
        let cancel = cancel.clone();
        tokio::spawn(async move { orchestrator.run_month(year, month, &cancel).await }).await?
    }
}
