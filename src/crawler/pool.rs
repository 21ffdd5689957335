//! Month orchestrator and document worker pool
//!
//! A month pass discovers the month's documents, then hands each one to a
//! bounded pool of workers. A worker skips documents whose text file is
//! already on disk, otherwise extracts, writes the file and appends a ledger
//! row. The ledger is closed once every worker has finished, and a final
//! pass reports documents that are still missing.

use crate::config::Config;
use crate::crawler::extractor::DocumentExtractor;
use crate::crawler::fetcher::{Fetcher, HttpClient, ReqwestClient};
use crate::crawler::index::IndexWalker;
use crate::output::MonthReport;
use crate::state::DocumentOutcome;
use crate::storage::{write_document, Ledger, LedgerRow, OutputLayout};
use crate::url::{month_name, ArchiveUrls, DocumentRef};
use crate::MirrorError;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Shared state every worker of one month pass needs
struct MonthContext {
    year: i32,
    month: u32,
    total: usize,
    extractor: Arc<DocumentExtractor>,
    layout: OutputLayout,
    ledger: Arc<Ledger>,
}

/// Runs month passes
pub struct Orchestrator {
    walker: IndexWalker,
    extractor: Arc<DocumentExtractor>,
    layout: OutputLayout,
    workers: usize,
}

impl Orchestrator {
    /// Creates an orchestrator over the given HTTP capability
    pub fn new(config: &Config, client: Arc<dyn HttpClient>) -> Self {
        let fetcher = Arc::new(Fetcher::new(client, config.fetch.clone()));
        let urls = ArchiveUrls::new(config.source.base_url.clone());
        let delay = config.crawl.delay();

        Self {
            walker: IndexWalker::new(Arc::clone(&fetcher), urls, delay),
            extractor: Arc::new(DocumentExtractor::new(fetcher, delay)),
            layout: OutputLayout::new(config.output.output_dir.clone()),
            workers: config.crawl.worker_count().max(1),
        }
    }

    /// Creates an orchestrator backed by a reqwest client
    pub fn from_config(config: &Config) -> Result<Self, MirrorError> {
        let client = ReqwestClient::new(&config.source, &config.fetch)?;
        Ok(Self::new(config, Arc::new(client)))
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Mirrors one month
    ///
    /// Returns the month report; `report.saved` is the number of documents
    /// downloaded during this pass. Errors are limited to setting up the
    /// year directory and ledger; per-document failures only show up in the
    /// report.
    pub async fn run_month(
        &self,
        year: i32,
        month: u32,
        cancel: &CancellationToken,
    ) -> Result<MonthReport, MirrorError> {
        let name = month_name(month).unwrap_or("unknown");
        tracing::info!("Searching index pages for {} {}", name, year);

        let documents = self.walker.discover(year, month, cancel).await;
        if documents.is_empty() {
            tracing::info!("No documents found for {} {}", name, year);
            return Ok(MonthReport::empty(year, month));
        }

        tracing::info!(
            "Found {} documents for {} {}, processing with {} workers",
            documents.len(),
            name,
            year,
            self.workers
        );

        let year_dir = self.layout.ensure_year_dir(year).await?;
        let ledger = Arc::new(Ledger::open(&year_dir)?);

        let context = Arc::new(MonthContext {
            year,
            month,
            total: documents.len(),
            extractor: Arc::clone(&self.extractor),
            layout: self.layout.clone(),
            ledger: Arc::clone(&ledger),
        });
        let outcomes = self.dispatch(context, &documents, cancel).await;

        if let Err(e) = ledger.close() {
            tracing::error!("Failed to close ledger {}: {}", ledger.path().display(), e);
        }

        let missing = self.layout.missing(year, month, &documents);
        let report = MonthReport::from_outcomes(year, month, documents.len(), &outcomes, &missing);
        report.log_verification();

        tracing::info!(
            "{} {}: {} saved, {} skipped, {} empty",
            name,
            year,
            report.saved,
            report.skipped,
            report.empty
        );

        Ok(report)
    }

    /// Runs every document through the worker pool
    ///
    /// Documents not yet started when `cancel` fires are reported as
    /// cancelled; workers already running are allowed to finish.
    async fn dispatch(
        &self,
        context: Arc<MonthContext>,
        documents: &[DocumentRef],
        cancel: &CancellationToken,
    ) -> Vec<DocumentOutcome> {
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();
        let mut outcomes = Vec::with_capacity(documents.len());

        for (i, doc) in documents.iter().enumerate() {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                permit = Arc::clone(&semaphore).acquire_owned() => permit.ok(),
            };
            let Some(permit) = permit else {
                let remaining = documents.len() - i;
                tracing::warn!("Cancelled with {} documents not started", remaining);
                outcomes.extend(std::iter::repeat(DocumentOutcome::Cancelled).take(remaining));
                break;
            };

            let context = Arc::clone(&context);
            let doc = doc.clone();
            tasks.spawn(async move {
                let _permit = permit;
                process_document(&context, i + 1, doc).await
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    tracing::error!("Worker task failed: {}", e);
                    outcomes.push(DocumentOutcome::Empty);
                }
            }
        }

        outcomes
    }
}

/// Handles one document end to end
async fn process_document(
    context: &MonthContext,
    position: usize,
    doc: DocumentRef,
) -> DocumentOutcome {
    let total = context.total;
    let filename = OutputLayout::document_filename(context.year, context.month, &doc.serial);
    let path = context
        .layout
        .document_path(context.year, context.month, &doc.serial);

    if tokio::fs::try_exists(&path).await.unwrap_or(false) {
        tracing::info!("[{}/{}] Skipping {} (exists)", position, total, filename);
        return DocumentOutcome::Skipped;
    }

    let extracted = context.extractor.extract(&doc.url).await;
    if extracted.is_empty() {
        tracing::warn!("[{}/{}] Empty/failed {}", position, total, filename);
        return DocumentOutcome::Empty;
    }

    if let Err(e) = write_document(&path, &extracted.text).await {
        tracing::error!("[{}/{}] Failed to write {}: {}", position, total, filename, e);
        return DocumentOutcome::Empty;
    }

    let row = LedgerRow {
        serial_no: doc.serial.to_string(),
        title: extracted.metadata.title,
        date: extracted.metadata.date,
        filename: filename.clone(),
        url: doc.url,
    };
    if let Err(e) = context.ledger.append(&row) {
        tracing::error!("Error writing ledger row for {}: {}", filename, e);
    }

    tracing::info!("[{}/{}] Saved {}", position, total, filename);
    DocumentOutcome::Saved
}
