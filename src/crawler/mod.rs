//! Crawler module for mirroring the archive
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry and throttle detection
//! - HTML parsing of index listings and document pages
//! - Month index discovery
//! - Multi-page document extraction
//! - The per-month worker pool and the year/month run controller

mod controller;
mod extractor;
mod fetcher;
mod index;
mod parser;
mod pool;

#[cfg(test)]
pub(crate) mod testing;

pub use controller::{Controller, YearOrder, YearSpan, ALL_MONTHS};
pub use extractor::{DocumentExtractor, ExtractedDocument, Stitch, StitchState};
pub use fetcher::{
    build_http_client, FetchError, Fetcher, HttpClient, HttpResponse, ReqwestClient,
    TransportError,
};
pub use index::{DiscoveryState, IndexWalker};
pub use parser::{
    parse_document_page, parse_index_page, parse_title_metadata, DocumentMetadata, DocumentPage,
    IndexPage, PageContent, END_OF_LISTING, UNKNOWN,
};
pub use pool::Orchestrator;

use crate::config::Config;
use crate::output::RunSummary;
use crate::MirrorError;
use tokio_util::sync::CancellationToken;

/// Runs a complete mirror operation
///
/// This is the main entry point for a run. It will:
/// 1. Build the HTTP client from the configuration
/// 2. Visit every requested month of every year in `span`
/// 3. Return the accumulated run summary
///
/// # Arguments
///
/// * `config` - The mirror configuration
/// * `span` - Years to visit and their order
/// * `months` - Months to visit each year; empty means all twelve
/// * `cancel` - Stops the run before the next month once triggered
///
/// # Returns
///
/// * `Ok(RunSummary)` - The run finished or was cancelled
/// * `Err(MirrorError)` - The HTTP client could not be built
///
/// # Example
///
/// ```no_run
/// use archive_mirror::config::Config;
/// use archive_mirror::crawler::{run_archive, YearSpan};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let summary = run_archive(
///     &Config::default(),
///     YearSpan::between(2020, 2019),
///     &[1, 2],
///     &CancellationToken::new(),
/// )
/// .await?;
/// println!("{} documents saved", summary.documents_saved);
/// # Ok(())
/// # }
/// ```
pub async fn run_archive(
    config: &Config,
    span: YearSpan,
    months: &[u32],
    cancel: &CancellationToken,
) -> Result<RunSummary, MirrorError> {
    let orchestrator = Orchestrator::from_config(config)?;
    let controller = Controller::new(orchestrator);
    Ok(controller.run(span, months, cancel).await)
}
