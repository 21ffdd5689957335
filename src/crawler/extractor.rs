//! Document extractor: reassembles a multi-page document
//!
//! Page 1 is the document URL itself and also supplies the title and date.
//! Continuation pages (`&page=2`, `&page=3`, ...) are fetched until one of:
//! - the end-of-document marker is read
//! - a page repeats the previous page's content container
//! - a page has no content container, no text, or cannot be fetched
//!
//! Fetch failures never escape; they degrade to whatever text was stitched
//! so far, and an empty result means "not captured yet".

use crate::crawler::fetcher::Fetcher;
use crate::crawler::parser::{
    parse_document_page, parse_title_metadata, DocumentMetadata, PageContent,
};
use crate::url::continuation_url;
use std::sync::Arc;
use std::time::Duration;

/// Text and metadata recovered for one document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedDocument {
    pub text: String,
    pub metadata: DocumentMetadata,
}

impl ExtractedDocument {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Outcome of folding one page into a [`StitchState`]
#[derive(Debug)]
pub enum Stitch {
    /// Fetch the next page
    Continue(StitchState),

    /// The document is complete
    Done(StitchState),
}

/// Page texts gathered so far plus the previous page's digest
#[derive(Debug, Default, Clone)]
pub struct StitchState {
    pages: Vec<String>,
    last_digest: Option<String>,
}

impl StitchState {
    /// Folds one page's content into the state
    pub fn step(mut self, content: Option<PageContent>) -> Stitch {
        let Some(content) = content else {
            return Stitch::Done(self);
        };

        if self.last_digest.as_deref() == Some(content.digest.as_str()) {
            tracing::debug!("Page repeats previous content, stopping");
            return Stitch::Done(self);
        }
        self.last_digest = Some(content.digest);

        if content.blocks.is_empty() {
            return Stitch::Done(self);
        }
        self.pages.push(content.blocks.join("\n"));

        if content.ended {
            Stitch::Done(self)
        } else {
            Stitch::Continue(self)
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Joins the page texts with blank lines
    pub fn finish(self) -> String {
        self.pages.join("\n\n")
    }
}

/// Fetches and stitches documents
pub struct DocumentExtractor {
    fetcher: Arc<Fetcher>,
    delay: Duration,
}

impl DocumentExtractor {
    pub fn new(fetcher: Arc<Fetcher>, delay: Duration) -> Self {
        Self { fetcher, delay }
    }

    /// Extracts the full text of the document at `url`
    pub async fn extract(&self, url: &str) -> ExtractedDocument {
        let body = match self.fetcher.fetch(url).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("Could not fetch document: {}", e);
                return ExtractedDocument::default();
            }
        };

        let first = parse_document_page(&body);
        let metadata = first
            .title
            .as_deref()
            .map(parse_title_metadata)
            .unwrap_or_default();

        let mut state = StitchState::default();
        let mut content = first.content;
        let mut page: u32 = 1;

        loop {
            match state.step(content) {
                Stitch::Continue(next) => state = next,
                Stitch::Done(done) => {
                    state = done;
                    break;
                }
            }

            page += 1;
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            let page_url = continuation_url(url, page);
            content = match self.fetcher.fetch(&page_url).await {
                Ok(body) => parse_document_page(&body).content,
                Err(e) => {
                    tracing::debug!("Stopping at page {}: {}", page, e);
                    None
                }
            };
        }

        tracing::debug!("Stitched {} page(s) from {}", state.page_count(), url);

        ExtractedDocument {
            text: state.finish(),
            metadata,
        }
    }
}
