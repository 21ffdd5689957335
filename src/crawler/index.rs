//! Index walker: discovers every document listed for one month
//!
//! Index pages are requested in sequence (`index1.php`, `index2.php`, ...)
//! until the archive prints its end-of-listing marker, a page cannot be
//! fetched, or a page adds no link that was not already seen. The last rule
//! is what guarantees termination, since the marker is not always served.

use crate::crawler::fetcher::Fetcher;
use crate::crawler::parser::parse_index_page;
use crate::url::{ArchiveUrls, DocumentRef};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Links accumulated while walking one month's listing
#[derive(Debug, Default, Clone)]
pub struct DiscoveryState {
    seen: HashSet<String>,
    links: Vec<String>,
}

impl DiscoveryState {
    /// Folds one page's links into the state
    ///
    /// Returns the new state and how many links were not seen before.
    pub fn absorb(mut self, page_links: Vec<String>) -> (Self, usize) {
        let before = self.links.len();
        for link in page_links {
            if self.seen.insert(link.clone()) {
                self.links.push(link);
            }
        }
        let added = self.links.len() - before;
        (self, added)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Discovery-ordered document references; ordinals start at 1
    pub fn into_documents(self) -> Vec<DocumentRef> {
        self.links
            .into_iter()
            .enumerate()
            .map(|(i, url)| DocumentRef::new(url, i + 1))
            .collect()
    }
}

/// Walks the paginated index of a month
pub struct IndexWalker {
    fetcher: Arc<Fetcher>,
    urls: ArchiveUrls,
    delay: Duration,
}

impl IndexWalker {
    pub fn new(fetcher: Arc<Fetcher>, urls: ArchiveUrls, delay: Duration) -> Self {
        Self {
            fetcher,
            urls,
            delay,
        }
    }

    /// Returns every distinct document listed for `year`/`month`, in the
    /// order first seen
    pub async fn discover(
        &self,
        year: i32,
        month: u32,
        cancel: &CancellationToken,
    ) -> Vec<DocumentRef> {
        let mut state = DiscoveryState::default();
        let mut page: u32 = 1;

        loop {
            if cancel.is_cancelled() {
                tracing::info!("Index walk for {}/{:02} cancelled", year, month);
                break;
            }

            let Some(url) = self.urls.index_url(year, month, page) else {
                tracing::warn!("No index URL for month {}", month);
                break;
            };

            let body = match self.fetcher.fetch(&url).await {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!("Stopping index walk at page {}: {}", page, e);
                    break;
                }
            };

            let listing = parse_index_page(&body, &self.urls);
            if listing.exhausted {
                tracing::debug!("End of listing reached at index page {}", page);
                break;
            }

            let (next, added) = state.absorb(listing.links);
            state = next;
            tracing::debug!("Index page {}: {} new links", page, added);

            if added == 0 {
                break;
            }

            page += 1;
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        state.into_documents()
    }
}
