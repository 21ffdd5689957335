//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the mirror, including:
//! - The `HttpClient` seam and its reqwest-backed implementation
//! - Bounded retries with exponential backoff on transport failures
//! - Long linear backoff when the archive answers with an empty body
//! - Rejection of short bodies that are clearly not an HTML page

use crate::config::{FetchConfig, SourceConfig};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Raw response handed back by an [`HttpClient`]
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Failure to obtain a usable HTTP response at all
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("{0}")]
    Other(String),
}

/// Errors surfaced by [`Fetcher::fetch`] once retries are exhausted
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to fetch {url}: {source}")]
    Transport { url: String, source: TransportError },

    #[error("Malformed response from {url} ({len} bytes, no HTML)")]
    Malformed { url: String, len: usize },
}

/// Minimal GET capability the crawler depends on
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `source` - Supplies the user agent string
/// * `fetch` - Supplies the request timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(source: &SourceConfig, fetch: &FetchConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(source.user_agent.clone())
        .timeout(fetch.timeout())
        .connect_timeout(Duration::from_secs(10).min(fetch.timeout()))
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`HttpClient`] backed by reqwest
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: Client,
}

impl ReqwestClient {
    pub fn new(source: &SourceConfig, fetch: &FetchConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(source, fetch)?,
        })
    }
}

fn classify(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_connect() {
        TransportError::Connect(e.to_string())
    } else {
        TransportError::Other(e.to_string())
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let response = self.client.get(url).send().await.map_err(classify)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(classify)?;
        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}

/// Retrying wrapper around an [`HttpClient`]
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | Transport error or non-2xx | Retry after `2^attempt` units; error when exhausted |
/// | Empty body | Retry after `throttle * (attempt + 1)` units; return the empty body when exhausted |
/// | Short body without `<html` | Retry after the suspicious delay; error when exhausted |
/// | Anything else | Return the body |
pub struct Fetcher {
    client: Arc<dyn HttpClient>,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(client: Arc<dyn HttpClient>, config: FetchConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetches `url`, returning the body as (lossily decoded) text
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let attempts = self.config.max_retries.max(1);
        let mut attempt: u32 = 0;

        loop {
            let is_last = attempt + 1 >= attempts;

            let response = match self.client.get(url).await {
                Ok(response) if (200..300).contains(&response.status) => response,
                Ok(response) => {
                    let source = TransportError::Status(response.status);
                    self.transport_retry(url, attempt, is_last, source).await?;
                    attempt += 1;
                    continue;
                }
                Err(source) => {
                    self.transport_retry(url, attempt, is_last, source).await?;
                    attempt += 1;
                    continue;
                }
            };

            if response.body.is_empty() {
                tracing::warn!("Empty response from {} (likely throttled)", url);
                if is_last {
                    return Ok(String::new());
                }
                let wait = self
                    .config
                    .units(self.config.throttle_backoff * u64::from(attempt + 1));
                tracing::warn!("Waiting {:?} before retrying {}", wait, url);
                tokio::time::sleep(wait).await;
                attempt += 1;
                continue;
            }

            let body = String::from_utf8_lossy(&response.body).into_owned();
            if self.is_suspicious(&body) {
                tracing::warn!(
                    "Suspiciously short response from {} ({} bytes)",
                    url,
                    body.len()
                );
                if is_last {
                    return Err(FetchError::Malformed {
                        url: url.to_string(),
                        len: body.len(),
                    });
                }
                tokio::time::sleep(self.config.units(self.config.suspicious_delay)).await;
                attempt += 1;
                continue;
            }

            return Ok(body);
        }
    }

    /// Sleeps before the next transport retry, or fails on the last attempt
    async fn transport_retry(
        &self,
        url: &str,
        attempt: u32,
        is_last: bool,
        source: TransportError,
    ) -> Result<(), FetchError> {
        if is_last {
            tracing::error!("Failed to fetch {}: {}", url, source);
            return Err(FetchError::Transport {
                url: url.to_string(),
                source,
            });
        }
        let wait = self.config.units(2u64.saturating_pow(attempt));
        tracing::debug!(
            "Attempt {} for {} failed ({}), retrying in {:?}",
            attempt + 1,
            url,
            source,
            wait
        );
        tokio::time::sleep(wait).await;
        Ok(())
    }

    /// A non-empty body is suspicious when it is short and carries no
    /// `<html` marker near the start
    fn is_suspicious(&self, body: &str) -> bool {
        if body.len() >= self.config.min_body_len {
            return false;
        }
        let probe: String = body.chars().take(self.config.html_probe_len).collect();
        !probe.to_lowercase().contains("<html")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::testing::ScriptedClient;
    use tokio::time::Instant;

    fn config(retries: u32) -> FetchConfig {
        FetchConfig {
            max_retries: retries,
            ..FetchConfig::default()
        }
    }

    const PAGE: &str = "<html><body><p>hello</p></body></html>";

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&SourceConfig::default(), &FetchConfig::default());
        assert!(client.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_body_backs_off_then_returns_empty() {
        let client = Arc::new(ScriptedClient::repeating(HttpResponse {
            status: 200,
            body: Vec::new(),
        }));
        let fetcher = Fetcher::new(client.clone(), config(3));

        let start = Instant::now();
        let body = fetcher.fetch("https://example.com/a").await.unwrap();

        assert_eq!(body, "");
        assert_eq!(client.calls(), 3);
        // 30s after the first attempt, 60s after the second, none after the last
        assert_eq!(start.elapsed(), Duration::from_secs(90));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_error_uses_exponential_backoff() {
        let client = Arc::new(ScriptedClient::new(vec![
            Err(TransportError::Timeout),
            Err(TransportError::Connect("refused".to_string())),
            Ok(HttpResponse {
                status: 200,
                body: PAGE.as_bytes().to_vec(),
            }),
        ]));
        let fetcher = Fetcher::new(client.clone(), config(3));

        let start = Instant::now();
        let body = fetcher.fetch("https://example.com/a").await.unwrap();

        assert_eq!(body, PAGE);
        assert_eq!(start.elapsed(), Duration::from_secs(1 + 2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_error_exhausted() {
        let client = Arc::new(ScriptedClient::repeating_error(TransportError::Timeout));
        let fetcher = Fetcher::new(client.clone(), config(3));

        let result = fetcher.fetch("https://example.com/a").await;

        assert!(matches!(result, Err(FetchError::Transport { .. })));
        assert_eq!(client.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_status_is_retried() {
        let client = Arc::new(ScriptedClient::new(vec![
            Ok(HttpResponse {
                status: 503,
                body: b"unavailable".to_vec(),
            }),
            Ok(HttpResponse {
                status: 200,
                body: PAGE.as_bytes().to_vec(),
            }),
        ]));
        let fetcher = Fetcher::new(client.clone(), config(3));

        assert_eq!(fetcher.fetch("https://example.com/a").await.unwrap(), PAGE);
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_non_html_body_is_malformed() {
        let client = Arc::new(ScriptedClient::repeating(HttpResponse {
            status: 200,
            body: b"blocked".to_vec(),
        }));
        let fetcher = Fetcher::new(client.clone(), config(2));

        let start = Instant::now();
        let result = fetcher.fetch("https://example.com/a").await;

        assert!(matches!(result, Err(FetchError::Malformed { len: 7, .. })));
        assert_eq!(client.calls(), 2);
        assert_eq!(start.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_html_body_is_accepted() {
        let client = Arc::new(ScriptedClient::repeating(HttpResponse {
            status: 200,
            body: b"<HTML></HTML>".to_vec(),
        }));
        let fetcher = Fetcher::new(client.clone(), config(3));

        assert_eq!(
            fetcher.fetch("https://example.com/a").await.unwrap(),
            "<HTML></HTML>"
        );
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_attempt_still_returns_empty_body() {
        let client = Arc::new(ScriptedClient::repeating(HttpResponse {
            status: 200,
            body: Vec::new(),
        }));
        let fetcher = Fetcher::new(client.clone(), config(1));

        let start = Instant::now();
        assert_eq!(fetcher.fetch("https://example.com/a").await.unwrap(), "");
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
