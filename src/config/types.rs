use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Archive judgment index used when no base URL is configured
pub const DEFAULT_BASE_URL: &str = "https://www.advocatekhoj.com/library/judgments/index.php";

/// Browser-like user agent; the archive serves empty bodies to unknown clients
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Main configuration structure for Archive-Mirror
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Switches to the high-throughput profile: no delay, more retries, wider pool
    pub fn apply_aggressive(&mut self) {
        self.crawl.delay_ms = 0;
        self.fetch.max_retries = 5;
    }
}

/// Remote archive location and client identity
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Base `index.php` URL every index and document URL hangs off
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,

    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
        }
    }
}

/// Retry and validity settings for the fetcher
///
/// Backoff lengths are expressed in multiples of `backoff_unit_ms`, so the
/// whole schedule can be shrunk for tests without changing its shape.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Per-request timeout in seconds
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Total attempts per URL
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Length of one backoff unit in milliseconds
    #[serde(rename = "backoff-unit-ms", default = "default_backoff_unit_ms")]
    pub backoff_unit_ms: u64,

    /// Units to wait per attempt after an empty body
    #[serde(rename = "throttle-backoff", default = "default_throttle_backoff")]
    pub throttle_backoff: u64,

    /// Units to wait after a suspiciously short body
    #[serde(rename = "suspicious-delay", default = "default_suspicious_delay")]
    pub suspicious_delay: u64,

    /// Bodies shorter than this without an `<html` marker are suspicious
    #[serde(rename = "min-body-len", default = "default_min_body_len")]
    pub min_body_len: usize,

    /// How much of the body is searched for the `<html` marker
    #[serde(rename = "html-probe-len", default = "default_html_probe_len")]
    pub html_probe_len: usize,
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Duration of `units` backoff units
    pub fn units(&self, units: u64) -> Duration {
        Duration::from_millis(self.backoff_unit_ms.saturating_mul(units))
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            backoff_unit_ms: default_backoff_unit_ms(),
            throttle_backoff: default_throttle_backoff(),
            suspicious_delay: default_suspicious_delay(),
            min_body_len: default_min_body_len(),
            html_probe_len: default_html_probe_len(),
        }
    }
}

/// Crawl pacing and parallelism
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Pause between successive index or continuation page requests (milliseconds)
    #[serde(rename = "delay-ms", default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Worker pool size; derived from the delay when unset
    #[serde(default)]
    pub workers: Option<usize>,
}

impl CrawlConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Effective pool size: 10 workers without pacing, 4 otherwise
    pub fn worker_count(&self) -> usize {
        match self.workers {
            Some(n) => n,
            None if self.delay_ms == 0 => 10,
            None => 4,
        }
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
            workers: None,
        }
    }
}

/// Output location
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Root directory; one sub-directory per year is created below it
    #[serde(rename = "output-dir", default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_unit_ms() -> u64 {
    1000
}

fn default_throttle_backoff() -> u64 {
    30
}

fn default_suspicious_delay() -> u64 {
    5
}

fn default_min_body_len() -> usize {
    100
}

fn default_html_probe_len() -> usize {
    200
}

fn default_delay_ms() -> u64 {
    1000
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}
