//! Configuration module for Archive-Mirror
//!
//! Settings come from an optional TOML file; every section and key has a
//! default, and the command line overrides the loaded values.
//!
//! # Example
//!
//! ```no_run
//! use archive_mirror::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("mirror.toml")).unwrap();
//! println!("Pool size: {}", config.crawl.worker_count());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlConfig, FetchConfig, OutputConfig, SourceConfig, DEFAULT_BASE_URL,
    DEFAULT_USER_AGENT,
};

pub use parser::{load_config, load_config_or_default};
pub use validation::{validate, validate_months};
