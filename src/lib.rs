//! Page-Harvest: a cached, resumable scraping engine
//!
//! This crate fetches semi-structured pages on a schedule, caches the raw
//! content so repeated runs avoid redundant network and browser work, and
//! turns it into structured records for downstream storage.

pub mod browser;
pub mod cache;
pub mod config;
pub mod crawler;
pub mod extract;
pub mod fetch;
pub mod jobs;
pub mod output;
pub mod url;

use thiserror::Error;

/// Main error type for Page-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Crawl error: {0}")]
    Crawl(#[from] CrawlError),

    #[error("Job error: {0}")]
    Job(#[from] JobError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors raised by the on-disk cache
///
/// Only writes surface these; reads degrade to a cache miss.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("IO error writing {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Serialization error for {path}: {source}")]
    Serialize {
        path: String,
        source: serde_json::Error,
    },
}

/// Transport-level failures of a single fetch attempt
///
/// These never leave the fetch orchestrator; callers only see a `FetchResult`.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Unexpected status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Response too short for {url}: {len} chars (minimum {min})")]
    TooShort { url: String, len: usize, min: usize },

    #[error("Browser error for {url}: {source}")]
    Browser { url: String, source: BrowserError },

    #[error("No scripted content source configured for {url}")]
    NoScriptedSource { url: String },
}

/// Browser automation errors
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Failed to configure browser: {0}")]
    Config(String),

    #[error("Chrome DevTools error: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),

    #[error("Navigation timed out after {0:?}")]
    NavigationTimeout(std::time::Duration),
}

/// Content extraction errors
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    #[error("Document has no recognizable content: {0}")]
    Empty(String),
}

/// Crawl-level errors (only discovery failures are fatal)
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Failed to fetch index page {url}")]
    IndexUnavailable { url: String },

    #[error("Failed to parse index page {url}: {source}")]
    IndexParse { url: String, source: ExtractError },

    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CacheError),
}

/// Job-level errors reported per named job
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Unknown job kind: {0}")]
    UnknownKind(String),

    #[error("Invalid job target: {0}")]
    InvalidUrl(#[from] ::url::ParseError),

    #[error("Fetch exhausted for {url} after {attempts} attempts")]
    Exhausted { url: String, attempts: u32 },

    #[error("Extraction failed: {0}")]
    Extract(#[from] ExtractError),

    #[error("Crawl failed: {0}")]
    Crawl(#[from] CrawlError),

    #[error("Output failed: {0}")]
    Output(#[from] output::OutputError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

/// Result type alias for Page-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use cache::{CacheStore, RefreshTier};
pub use config::Config;
pub use crawler::{Coordinator, CrawlProgress, CrawlTarget, ResultSet};
pub use fetch::{FetchRequest, FetchResult, Fetcher, Strategy};
pub use jobs::{Job, JobContext, JobRegistry, JobRunner};
pub use output::{JsonFileSink, ResultSink};
