use crate::browser::WaitStrategy;
use crate::cache::RefreshTier;
use crate::config::{Settings, StrategyKind};
use crate::url::cache_key;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// How the content of a target is retrieved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// Plain HTTP GET
    Plain,
    /// Full browser session executing page scripts
    Scripted { wait: WaitStrategy },
}

impl Strategy {
    /// Builds a strategy from the configured kind and optional wait selector
    pub fn from_kind(kind: StrategyKind, wait_selector: Option<&str>) -> Self {
        match kind {
            StrategyKind::Plain => Self::Plain,
            StrategyKind::Scripted => Self::Scripted {
                wait: wait_selector
                    .map(|s| WaitStrategy::Selector(s.to_string()))
                    .unwrap_or(WaitStrategy::NetworkIdle),
            },
        }
    }

    pub fn is_scripted(&self) -> bool {
        matches!(self, Self::Scripted { .. })
    }
}

/// A single fetch call
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// The URL to retrieve
    pub target: Url,

    /// Plain or scripted retrieval
    pub strategy: Strategy,

    /// Per-attempt timeout for plain requests
    pub timeout: Duration,

    /// Total number of attempts
    pub max_retries: u32,

    /// Base of the geometric backoff for scripted retries
    pub backoff_base: Duration,

    /// Cache location, relative to the cache root
    pub cache_path: PathBuf,

    /// Maximum age of a cached copy that may be served instead
    pub ttl: Duration,
}

impl FetchRequest {
    /// Creates a request using the shared settings and the tier's TTL
    ///
    /// The cache path defaults to `<tier>/html/<url-derived key>.html`.
    pub fn new(target: Url, strategy: Strategy, settings: &Settings, tier: RefreshTier) -> Self {
        let cache_path = PathBuf::from(tier.as_str())
            .join("html")
            .join(format!("{}.html", cache_key(&target)));

        Self {
            target,
            strategy,
            timeout: settings.request_timeout(),
            max_retries: settings.retries,
            backoff_base: settings.backoff_base(),
            cache_path,
            ttl: tier.ttl(),
        }
    }

    pub fn with_cache_path(mut self, cache_path: impl Into<PathBuf>) -> Self {
        self.cache_path = cache_path.into();
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// A retrieved document
#[derive(Debug, Clone)]
pub struct Document {
    pub url: Url,
    pub body: String,
    /// Served from the cache without network or browser activity
    pub from_cache: bool,
}

/// Outcome of [`crate::fetch::Fetcher::fetch`]
#[derive(Debug, Clone)]
pub enum FetchResult {
    /// A usable document
    Success(Document),

    /// Every attempt failed
    Exhausted {
        /// Number of attempts made
        attempts: u32,
    },
}

impl FetchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Consumes the result, returning the document on success
    pub fn into_document(self) -> Option<Document> {
        match self {
            Self::Success(document) => Some(document),
            Self::Exhausted { .. } => None,
        }
    }
}
