//! Jobs and their scheduling
//!
//! A job is one configured unit of work (a single page, or an index crawl)
//! that produces a structured value. Jobs are built from their config
//! through an explicit [`JobRegistry`] and executed by the [`JobRunner`],
//! which isolates failures so one job never stops its siblings.

mod crawl;
mod page;
mod registry;
mod runner;
mod schedule;

pub use crawl::EventCrawlJob;
pub use page::SinglePageJob;
pub use registry::{JobConstructor, JobRegistry};
pub use runner::{JobOutcome, JobReport, JobRunner, RunFilter};
pub use schedule::is_within_active_hours;

use crate::cache::{CacheStore, RefreshTier};
use crate::config::{JobConfig, Settings};
use crate::fetch::{build_http_client, Fetcher, DEFAULT_USER_AGENT};
use crate::JobError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Shared resources handed to every job of a run
#[derive(Clone)]
pub struct JobContext {
    pub settings: Settings,
    pub fetcher: Fetcher,
    /// Client for auxiliary requests (known results)
    pub http: Client,
    /// Root of caches, checkpoints and output
    pub root: PathBuf,
    /// Discard crawl checkpoints before running
    pub fresh: bool,
}

impl JobContext {
    /// Builds the production context rooted at `root`
    pub fn new(settings: Settings, root: impl Into<PathBuf>) -> Result<Self, JobError> {
        let root = root.into();
        let fetcher = Fetcher::from_settings(&settings, CacheStore::new(&root))?;
        let http = build_http_client(DEFAULT_USER_AGENT, settings.request_timeout())?;

        Ok(Self {
            settings,
            fetcher,
            http,
            root,
            fresh: false,
        })
    }

    pub fn with_fresh(mut self, fresh: bool) -> Self {
        self.fresh = fresh;
        self
    }

    /// Directory of a tier's cached markup: `<root>/<tier>/html`
    pub fn html_dir(&self, tier: RefreshTier) -> PathBuf {
        self.root.join(tier_html_dir(tier))
    }
}

/// The markup directory of a tier, relative to the cache root
pub(crate) fn tier_html_dir(tier: RefreshTier) -> PathBuf {
    Path::new(tier.as_str()).join("html")
}

/// A configured unit of work
#[async_trait]
pub trait Job: Send + Sync {
    /// The job's configuration
    fn config(&self) -> &JobConfig;

    fn name(&self) -> &str {
        &self.config().name
    }

    /// Produces the job's structured result
    async fn run(&self, ctx: &JobContext) -> Result<Value, JobError>;
}
