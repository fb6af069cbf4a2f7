//! Crawler coordinator - resumable index/detail crawl
//!
//! A crawl runs through four stages:
//! - Discover: fetch the index page and enumerate its targets
//! - Load checkpoint: find out how far an earlier run came
//! - Iterate: restore completed targets from snapshots, fetch the rest
//! - Merge & group: combine with known results, grouped by category
//!
//! Targets are processed strictly one at a time, in discovery order, and
//! progress is persisted after every target. Only a discovery failure ends
//! the crawl early.

use crate::cache::RefreshTier;
use crate::config::Settings;
use crate::crawler::checkpoint::{CrawlProgress, ProgressStore};
use crate::crawler::known::KnownResults;
use crate::crawler::results::{GroupedResults, Record, ResultSet};
use crate::crawler::snapshot::SnapshotArchive;
use crate::crawler::target::CrawlTarget;
use crate::extract::{DetailParser, IndexParser};
use crate::fetch::{random_up_to, FetchRequest, FetchResult, Fetcher, Strategy};
use crate::CrawlError;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Randomized pause between two targets
#[derive(Debug, Clone, Copy)]
pub struct PoliteDelay {
    pub base: Duration,
    pub jitter: Duration,
}

impl PoliteDelay {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            base: settings.polite_delay(),
            jitter: settings.polite_jitter(),
        }
    }

    /// `base` plus up to `jitter`
    pub fn next(&self) -> Duration {
        self.base + random_up_to(self.jitter)
    }
}

/// Counters of one crawl run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// Targets listed on the index page
    pub discovered: usize,
    /// Targets dropped because they were already known
    pub skipped_known: usize,
    /// Completed targets restored from a snapshot
    pub restored: usize,
    /// Targets fetched and parsed in this run
    pub fetched: usize,
    /// Targets that kept only their index fields
    pub failed: usize,
}

/// Result of a finished crawl
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub results: GroupedResults,
    pub stats: CrawlStats,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    fetcher: Fetcher,
    index_parser: Arc<dyn IndexParser>,
    detail_parser: Arc<dyn DetailParser>,
    progress: ProgressStore,
    snapshots: SnapshotArchive,
    settings: Settings,
    tier: RefreshTier,
    detail_strategy: Strategy,
    polite: PoliteDelay,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `fetcher` - The fetch orchestrator used for index and detail pages
    /// * `index_parser` - Enumerates targets on the index page
    /// * `detail_parser` - Extracts the fields of a target page
    /// * `pages_dir` - Directory holding the checkpoint and the snapshots
    /// * `settings` - Shared settings (retries, timeouts, polite delay)
    /// * `tier` - Refresh tier of the job; sets the cache TTL of detail pages
    pub fn new(
        fetcher: Fetcher,
        index_parser: Arc<dyn IndexParser>,
        detail_parser: Arc<dyn DetailParser>,
        pages_dir: impl Into<PathBuf>,
        settings: &Settings,
        tier: RefreshTier,
    ) -> Self {
        let pages_dir = pages_dir.into();

        Self {
            fetcher,
            index_parser,
            detail_parser,
            progress: ProgressStore::in_dir(&pages_dir),
            snapshots: SnapshotArchive::new(pages_dir),
            settings: settings.clone(),
            tier,
            detail_strategy: Strategy::Plain,
            polite: PoliteDelay::from_settings(settings),
        }
    }

    /// Sets how detail pages are retrieved (plain by default)
    pub fn with_detail_strategy(mut self, strategy: Strategy) -> Self {
        self.detail_strategy = strategy;
        self
    }

    pub fn with_polite_delay(mut self, polite: PoliteDelay) -> Self {
        self.polite = polite;
        self
    }

    pub fn progress_store(&self) -> &ProgressStore {
        &self.progress
    }

    pub fn snapshots(&self) -> &SnapshotArchive {
        &self.snapshots
    }

    /// Forgets the checkpoint so the next run starts from the first target
    pub fn reset(&self) -> Result<(), CrawlError> {
        self.progress.clear()?;
        tracing::info!("Cleared crawl progress at {}", self.progress.path().display());
        Ok(())
    }

    /// Runs the crawl
    ///
    /// # Arguments
    ///
    /// * `index` - Request for the index page
    /// * `known` - Previously published results, merged into the output
    /// * `dedupe` - Skip targets whose URL is already in `known`
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlOutcome)` - Grouped results (partial entries included)
    /// * `Err(CrawlError)` - The index page could not be fetched or parsed
    pub async fn run(
        &self,
        index: &FetchRequest,
        known: &KnownResults,
        dedupe: bool,
    ) -> Result<CrawlOutcome, CrawlError> {
        let start_time = Instant::now();
        let mut stats = CrawlStats::default();

        let targets = self.discover(index).await?;
        stats.discovered = targets.len();

        let targets: Vec<CrawlTarget> = if dedupe {
            let known_urls = known.urls();
            targets
                .into_iter()
                .filter(|t| !known_urls.contains(t.url.as_str()))
                .collect()
        } else {
            targets
        };
        stats.skipped_known = stats.discovered - targets.len();

        let total = targets.len();
        let last_index = self.resume_point(total);
        if last_index > 0 {
            tracing::info!("Resuming crawl after target {}/{}", last_index, total);
        }

        let mut results = ResultSet::from_targets(&targets);

        for (position, target) in targets.iter().enumerate() {
            let number = position + 1;

            if number <= last_index {
                if self.restore(target, &mut results) {
                    stats.restored += 1;
                }
                continue;
            }

            tracing::info!("Processing target {}/{}: {}", number, total, target.title);
            match self.collect(target).await {
                Some(fields) => {
                    results.merge_fields(target.url.as_str(), &fields);
                    stats.fetched += 1;
                }
                None => stats.failed += 1,
            }

            self.save_progress(CrawlProgress::new(number, total));

            if number < total {
                tokio::time::sleep(self.polite.next()).await;
            }
        }

        if last_index >= total {
            self.save_progress(CrawlProgress::new(total, total));
        }

        let fresh = results.group_by_category();
        let merged = known.merged_with(&fresh);

        tracing::info!(
            "Crawl of {} completed in {:?}: {} discovered, {} known, {} restored, {} fetched, {} failed",
            index.target,
            start_time.elapsed(),
            stats.discovered,
            stats.skipped_known,
            stats.restored,
            stats.fetched,
            stats.failed
        );

        Ok(CrawlOutcome {
            results: merged,
            stats,
        })
    }

    /// Fetches and parses the index page
    async fn discover(&self, index: &FetchRequest) -> Result<Vec<CrawlTarget>, CrawlError> {
        let document = match self.fetcher.fetch(index).await {
            FetchResult::Success(document) => document,
            FetchResult::Exhausted { attempts } => {
                tracing::error!(
                    "Index page {} unavailable after {} attempts",
                    index.target,
                    attempts
                );
                return Err(CrawlError::IndexUnavailable {
                    url: index.target.to_string(),
                });
            }
        };

        let targets = self
            .index_parser
            .parse_index(&document.body, &index.target)
            .map_err(|source| CrawlError::IndexParse {
                url: index.target.to_string(),
                source,
            })?;

        if targets.is_empty() {
            tracing::warn!("No targets found on {}", index.target);
        } else {
            tracing::info!("Discovered {} targets on {}", targets.len(), index.target);
        }
        Ok(targets)
    }

    /// Determines how many leading targets were completed earlier
    ///
    /// A checkpoint from a run that finished the whole list does not carry
    /// over: the crawl starts again from the first target.
    fn resume_point(&self, total: usize) -> usize {
        let progress = self.progress.load();

        if progress.is_complete() {
            tracing::debug!(
                "Previous crawl finished ({}/{}), starting over",
                progress.last_index,
                progress.total
            );
            return 0;
        }
        if progress.total != 0 && progress.total != total {
            tracing::warn!(
                "Index now lists {} targets, checkpoint was taken at {}",
                total,
                progress.total
            );
        }
        progress.last_index.min(total)
    }

    /// Re-reads a completed target from its snapshot
    ///
    /// Returns false when there is nothing to restore; the target then keeps
    /// its index fields.
    fn restore(&self, target: &CrawlTarget, results: &mut ResultSet) -> bool {
        let Some(html) = self.snapshots.load(&target.url) else {
            tracing::debug!("No snapshot for completed target {}", target.url);
            return false;
        };

        match self.detail_parser.parse_detail(&html, &target.url) {
            Ok(fields) => {
                results.merge_fields(target.url.as_str(), &without_empty(fields.into_record()));
                true
            }
            Err(e) => {
                tracing::warn!("Cannot parse snapshot of {}: {}", target.url, e);
                false
            }
        }
    }

    /// Fetches and parses one target; failures are logged and yield `None`
    async fn collect(&self, target: &CrawlTarget) -> Option<Record> {
        let request = FetchRequest::new(
            target.url.clone(),
            self.detail_strategy.clone(),
            &self.settings,
            self.tier,
        );

        let document = match self.fetcher.fetch(&request).await {
            FetchResult::Success(document) => document,
            FetchResult::Exhausted { attempts } => {
                tracing::warn!(
                    "Giving up on {} after {} attempts, keeping index fields",
                    target.url,
                    attempts
                );
                return None;
            }
        };

        let fields = match self.detail_parser.parse_detail(&document.body, &target.url) {
            Ok(fields) => fields,
            Err(e) => {
                tracing::warn!("Failed to parse {}: {}", target.url, e);
                return None;
            }
        };

        if let Err(e) = self.snapshots.save(&target.url, &document.body) {
            tracing::warn!("Failed to save snapshot of {}: {}", target.url, e);
        }

        Some(without_empty(fields.into_record()))
    }

    fn save_progress(&self, progress: CrawlProgress) {
        if let Err(e) = self.progress.save(progress) {
            tracing::warn!(
                "Failed to save progress {}/{}: {}",
                progress.last_index,
                progress.total,
                e
            );
        }
    }
}

/// Drops null values so they never overwrite index-derived fields
fn without_empty(mut record: Record) -> Record {
    record.retain(|_, value| !value.is_null());
    record
}
