//! Crawler module for resumable index/detail crawls
//!
//! This module contains the crawl logic, including:
//! - Crawl targets discovered on an index page
//! - Checkpointing and per-target snapshots for resumption
//! - Known results for dedup-on-discover and merge-on-completion
//! - Category grouping of the collected records
//! - Overall crawl coordination

mod checkpoint;
mod coordinator;
mod known;
mod results;
mod snapshot;
pub(crate) mod target;

pub use checkpoint::{CrawlProgress, ProgressStore};
pub use coordinator::{Coordinator, CrawlOutcome, CrawlStats, PoliteDelay};
pub use known::{fetch_known_results, known_results_from_value, KnownResults};
pub use results::{record_url, GroupedResults, Record, ResultSet};
pub use snapshot::SnapshotArchive;
pub use target::{CrawlTarget, DEFAULT_CATEGORY};
