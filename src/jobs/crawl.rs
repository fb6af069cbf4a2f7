use crate::config::JobConfig;
use crate::crawler::{fetch_known_results, Coordinator, KnownResults};
use crate::extract::{DetailParser, EventDetailParser, EventIndexParser, IndexParser};
use crate::fetch::{FetchRequest, Strategy};
use crate::jobs::{tier_html_dir, Job, JobContext};
use crate::JobError;
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

/// Crawls an event index and every event it lists
///
/// Checkpoints and snapshots live in `<root>/<tier>/html/<output>_pages/`.
/// The result is the flattened `{"results": [...]}` document.
pub struct EventCrawlJob {
    config: JobConfig,
    index_parser: Arc<dyn IndexParser>,
    detail_parser: Arc<dyn DetailParser>,
}

impl EventCrawlJob {
    pub fn new(config: JobConfig) -> Self {
        Self {
            config,
            index_parser: Arc::new(EventIndexParser),
            detail_parser: Arc::new(EventDetailParser),
        }
    }

    /// Uses different extractors for the index and detail pages
    pub fn with_parsers(
        mut self,
        index_parser: Arc<dyn IndexParser>,
        detail_parser: Arc<dyn DetailParser>,
    ) -> Self {
        self.index_parser = index_parser;
        self.detail_parser = detail_parser;
        self
    }

    /// Where the checkpoint and snapshots of this job live
    pub fn pages_dir(&self, ctx: &JobContext) -> PathBuf {
        ctx.html_dir(self.config.tier)
            .join(format!("{}_pages", self.config.output))
    }

    fn coordinator(&self, ctx: &JobContext) -> Coordinator {
        Coordinator::new(
            ctx.fetcher.clone(),
            self.index_parser.clone(),
            self.detail_parser.clone(),
            self.pages_dir(ctx),
            &ctx.settings,
            self.config.tier,
        )
        .with_detail_strategy(self.strategy())
    }

    fn strategy(&self) -> Strategy {
        Strategy::from_kind(self.config.strategy, self.config.wait_selector.as_deref())
    }

    async fn known_results(&self, ctx: &JobContext) -> KnownResults {
        match &self.config.known_results_url {
            Some(url) => fetch_known_results(&ctx.http, url, ctx.settings.request_timeout()).await,
            None => KnownResults::new(),
        }
    }
}

#[async_trait]
impl Job for EventCrawlJob {
    fn config(&self) -> &JobConfig {
        &self.config
    }

    async fn run(&self, ctx: &JobContext) -> Result<Value, JobError> {
        let target = Url::parse(&self.config.url)?;
        let coordinator = self.coordinator(ctx);

        if ctx.fresh {
            coordinator.reset()?;
        }

        let index = FetchRequest::new(target, self.strategy(), &ctx.settings, self.config.tier)
            .with_cache_path(
                tier_html_dir(self.config.tier).join(format!("{}.html", self.config.output)),
            );

        let known = self.known_results(ctx).await;
        let outcome = coordinator
            .run(&index, &known, self.config.dedupe_known)
            .await?;

        Ok(outcome.results.to_flat())
    }
}
