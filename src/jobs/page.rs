use crate::config::JobConfig;
use crate::extract::{DetailParser, PageMetadataParser};
use crate::fetch::{FetchRequest, FetchResult, Strategy};
use crate::jobs::{tier_html_dir, Job, JobContext};
use crate::{ExtractError, JobError};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use url::Url;

/// Fetches one page and extracts its metadata and sections
pub struct SinglePageJob {
    config: JobConfig,
    parser: Arc<dyn DetailParser>,
}

impl SinglePageJob {
    pub fn new(config: JobConfig) -> Self {
        Self {
            config,
            parser: Arc::new(PageMetadataParser),
        }
    }

    /// Uses a different extractor for the page
    pub fn with_parser(mut self, parser: Arc<dyn DetailParser>) -> Self {
        self.parser = parser;
        self
    }

    fn request(&self, ctx: &JobContext) -> Result<FetchRequest, JobError> {
        let target = Url::parse(&self.config.url)?;
        let strategy = Strategy::from_kind(self.config.strategy, self.config.wait_selector.as_deref());
        let cache_path =
            tier_html_dir(self.config.tier).join(format!("{}.html", self.config.output));

        Ok(FetchRequest::new(target, strategy, &ctx.settings, self.config.tier)
            .with_cache_path(cache_path))
    }
}

#[async_trait]
impl Job for SinglePageJob {
    fn config(&self) -> &JobConfig {
        &self.config
    }

    async fn run(&self, ctx: &JobContext) -> Result<Value, JobError> {
        let request = self.request(ctx)?;

        let document = match ctx.fetcher.fetch(&request).await {
            FetchResult::Success(document) => document,
            FetchResult::Exhausted { attempts } => {
                return Err(JobError::Exhausted {
                    url: request.target.to_string(),
                    attempts,
                });
            }
        };

        let fields = self.parser.parse_detail(&document.body, &document.url)?;
        if fields.fields().keys().all(|key| key == "url") {
            return Err(ExtractError::Empty(document.url.to_string()).into());
        }

        tracing::debug!(
            "{}: extracted {} fields ({} problems)",
            self.config.name,
            fields.fields().len(),
            fields.problems().len()
        );
        Ok(Value::Object(fields.into_record()))
    }
}
