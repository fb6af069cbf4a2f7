//! Cache-first fetching with bounded retries
//!
//! The orchestrator is the only place that decides whether to hit the
//! network. Every call goes through the same steps:
//!
//! 1. Serve a fresh cache entry if one exists
//! 2. Otherwise try the selected content source up to `max_retries` times
//! 3. Reject responses shorter than the minimum content length
//! 4. Cache the first usable response and return it
//!
//! Failures never escape as errors; callers get a [`FetchResult`].

use crate::browser::{BrowserAdapter, BrowserSettings, BrowserSource};
use crate::cache::CacheStore;
use crate::config::Settings;
use crate::fetch::backoff::RetryDelays;
use crate::fetch::source::{build_http_client, ContentSource, HttpSource, DEFAULT_USER_AGENT};
use crate::fetch::{Document, FetchRequest, FetchResult, Strategy};
use crate::FetchError;
use std::sync::Arc;

/// Fetch orchestrator
#[derive(Clone)]
pub struct Fetcher {
    cache: CacheStore,
    plain: Arc<dyn ContentSource>,
    scripted: Option<Arc<dyn ContentSource>>,
    delays: RetryDelays,
    min_content_length: usize,
}

impl Fetcher {
    /// Creates a fetcher with a plain source only
    pub fn new(cache: CacheStore, plain: Arc<dyn ContentSource>) -> Self {
        Self {
            cache,
            plain,
            scripted: None,
            delays: RetryDelays::default(),
            min_content_length: 200,
        }
    }

    /// Builds the production fetcher: reqwest for plain requests, a
    /// headless browser for scripted ones
    pub fn from_settings(settings: &Settings, cache: CacheStore) -> Result<Self, reqwest::Error> {
        let client = build_http_client(DEFAULT_USER_AGENT, settings.request_timeout())?;
        let browser = BrowserAdapter::new(BrowserSettings::from_settings(settings));

        Ok(Self::new(cache, Arc::new(HttpSource::new(client)))
            .with_scripted(Arc::new(BrowserSource::new(browser)))
            .with_delays(RetryDelays {
                fixed: settings.retry_delay(),
                jitter: settings.backoff_jitter(),
            })
            .with_min_content_length(settings.min_content_length))
    }

    pub fn with_scripted(mut self, scripted: Arc<dyn ContentSource>) -> Self {
        self.scripted = Some(scripted);
        self
    }

    pub fn with_delays(mut self, delays: RetryDelays) -> Self {
        self.delays = delays;
        self
    }

    pub fn with_min_content_length(mut self, min_content_length: usize) -> Self {
        self.min_content_length = min_content_length;
        self
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Fetches a target, consulting the cache first
    ///
    /// # Retry Logic
    ///
    /// | Strategy | Delay after failed attempt `n` |
    /// |----------|--------------------------------|
    /// | Plain | fixed `delay` |
    /// | Scripted | `backoff_base * 1.6^(n-1)` + random jitter |
    ///
    /// No delay follows the last attempt.
    pub async fn fetch(&self, request: &FetchRequest) -> FetchResult {
        if let Some(body) = self.cache.get(&request.cache_path, request.ttl) {
            tracing::debug!("Cache hit for {}", request.target);
            return FetchResult::Success(Document {
                url: request.target.clone(),
                body,
                from_cache: true,
            });
        }

        for attempt in 1..=request.max_retries {
            tracing::info!(
                "Fetching {} (attempt {}/{})",
                request.target,
                attempt,
                request.max_retries
            );

            match self.attempt(request).await {
                Ok(body) => {
                    if let Err(e) = self.cache.put(&request.cache_path, &body) {
                        tracing::warn!("Failed to cache {}: {}", request.target, e);
                    }
                    return FetchResult::Success(Document {
                        url: request.target.clone(),
                        body,
                        from_cache: false,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        "Attempt {}/{} for {} failed: {}",
                        attempt,
                        request.max_retries,
                        request.target,
                        e
                    );
                }
            }

            if attempt < request.max_retries {
                let delay = match request.strategy {
                    Strategy::Plain => self.delays.plain(),
                    Strategy::Scripted { .. } => {
                        self.delays.scripted(attempt, request.backoff_base)
                    }
                };
                tracing::debug!("Retrying {} in {:.1}s", request.target, delay.as_secs_f64());
                tokio::time::sleep(delay).await;
            }
        }

        tracing::error!(
            "All {} attempts failed for {}",
            request.max_retries,
            request.target
        );
        FetchResult::Exhausted {
            attempts: request.max_retries,
        }
    }

    /// One attempt: invoke the source and validate the response size
    async fn attempt(&self, request: &FetchRequest) -> Result<String, FetchError> {
        let source = match request.strategy {
            Strategy::Plain => &self.plain,
            Strategy::Scripted { .. } => {
                self.scripted
                    .as_ref()
                    .ok_or_else(|| FetchError::NoScriptedSource {
                        url: request.target.to_string(),
                    })?
            }
        };

        let body = source.retrieve(request).await?;

        let len = body.trim().chars().count();
        if len < self.min_content_length {
            return Err(FetchError::TooShort {
                url: request.target.to_string(),
                len,
                min: self.min_content_length,
            });
        }

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::WaitStrategy;
    use crate::cache::RefreshTier;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;
    use url::Url;

    /// Returns queued responses in order, repeating the last one
    struct ScriptedResponses {
        responses: Vec<Result<String, ()>>,
        calls: AtomicUsize,
    }

    impl ScriptedResponses {
        fn new(responses: Vec<Result<String, ()>>) -> Arc<Self> {
            Arc::new(Self {
                responses,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ContentSource for ScriptedResponses {
        async fn retrieve(&self, request: &FetchRequest) -> Result<String, FetchError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            let idx = n.min(self.responses.len() - 1);
            self.responses[idx].clone().map_err(|_| FetchError::Timeout {
                url: request.target.to_string(),
            })
        }
    }

    fn fast_delays() -> RetryDelays {
        RetryDelays {
            fixed: Duration::ZERO,
            jitter: Duration::ZERO,
        }
    }

    fn request(strategy: Strategy, retries: u32) -> FetchRequest {
        let settings = Settings {
            backoff_base: 0.0,
            ..Settings::default()
        };
        FetchRequest::new(
            Url::parse("https://example.com/events/").unwrap(),
            strategy,
            &settings,
            RefreshTier::Daily,
        )
        .with_max_retries(retries)
    }

    fn page() -> String {
        format!("<html><body>{}</body></html>", "x".repeat(300))
    }

    #[tokio::test]
    async fn test_success_is_cached_and_reused() {
        let dir = TempDir::new().unwrap();
        let source = ScriptedResponses::new(vec![Ok(page())]);
        let fetcher =
            Fetcher::new(CacheStore::new(dir.path()), source.clone()).with_delays(fast_delays());
        let req = request(Strategy::Plain, 3);

        let first = fetcher.fetch(&req).await.into_document().unwrap();
        assert!(!first.from_cache);

        let second = fetcher.fetch(&req).await.into_document().unwrap();
        assert!(second.from_cache);
        assert_eq!(second.body, first.body);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_short_responses_exhaust_after_exact_attempts() {
        let dir = TempDir::new().unwrap();
        let source = ScriptedResponses::new(vec![Ok("x".repeat(50))]);
        let fetcher = Fetcher::new(CacheStore::new(dir.path()), source.clone())
            .with_scripted(source.clone())
            .with_delays(fast_delays());
        let req = request(
            Strategy::Scripted {
                wait: WaitStrategy::None,
            },
            3,
        );

        let result = fetcher.fetch(&req).await;
        assert!(matches!(result, FetchResult::Exhausted { attempts: 3 }));
        assert_eq!(source.calls(), 3);
        // nothing usable was cached
        assert!(fetcher.cache().get(&req.cache_path, req.ttl).is_none());
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let dir = TempDir::new().unwrap();
        let source = ScriptedResponses::new(vec![Err(()), Err(()), Ok(page())]);
        let fetcher =
            Fetcher::new(CacheStore::new(dir.path()), source.clone()).with_delays(fast_delays());

        let result = fetcher.fetch(&request(Strategy::Plain, 3)).await;
        assert!(result.is_success());
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test]
    async fn test_scripted_without_source_is_exhausted() {
        let dir = TempDir::new().unwrap();
        let plain = ScriptedResponses::new(vec![Ok(page())]);
        let fetcher =
            Fetcher::new(CacheStore::new(dir.path()), plain.clone()).with_delays(fast_delays());
        let req = request(
            Strategy::Scripted {
                wait: WaitStrategy::NetworkIdle,
            },
            2,
        );

        assert!(matches!(
            fetcher.fetch(&req).await,
            FetchResult::Exhausted { attempts: 2 }
        ));
        assert_eq!(plain.calls(), 0);
    }

    #[tokio::test]
    async fn test_expired_cache_triggers_refetch() {
        let dir = TempDir::new().unwrap();
        let source = ScriptedResponses::new(vec![Ok(page())]);
        let fetcher =
            Fetcher::new(CacheStore::new(dir.path()), source.clone()).with_delays(fast_delays());
        let req = request(Strategy::Plain, 1).with_ttl(Duration::ZERO);

        fetcher.cache().put(&req.cache_path, "stale").unwrap();
        std::thread::sleep(Duration::from_millis(1100));

        let doc = fetcher.fetch(&req).await.into_document().unwrap();
        assert!(!doc.from_cache);
        assert_eq!(source.calls(), 1);
    }
}
