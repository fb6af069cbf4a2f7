//! Browser automation for pages that need script execution
//!
//! Each render launches an isolated headless Chromium session with a random
//! user agent and viewport, a fixed locale and timezone, and (optionally) the
//! automation flag hidden. The session is torn down on every path.
//!
//! A caller may hand in an already-running browser as a fast path; if
//! rendering on it fails, a fresh session is launched instead.

mod humanize;
mod session;
mod stealth;

pub use humanize::{plan as humanize_plan, Gesture};
pub use session::Session;
pub use stealth::{default_user_agents, default_viewports, Fingerprint, STEALTH_SCRIPT};

use crate::config::{Settings, Viewport};
use crate::fetch::{ContentSource, FetchRequest, Strategy};
use crate::{BrowserError, FetchError};
use async_trait::async_trait;
use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::emulation::{
    SetLocaleOverrideParams, SetTimezoneOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::Page;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};
use url::Url;

/// How long a selector wait may take before giving up
const SELECTOR_WAIT: Duration = Duration::from_secs(15);
const SELECTOR_POLL: Duration = Duration::from_millis(250);

/// What to wait for after navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitStrategy {
    /// Wait until an element matching the CSS selector exists
    Selector(String),
    /// Wait for the load event, then let the page settle
    NetworkIdle,
    /// Read the document right after navigation
    None,
}

/// Browser options derived from the shared settings
#[derive(Debug, Clone)]
pub struct BrowserSettings {
    pub headless: bool,
    pub stealth: bool,
    pub humanize: bool,
    pub navigation_timeout: Duration,
    pub wait_after_idle: Duration,
    pub user_agents: Vec<String>,
    pub viewports: Vec<Viewport>,
}

impl BrowserSettings {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            headless: settings.headless,
            stealth: settings.stealth,
            humanize: settings.humanize,
            navigation_timeout: settings.navigation_timeout(),
            wait_after_idle: settings.wait_after_idle(),
            user_agents: settings
                .user_agents
                .clone()
                .unwrap_or_else(default_user_agents),
            viewports: settings.viewports.clone().unwrap_or_else(default_viewports),
        }
    }
}

/// Renders pages in a real browser
#[derive(Clone)]
pub struct BrowserAdapter {
    settings: BrowserSettings,
    shared: Option<Arc<Browser>>,
}

impl BrowserAdapter {
    pub fn new(settings: BrowserSettings) -> Self {
        Self {
            settings,
            shared: None,
        }
    }

    /// Reuses an already-running browser before launching new ones
    pub fn with_shared_browser(mut self, browser: Arc<Browser>) -> Self {
        self.shared = Some(browser);
        self
    }

    pub fn settings(&self) -> &BrowserSettings {
        &self.settings
    }

    /// Returns the fully rendered document of `url`
    pub async fn render(&self, url: &Url, wait: &WaitStrategy) -> Result<String, BrowserError> {
        let fingerprint = Fingerprint::random(&self.settings.user_agents, &self.settings.viewports);

        let fast = self
            .shared
            .as_ref()
            .map(|shared| self.render_on(shared, url, wait, &fingerprint));

        shared_or_fresh(url, fast, || self.render_fresh(url, wait, &fingerprint)).await
    }

    /// Renders in a newly launched session that is closed on every path
    async fn render_fresh(
        &self,
        url: &Url,
        wait: &WaitStrategy,
        fingerprint: &Fingerprint,
    ) -> Result<String, BrowserError> {
        tracing::debug!(
            "Launching browser for {} ({}x{})",
            url,
            fingerprint.viewport.width,
            fingerprint.viewport.height
        );
        let session = Session::launch(&self.settings, fingerprint).await?;
        let result = self
            .render_on(session.browser(), url, wait, fingerprint)
            .await;
        session.close().await;
        result
    }

    /// Opens a page on `browser`, renders `url` and always closes the page
    async fn render_on(
        &self,
        browser: &Browser,
        url: &Url,
        wait: &WaitStrategy,
        fingerprint: &Fingerprint,
    ) -> Result<String, BrowserError> {
        let page = browser.new_page("about:blank").await?;
        let result = self.drive(&page, url, wait, fingerprint).await;

        if let Err(e) = page.close().await {
            tracing::warn!("Failed to close page for {}: {}", url, e);
        }
        result
    }

    async fn drive(
        &self,
        page: &Page,
        url: &Url,
        wait: &WaitStrategy,
        fingerprint: &Fingerprint,
    ) -> Result<String, BrowserError> {
        let mut user_agent = SetUserAgentOverrideParams::new(fingerprint.user_agent.clone());
        user_agent.accept_language = Some(stealth::LOCALE.to_string());
        page.execute(user_agent).await?;
        page.execute(SetLocaleOverrideParams {
            locale: Some(stealth::LOCALE.to_string()),
        })
        .await?;
        page.execute(SetTimezoneOverrideParams::new(stealth::TIMEZONE))
            .await?;

        if self.settings.stealth {
            page.execute(AddScriptToEvaluateOnNewDocumentParams::new(STEALTH_SCRIPT))
                .await?;
        }

        let nav_timeout = self.settings.navigation_timeout;
        timeout(nav_timeout, page.goto(url.as_str()))
            .await
            .map_err(|_| BrowserError::NavigationTimeout(nav_timeout))??;

        self.wait_for(page, wait).await;

        if self.settings.humanize {
            humanize::perform(page, &humanize::plan(fingerprint.viewport)).await;
        }

        Ok(page.content().await?)
    }

    /// Best-effort wait; a timeout only logs a warning
    async fn wait_for(&self, page: &Page, wait: &WaitStrategy) {
        match wait {
            WaitStrategy::Selector(selector) => {
                let deadline = Instant::now() + SELECTOR_WAIT;
                loop {
                    if page.find_element(selector.as_str()).await.is_ok() {
                        return;
                    }
                    if Instant::now() >= deadline {
                        tracing::warn!("Selector '{}' not found, continuing anyway", selector);
                        return;
                    }
                    sleep(SELECTOR_POLL).await;
                }
            }
            WaitStrategy::NetworkIdle => {
                match timeout(self.settings.navigation_timeout, page.wait_for_navigation()).await {
                    Ok(Ok(_)) => {}
                    Ok(Err(e)) => tracing::warn!("Load wait failed, continuing anyway: {}", e),
                    Err(_) => tracing::warn!("Network idle timeout, continuing anyway"),
                }
                sleep(self.settings.wait_after_idle).await;
            }
            WaitStrategy::None => {}
        }
    }
}

/// Tries the shared-browser render first, falling back to a fresh session
///
/// `fresh` only runs when there is no shared browser or the shared attempt
/// failed.
async fn shared_or_fresh<T, Shared, Fresh, FreshFut>(
    url: &Url,
    shared: Option<Shared>,
    fresh: Fresh,
) -> Result<T, BrowserError>
where
    Shared: Future<Output = Result<T, BrowserError>>,
    Fresh: FnOnce() -> FreshFut,
    FreshFut: Future<Output = Result<T, BrowserError>>,
{
    if let Some(shared) = shared {
        match shared.await {
            Ok(value) => return Ok(value),
            Err(e) => tracing::warn!(
                "Shared browser failed for {}, launching a fresh session: {}",
                url,
                e
            ),
        }
    }
    fresh().await
}

/// Scripted content source backed by a [`BrowserAdapter`]
#[derive(Clone)]
pub struct BrowserSource {
    adapter: BrowserAdapter,
}

impl BrowserSource {
    pub fn new(adapter: BrowserAdapter) -> Self {
        Self { adapter }
    }
}

#[async_trait]
impl ContentSource for BrowserSource {
    async fn retrieve(&self, request: &FetchRequest) -> Result<String, FetchError> {
        let wait = match &request.strategy {
            Strategy::Scripted { wait } => wait.clone(),
            Strategy::Plain => WaitStrategy::NetworkIdle,
        };

        self.adapter
            .render(&request.target, &wait)
            .await
            .map_err(|source| FetchError::Browser {
                url: request.target.to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_use_default_pools() {
        let settings = BrowserSettings::from_settings(&Settings::default());
        assert_eq!(settings.user_agents, default_user_agents());
        assert_eq!(settings.viewports, default_viewports());
        assert_eq!(settings.navigation_timeout, Duration::from_secs(60));
        assert!(settings.headless);
    }

    #[test]
    fn test_settings_pool_overrides() {
        let settings = Settings {
            user_agents: Some(vec!["Custom/1.0".to_string()]),
            viewports: Some(vec![Viewport {
                width: 800,
                height: 600,
            }]),
            ..Settings::default()
        };
        let browser = BrowserSettings::from_settings(&settings);
        assert_eq!(browser.user_agents, vec!["Custom/1.0".to_string()]);
        assert_eq!(browser.viewports.len(), 1);
    }

    fn target() -> Url {
        Url::parse("https://example.com/app").unwrap()
    }

    #[tokio::test]
    async fn test_shared_success_skips_fresh_session() {
        let launches = std::cell::Cell::new(0);
        let counter = &launches;
        let html = shared_or_fresh(
            &target(),
            Some(async { Ok::<_, BrowserError>("shared".to_string()) }),
            move || async move {
                counter.set(counter.get() + 1);
                Ok("fresh".to_string())
            },
        )
        .await
        .unwrap();

        assert_eq!(html, "shared");
        assert_eq!(launches.get(), 0);
    }

    #[tokio::test]
    async fn test_shared_failure_falls_back_to_fresh_session() {
        let html = shared_or_fresh(
            &target(),
            Some(async {
                Err::<String, _>(BrowserError::NavigationTimeout(Duration::from_secs(1)))
            }),
            || async { Ok("fresh".to_string()) },
        )
        .await
        .unwrap();

        assert_eq!(html, "fresh");
    }

    #[tokio::test]
    async fn test_without_shared_browser_launches_fresh() {
        let result = shared_or_fresh(
            &target(),
            None::<std::future::Ready<Result<String, BrowserError>>>,
            || async { Err::<String, _>(BrowserError::Config("no chrome".to_string())) },
        )
        .await;

        assert!(matches!(result, Err(BrowserError::Config(_))));
    }
}
