//! A launched browser process and its CDP event loop

use crate::browser::stealth::{Fingerprint, LAUNCH_ARGS};
use crate::browser::BrowserSettings;
use crate::BrowserError;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::handler::viewport::Viewport as CdpViewport;
use futures::StreamExt;
use tokio::task::JoinHandle;

/// An isolated browser session, owned by one fetch
pub struct Session {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl Session {
    /// Launches a fresh browser with the session's fingerprint
    pub async fn launch(
        settings: &BrowserSettings,
        fingerprint: &Fingerprint,
    ) -> Result<Self, BrowserError> {
        let Fingerprint { viewport, .. } = fingerprint;

        let mut builder = BrowserConfig::builder()
            .window_size(viewport.width, viewport.height)
            .viewport(CdpViewport {
                width: viewport.width,
                height: viewport.height,
                device_scale_factor: None,
                emulating_mobile: false,
                is_landscape: false,
                has_touch: false,
            })
            .request_timeout(settings.navigation_timeout);

        if settings.stealth {
            builder = builder.args(LAUNCH_ARGS.iter().copied());
        }
        if !settings.headless {
            builder = builder.with_head();
        }

        let config = builder.build().map_err(BrowserError::Config)?;
        let (browser, mut handler) = Browser::launch(config).await?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        Ok(Self { browser, handler })
    }

    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    /// Shuts the browser down
    ///
    /// Errors are logged and swallowed so they never mask the outcome of
    /// the fetch that used the session.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::warn!("Failed to close browser: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            tracing::warn!("Failed to reap browser process: {}", e);
        }
        self.handler.abort();
    }
}
