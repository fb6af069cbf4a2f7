//! Fingerprint randomization and automation-flag suppression

use crate::config::Viewport;
use rand::seq::SliceRandom;

/// Hides `navigator.webdriver` before any page script runs
pub const STEALTH_SCRIPT: &str =
    "Object.defineProperty(navigator, 'webdriver', {get: () => undefined})";

/// Extra Chromium flags applied to every launch
pub const LAUNCH_ARGS: &[&str] = &[
    "--disable-blink-features=AutomationControlled",
    "--disable-infobars",
    "--no-sandbox",
    "--disable-gpu",
    "--disable-dev-shm-usage",
];

pub const LOCALE: &str = "en-US";
pub const TIMEZONE: &str = "Etc/UTC";

pub fn default_user_agents() -> Vec<String> {
    [
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 13_5) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    ]
    .iter()
    .map(|ua| ua.to_string())
    .collect()
}

pub fn default_viewports() -> Vec<Viewport> {
    [(1366, 768), (1440, 900), (1536, 864), (1600, 900), (1920, 1080)]
        .iter()
        .map(|&(width, height)| Viewport { width, height })
        .collect()
}

/// The identity a single browser session presents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    pub user_agent: String,
    pub viewport: Viewport,
}

impl Fingerprint {
    /// Draws a user agent and a viewport at random from the pools
    ///
    /// Empty pools fall back to the built-in defaults.
    pub fn random(user_agents: &[String], viewports: &[Viewport]) -> Self {
        let mut rng = rand::thread_rng();

        let user_agent = user_agents
            .choose(&mut rng)
            .cloned()
            .or_else(|| default_user_agents().choose(&mut rng).cloned())
            .unwrap_or_default();
        let viewport = viewports
            .choose(&mut rng)
            .copied()
            .unwrap_or(Viewport {
                width: 1366,
                height: 768,
            });

        Self {
            user_agent,
            viewport,
        }
    }
}
