use crate::cache::RefreshTier;
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Page-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    pub output: OutputConfig,
    #[serde(default, rename = "job")]
    pub jobs: Vec<JobConfig>,
}

/// Fetch, retry and browser behavior shared by every job
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Settings {
    /// Attempts per fetch before giving up
    pub retries: u32,

    /// Fixed delay between plain HTTP retries (seconds)
    pub delay: f64,

    /// Plain HTTP request timeout (seconds)
    pub timeout: f64,

    /// Run the browser without a visible window
    pub headless: bool,

    /// Browser navigation timeout (milliseconds)
    #[serde(alias = "pw_timeout")]
    pub pw_timeout: u64,

    /// Hide automation fingerprints in the browser
    pub stealth: bool,

    /// Base of the geometric backoff used by scripted fetches (seconds)
    pub backoff_base: f64,

    /// Upper bound of the random jitter added to scripted backoff (seconds)
    pub backoff_jitter: f64,

    /// Responses shorter than this many characters count as failures
    pub min_content_length: usize,

    /// Pause between crawl targets (seconds)
    pub polite_delay: f64,

    /// Upper bound of the random jitter added to the polite delay (seconds)
    pub polite_jitter: f64,

    /// Perform mouse and scroll activity before reading the page
    pub humanize: bool,

    /// Extra settle time after the network-idle wait (seconds)
    pub wait_after_idle: f64,

    /// Offset applied to UTC when checking job active hours
    pub utc_offset_hours: i32,

    /// User agent pool override
    pub user_agents: Option<Vec<String>>,

    /// Viewport pool override
    pub viewports: Option<Vec<Viewport>>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            retries: 3,
            delay: 5.0,
            timeout: 15.0,
            headless: true,
            pw_timeout: 60_000,
            stealth: true,
            backoff_base: 1.0,
            backoff_jitter: 0.5,
            min_content_length: 200,
            polite_delay: 1.0,
            polite_jitter: 0.6,
            humanize: true,
            wait_after_idle: 0.8,
            utc_offset_hours: 7,
            user_agents: None,
            viewports: None,
        }
    }
}

impl Settings {
    pub fn retry_delay(&self) -> Duration {
        secs(self.delay)
    }

    pub fn request_timeout(&self) -> Duration {
        secs(self.timeout)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.pw_timeout)
    }

    pub fn backoff_base(&self) -> Duration {
        secs(self.backoff_base)
    }

    pub fn backoff_jitter(&self) -> Duration {
        secs(self.backoff_jitter)
    }

    pub fn polite_delay(&self) -> Duration {
        secs(self.polite_delay)
    }

    pub fn polite_jitter(&self) -> Duration {
        secs(self.polite_jitter)
    }

    pub fn wait_after_idle(&self) -> Duration {
        secs(self.wait_after_idle)
    }
}

/// Converts seconds to a duration, saturating instead of panicking
fn secs(value: f64) -> Duration {
    if value.is_nan() || value <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(value).unwrap_or(Duration::MAX)
}

/// Browser window dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Root directory for caches, checkpoints and structured output
    pub root: String,
}

/// How a job's pages are retrieved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    #[default]
    Plain,
    Scripted,
}

/// A single named job
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct JobConfig {
    /// Unique job name used in reports and on the CLI
    pub name: String,

    /// Registered constructor key (e.g. "page", "event-crawl")
    pub kind: String,

    /// Target URL (index page for crawls)
    pub url: String,

    /// Output identifier; names cache and output files
    pub output: String,

    /// Refresh tier; decides cache TTL and output directory
    #[serde(default)]
    pub tier: RefreshTier,

    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Strategy used for the job's detail fetches
    #[serde(default)]
    pub strategy: StrategyKind,

    /// CSS selector to wait for in scripted fetches
    pub wait_selector: Option<String>,

    /// JSON document of previously published results
    pub known_results_url: Option<String>,

    /// Skip discovered targets already present in the known results
    #[serde(default)]
    pub dedupe_known: bool,

    /// Inclusive local-hour window in which the job may run
    pub active_hours: Option<[u32; 2]>,
}

fn default_true() -> bool {
    true
}
