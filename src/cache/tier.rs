use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Refresh window of a job's pipeline
///
/// The tier decides how long cached content stays fresh and which output
/// sub-directory the job writes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshTier {
    Hourly,
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl RefreshTier {
    pub const ALL: [RefreshTier; 4] = [
        RefreshTier::Hourly,
        RefreshTier::Daily,
        RefreshTier::Weekly,
        RefreshTier::Monthly,
    ];

    /// Maximum age for which cached content of this tier is fresh
    pub fn ttl(&self) -> Duration {
        const HOUR: u64 = 60 * 60;
        match self {
            Self::Hourly => Duration::from_secs(HOUR),
            Self::Daily => Duration::from_secs(24 * HOUR),
            Self::Weekly => Duration::from_secs(7 * 24 * HOUR),
            Self::Monthly => Duration::from_secs(30 * 24 * HOUR),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

impl fmt::Display for RefreshTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RefreshTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tier| tier.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown refresh tier '{}'", s))
    }
}
