use crate::config::types::{Config, JobConfig, OutputConfig, Settings};
use crate::ConfigError;
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

/// Longest delay or timeout accepted for any second-valued setting (one day)
const MAX_SECONDS: f64 = 86_400.0;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_settings(&config.settings)?;
    validate_output_config(&config.output)?;
    validate_jobs(&config.jobs)?;
    Ok(())
}

/// Validates fetch and browser settings
fn validate_settings(settings: &Settings) -> Result<(), ConfigError> {
    if settings.retries < 1 {
        return Err(ConfigError::Validation(format!(
            "retries must be >= 1, got {}",
            settings.retries
        )));
    }

    for (name, value) in [
        ("delay", settings.delay),
        ("timeout", settings.timeout),
        ("backoff-base", settings.backoff_base),
        ("backoff-jitter", settings.backoff_jitter),
        ("polite-delay", settings.polite_delay),
        ("polite-jitter", settings.polite_jitter),
        ("wait-after-idle", settings.wait_after_idle),
    ] {
        if Duration::try_from_secs_f64(value).is_err() || value > MAX_SECONDS {
            return Err(ConfigError::Validation(format!(
                "{} must be between 0 and {} seconds, got {}",
                name, MAX_SECONDS, value
            )));
        }
    }

    if settings.timeout == 0.0 || settings.pw_timeout == 0 {
        return Err(ConfigError::Validation(
            "timeouts must be greater than zero".to_string(),
        ));
    }

    if !(-12..=14).contains(&settings.utc_offset_hours) {
        return Err(ConfigError::Validation(format!(
            "utc-offset-hours must be between -12 and 14, got {}",
            settings.utc_offset_hours
        )));
    }

    if let Some(pool) = &settings.user_agents {
        if pool.is_empty() || pool.iter().any(|ua| ua.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "user-agents must contain at least one non-empty entry".to_string(),
            ));
        }
    }

    if let Some(pool) = &settings.viewports {
        if pool.is_empty() || pool.iter().any(|vp| vp.width == 0 || vp.height == 0) {
            return Err(ConfigError::Validation(
                "viewports must contain at least one non-zero entry".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.root.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output root cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates job entries
fn validate_jobs(jobs: &[JobConfig]) -> Result<(), ConfigError> {
    let mut names = HashSet::new();

    for job in jobs {
        if job.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "job name cannot be empty".to_string(),
            ));
        }

        if !names.insert(job.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate job name '{}'",
                job.name
            )));
        }

        if job.kind.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "job '{}' must declare a kind",
                job.name
            )));
        }

        if job.output.trim().is_empty()
            || job.output.contains('/')
            || job.output.contains('\\')
        {
            return Err(ConfigError::Validation(format!(
                "job '{}' has an invalid output identifier '{}'",
                job.name, job.output
            )));
        }

        validate_http_url(&job.url, &job.name)?;
        if let Some(known) = &job.known_results_url {
            validate_http_url(known, &job.name)?;
        }

        if let Some([start, end]) = job.active_hours {
            if start > 23 || end > 23 || start > end {
                return Err(ConfigError::Validation(format!(
                    "job '{}' has invalid active hours [{}, {}]",
                    job.name, start, end
                )));
            }
        }
    }

    Ok(())
}

fn validate_http_url(raw: &str, job: &str) -> Result<(), ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidUrl(format!("job '{}': '{}': {}", job, raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "job '{}': '{}' must use http or https",
            job, raw
        )));
    }
    Ok(())
}
