//! Job runner - executes the configured jobs of one scheduling run
//!
//! Each selected job is:
//! 1. Skipped if disabled, outside the tier/name filter, or outside its
//!    active hours
//! 2. Built through the registry
//! 3. Run, with its result persisted through the sink
//!
//! Every job ends up as a [`JobReport`]; a failing job never stops the jobs
//! after it.

use crate::cache::RefreshTier;
use crate::config::JobConfig;
use crate::jobs::{is_within_active_hours, JobContext, JobRegistry};
use crate::output::ResultSink;
use crate::JobError;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Which configured jobs a run considers
#[derive(Debug, Clone, Default)]
pub struct RunFilter {
    /// Only jobs of this tier
    pub tier: Option<RefreshTier>,
    /// Only the job with this name
    pub job: Option<String>,
}

impl RunFilter {
    pub fn matches(&self, config: &JobConfig) -> bool {
        self.tier.map_or(true, |tier| config.tier == tier)
            && self.job.as_deref().map_or(true, |name| config.name == name)
    }
}

/// How a job ended
#[derive(Debug)]
pub enum JobOutcome {
    /// The result was persisted at the given path
    Written(PathBuf),
    /// The job was not run
    Skipped(String),
    /// The job failed; nothing was written
    Failed(JobError),
}

/// Outcome of one job in a run
#[derive(Debug)]
pub struct JobReport {
    pub name: String,
    pub tier: RefreshTier,
    pub outcome: JobOutcome,
    pub elapsed: Duration,
}

impl JobReport {
    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, JobOutcome::Failed(_))
    }
}

/// Runs jobs one after another
pub struct JobRunner {
    registry: JobRegistry,
    context: JobContext,
    sink: Arc<dyn ResultSink>,
}

impl JobRunner {
    pub fn new(registry: JobRegistry, context: JobContext, sink: Arc<dyn ResultSink>) -> Self {
        Self {
            registry,
            context,
            sink,
        }
    }

    pub fn context(&self) -> &JobContext {
        &self.context
    }

    /// Lists the jobs a run would execute, without running them
    pub fn plan<'a>(&self, jobs: &'a [JobConfig], filter: &RunFilter) -> Vec<&'a JobConfig> {
        jobs.iter()
            .filter(|job| job.enabled && filter.matches(job))
            .collect()
    }

    /// Runs every selected job at the current time
    pub async fn run(&self, jobs: &[JobConfig], filter: &RunFilter) -> Vec<JobReport> {
        self.run_at(jobs, filter, Utc::now()).await
    }

    /// Runs every selected job as if the clock read `now`
    pub async fn run_at(
        &self,
        jobs: &[JobConfig],
        filter: &RunFilter,
        now: DateTime<Utc>,
    ) -> Vec<JobReport> {
        let mut reports = Vec::new();

        for config in jobs.iter().filter(|job| filter.matches(job)) {
            let started = Instant::now();
            let outcome = self.run_one(config, now).await;

            match &outcome {
                JobOutcome::Written(path) => {
                    tracing::info!("Job '{}' finished: {}", config.name, path.display())
                }
                JobOutcome::Skipped(reason) => {
                    tracing::info!("Job '{}' skipped: {}", config.name, reason)
                }
                JobOutcome::Failed(e) => tracing::error!("Job '{}' failed: {}", config.name, e),
            }

            reports.push(JobReport {
                name: config.name.clone(),
                tier: config.tier,
                outcome,
                elapsed: started.elapsed(),
            });
        }

        reports
    }

    async fn run_one(&self, config: &JobConfig, now: DateTime<Utc>) -> JobOutcome {
        if !config.enabled {
            return JobOutcome::Skipped("disabled".to_string());
        }

        let offset = self.context.settings.utc_offset_hours;
        if !is_within_active_hours(config.active_hours, now, offset) {
            return JobOutcome::Skipped("outside active hours".to_string());
        }

        let job = match self.registry.build(config) {
            Ok(job) => job,
            Err(e) => return JobOutcome::Failed(e),
        };

        tracing::info!("Running job '{}' ({})", config.name, config.kind);
        let value = match job.run(&self.context).await {
            Ok(value) => value,
            Err(e) => return JobOutcome::Failed(e),
        };

        match self.sink.write(config.tier, &config.output, &value) {
            Ok(path) => JobOutcome::Written(path),
            Err(e) => JobOutcome::Failed(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStore;
    use crate::config::{Settings, StrategyKind};
    use crate::fetch::{ContentSource, FetchRequest, Fetcher, RetryDelays};
    use crate::jobs::Job;
    use crate::output::OutputResult;
    use crate::FetchError;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use serde_json::{json, Value};
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct Offline;

    #[async_trait]
    impl ContentSource for Offline {
        async fn retrieve(&self, request: &FetchRequest) -> Result<String, FetchError> {
            Err(FetchError::Status {
                url: request.target.to_string(),
                status: 503,
            })
        }
    }

    /// Returns a fixed value, or fails when the job name says so
    struct Scripted(JobConfig);

    #[async_trait]
    impl Job for Scripted {
        fn config(&self) -> &JobConfig {
            &self.0
        }

        async fn run(&self, _ctx: &JobContext) -> Result<Value, JobError> {
            if self.0.name.starts_with("broken") {
                Err(JobError::Exhausted {
                    url: self.0.url.clone(),
                    attempts: 3,
                })
            } else {
                Ok(json!({"job": self.0.name}))
            }
        }
    }

    #[derive(Default)]
    struct MemorySink {
        written: Mutex<Vec<(RefreshTier, String, Value)>>,
    }

    impl ResultSink for MemorySink {
        fn write(&self, tier: RefreshTier, output: &str, value: &Value) -> OutputResult<PathBuf> {
            self.written
                .lock()
                .unwrap()
                .push((tier, output.to_string(), value.clone()));
            Ok(PathBuf::from(output))
        }
    }

    fn job(name: &str, tier: RefreshTier) -> JobConfig {
        JobConfig {
            name: name.to_string(),
            kind: "scripted".to_string(),
            url: "https://example.com/".to_string(),
            output: name.to_string(),
            tier,
            enabled: true,
            strategy: StrategyKind::Plain,
            wait_selector: None,
            known_results_url: None,
            dedupe_known: false,
            active_hours: None,
        }
    }

    fn runner(dir: &TempDir, sink: Arc<MemorySink>) -> JobRunner {
        let settings = Settings::default();
        let context = JobContext {
            fetcher: Fetcher::new(CacheStore::new(dir.path()), Arc::new(Offline)).with_delays(
                RetryDelays {
                    fixed: Duration::ZERO,
                    jitter: Duration::ZERO,
                },
            ),
            http: reqwest::Client::new(),
            root: dir.path().to_path_buf(),
            fresh: false,
            settings,
        };

        let mut registry = JobRegistry::with_defaults();
        registry.register("scripted", |config| Box::new(Scripted(config)));
        JobRunner::new(registry, context, sink)
    }

    fn noon_utc() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_siblings() {
        let dir = TempDir::new().unwrap();
        let sink = Arc::new(MemorySink::default());
        let runner = runner(&dir, sink.clone());

        let jobs = vec![
            job("first", RefreshTier::Daily),
            job("broken", RefreshTier::Daily),
            job("last", RefreshTier::Daily),
        ];
        let reports = runner.run_at(&jobs, &RunFilter::default(), noon_utc()).await;

        assert_eq!(reports.len(), 3);
        assert!(!reports[0].is_failure());
        assert!(reports[1].is_failure());
        assert!(matches!(reports[2].outcome, JobOutcome::Written(_)));

        let written = sink.written.lock().unwrap();
        let outputs: Vec<&str> = written.iter().map(|(_, o, _)| o.as_str()).collect();
        assert_eq!(outputs, vec!["first", "last"]);
    }

    #[tokio::test]
    async fn test_filter_and_skips() {
        let dir = TempDir::new().unwrap();
        let sink = Arc::new(MemorySink::default());
        let runner = runner(&dir, sink.clone());

        let mut disabled = job("disabled", RefreshTier::Hourly);
        disabled.enabled = false;
        // noon UTC is 19:00 at the default UTC+7
        let mut sleeping = job("sleeping", RefreshTier::Hourly);
        sleeping.active_hours = Some([6, 18]);
        let mut awake = job("awake", RefreshTier::Hourly);
        awake.active_hours = Some([19, 23]);

        let jobs = vec![disabled, sleeping, awake, job("weekly", RefreshTier::Weekly)];
        let filter = RunFilter {
            tier: Some(RefreshTier::Hourly),
            job: None,
        };
        let reports = runner.run_at(&jobs, &filter, noon_utc()).await;

        assert_eq!(reports.len(), 3);
        assert!(matches!(reports[0].outcome, JobOutcome::Skipped(_)));
        assert!(matches!(reports[1].outcome, JobOutcome::Skipped(_)));
        assert!(matches!(reports[2].outcome, JobOutcome::Written(_)));
        assert_eq!(sink.written.lock().unwrap().len(), 1);

        assert_eq!(runner.plan(&jobs, &filter).len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_kind_is_reported() {
        let dir = TempDir::new().unwrap();
        let runner = runner(&dir, Arc::new(MemorySink::default()));

        let mut config = job("mystery", RefreshTier::Daily);
        config.kind = "mystery".to_string();
        let filter = RunFilter {
            tier: None,
            job: Some("mystery".to_string()),
        };
        let reports = runner.run_at(&[config], &filter, noon_utc()).await;

        assert!(matches!(
            reports[0].outcome,
            JobOutcome::Failed(JobError::UnknownKind(_))
        ));
    }

    #[tokio::test]
    async fn test_exhausted_page_job_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let sink = Arc::new(MemorySink::default());
        let runner = runner(&dir, sink.clone());

        let mut config = job("page", RefreshTier::Daily);
        config.kind = "page".to_string();
        assert_eq!(runner.context().settings.retries, 3);

        let reports = runner
            .run_at(&[config], &RunFilter::default(), noon_utc())
            .await;

        assert!(matches!(
            reports[0].outcome,
            JobOutcome::Failed(JobError::Exhausted { attempts: 3, .. })
        ));
        assert!(sink.written.lock().unwrap().is_empty());
    }
}
