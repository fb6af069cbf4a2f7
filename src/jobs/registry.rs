use crate::config::JobConfig;
use crate::jobs::{EventCrawlJob, Job, SinglePageJob};
use crate::JobError;
use std::collections::BTreeMap;

/// Builds a job from its configuration
pub type JobConstructor = Box<dyn Fn(JobConfig) -> Box<dyn Job> + Send + Sync>;

/// Explicit table of job kinds, filled at startup
///
/// # Example
///
/// ```
/// use page_harvest::jobs::JobRegistry;
///
/// let registry = JobRegistry::with_defaults();
/// assert!(registry.contains("page"));
/// assert!(registry.contains("event-crawl"));
/// ```
#[derive(Default)]
pub struct JobRegistry {
    constructors: BTreeMap<String, JobConstructor>,
}

impl JobRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in job kinds
    ///
    /// | Kind | Job |
    /// |------|-----|
    /// | `page` | [`SinglePageJob`] |
    /// | `event-crawl` | [`EventCrawlJob`] |
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("page", |config| Box::new(SinglePageJob::new(config)));
        registry.register("event-crawl", |config| Box::new(EventCrawlJob::new(config)));
        registry
    }

    /// Registers (or replaces) the constructor for `kind`
    pub fn register<F>(&mut self, kind: &str, constructor: F)
    where
        F: Fn(JobConfig) -> Box<dyn Job> + Send + Sync + 'static,
    {
        self.constructors
            .insert(kind.to_string(), Box::new(constructor));
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.constructors.contains_key(kind)
    }

    /// Registered kinds in sorted order
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    /// Builds the job described by `config`
    pub fn build(&self, config: &JobConfig) -> Result<Box<dyn Job>, JobError> {
        let constructor = self
            .constructors
            .get(&config.kind)
            .ok_or_else(|| JobError::UnknownKind(config.kind.clone()))?;
        Ok(constructor(config.clone()))
    }
}
