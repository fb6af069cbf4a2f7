//! Page-Harvest main entry point
//!
//! This is the command-line interface for the Page-Harvest scheduler.

use anyhow::Context;
use clap::Parser;
use page_harvest::cache::RefreshTier;
use page_harvest::config::{load_config_with_hash, Config};
use page_harvest::jobs::{JobContext, JobRegistry, JobRunner, RunFilter};
use page_harvest::output::{format_run_summary, JsonFileSink};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Page-Harvest: a cached, resumable page scraper
///
/// Page-Harvest runs the jobs defined in a TOML file, caches every page it
/// fetches, and writes one JSON document per job under the output root.
#[derive(Parser, Debug)]
#[command(name = "page-harvest")]
#[command(version)]
#[command(about = "A cached, resumable page scraper", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Only run jobs of this refresh tier (hourly, daily, weekly, monthly)
    #[arg(long)]
    tier: Option<RefreshTier>,

    /// Only run the job with this name
    #[arg(long)]
    job: Option<String>,

    /// Discard crawl checkpoints and start every crawl from the beginning
    #[arg(long)]
    fresh: bool,

    /// Validate config and list the jobs that would run, without running them
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let filter = RunFilter {
        tier: cli.tier,
        job: cli.job.clone(),
    };

    if cli.dry_run {
        handle_dry_run(&config, &filter);
        return Ok(());
    }

    handle_run(config, &filter, cli.fresh).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("page_harvest=info,warn"),
            1 => EnvFilter::new("page_harvest=debug,info"),
            2 => EnvFilter::new("page_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the settings and the selected jobs
fn handle_dry_run(config: &Config, filter: &RunFilter) {
    println!("=== Page-Harvest Dry Run ===\n");

    println!("Settings:");
    println!("  Retries: {}", config.settings.retries);
    println!("  Retry delay: {}s", config.settings.delay);
    println!("  Request timeout: {}s", config.settings.timeout);
    println!("  Headless: {}", config.settings.headless);
    println!("  Stealth: {}", config.settings.stealth);
    println!("  UTC offset: {:+}h", config.settings.utc_offset_hours);

    println!("\nOutput root: {}", config.output.root);

    let selected: Vec<_> = config
        .jobs
        .iter()
        .filter(|job| job.enabled && filter.matches(job))
        .collect();

    println!("\nJobs ({} of {}):", selected.len(), config.jobs.len());
    for job in selected {
        println!("  - {} [{} / {}] {}", job.name, job.kind, job.tier, job.url);
        if let Some([start, end]) = job.active_hours {
            println!("    active {:02}:00-{:02}:59", start, end);
        }
    }

    println!("\nConfiguration is valid.");
}

/// Runs the selected jobs and prints the run summary
async fn handle_run(config: Config, filter: &RunFilter, fresh: bool) -> anyhow::Result<()> {
    let root = PathBuf::from(&config.output.root);
    let context = JobContext::new(config.settings.clone(), &root)
        .context("failed to set up job context")?
        .with_fresh(fresh);

    let runner = JobRunner::new(
        JobRegistry::with_defaults(),
        context,
        Arc::new(JsonFileSink::new(&root)),
    );

    let reports = runner.run(&config.jobs, filter).await;
    println!("{}", format_run_summary(&reports));

    let failed = reports.iter().filter(|r| r.is_failure()).count();
    if failed > 0 {
        anyhow::bail!("{} of {} jobs failed", failed, reports.len());
    }

    Ok(())
}
