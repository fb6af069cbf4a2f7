//! Markdown summary of a scheduling run
//!
//! Rendered at the end of every CLI run so an operator sees, per job,
//! whether it wrote output, was skipped, or failed (and why).

use crate::jobs::{JobOutcome, JobReport};

/// Formats the reports of one run as a markdown document
///
/// # Arguments
///
/// * `reports` - One report per considered job, in run order
///
/// # Returns
///
/// A markdown string with totals and a per-job table
pub fn format_run_summary(reports: &[JobReport]) -> String {
    let written = count(reports, |o| matches!(o, JobOutcome::Written(_)));
    let skipped = count(reports, |o| matches!(o, JobOutcome::Skipped(_)));
    let failed = count(reports, |o| matches!(o, JobOutcome::Failed(_)));

    let mut md = String::new();

    md.push_str("# Harvest Run Summary\n\n");
    md.push_str(&format!("- **Jobs**: {}\n", reports.len()));
    md.push_str(&format!("- **Written**: {}\n", written));
    md.push_str(&format!("- **Skipped**: {}\n", skipped));
    md.push_str(&format!("- **Failed**: {}\n\n", failed));

    if reports.is_empty() {
        md.push_str("No jobs matched.\n");
        return md;
    }

    md.push_str("| Job | Tier | Result | Time |\n");
    md.push_str("|-----|------|--------|------|\n");
    for report in reports {
        md.push_str(&format!(
            "| {} | {} | {} | {:.1}s |\n",
            report.name,
            report.tier,
            describe(&report.outcome),
            report.elapsed.as_secs_f64()
        ));
    }

    md
}

fn count(reports: &[JobReport], predicate: impl Fn(&JobOutcome) -> bool) -> usize {
    reports.iter().filter(|r| predicate(&r.outcome)).count()
}

fn describe(outcome: &JobOutcome) -> String {
    // Table cells cannot contain pipes
    let text = match outcome {
        JobOutcome::Written(path) => format!("written to {}", path.display()),
        JobOutcome::Skipped(reason) => format!("skipped ({})", reason),
        JobOutcome::Failed(e) => format!("FAILED: {}", e),
    };
    text.replace('|', "/")
}
