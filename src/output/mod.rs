//! Output module for persisting job results and reporting runs
//!
//! This module handles:
//! - Storing each job's structured result through a [`ResultSink`]
//! - Formatting a human-readable summary of a scheduling run

mod json;
mod summary;
mod traits;

pub use json::JsonFileSink;
pub use summary::format_run_summary;
pub use traits::{OutputError, OutputResult, ResultSink};
