//! Output sink trait and errors
//!
//! A sink receives the structured value produced by one job, keyed by the
//! job's output identifier and refresh tier, and is responsible for storing
//! it. The engine never reads its own output back.

use crate::cache::RefreshTier;
use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to format output: {0}")]
    Format(#[from] serde_json::Error),

    #[error("Invalid output identifier '{0}'")]
    InvalidIdentifier(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Trait for output sinks
///
/// Implementations must be thread-safe.
pub trait ResultSink: Send + Sync {
    /// Persists `value` under `output` for the given tier
    ///
    /// # Arguments
    ///
    /// * `tier` - Refresh tier of the job that produced the value
    /// * `output` - The job's output identifier
    /// * `value` - The structured result
    ///
    /// # Returns
    ///
    /// Where the value was stored
    fn write(&self, tier: RefreshTier, output: &str, value: &Value) -> OutputResult<PathBuf>;
}
