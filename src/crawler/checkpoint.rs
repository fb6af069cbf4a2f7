//! Crawl progress persistence
//!
//! One small JSON record per crawl job, `{"last_index": n, "total": t}`,
//! rewritten after every target. A missing or unreadable record means the
//! crawl starts from the beginning.

use crate::CacheError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const PROGRESS_FILE: &str = "progress.json";

/// How far an ordered crawl has come
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlProgress {
    /// 1-based index of the last completed target (0 = none)
    pub last_index: usize,
    pub total: usize,
}

impl CrawlProgress {
    pub fn new(last_index: usize, total: usize) -> Self {
        Self { last_index, total }
    }

    /// Checks if the target at 1-based `index` was completed earlier
    pub fn is_done(&self, index: usize) -> bool {
        index <= self.last_index
    }

    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.last_index >= self.total
    }
}

/// Reads and writes the progress record of one crawl job
#[derive(Debug, Clone)]
pub struct ProgressStore {
    path: PathBuf,
}

impl ProgressStore {
    /// Stores progress as `progress.json` inside `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(PROGRESS_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the saved progress, defaulting to `{0, 0}`
    pub fn load(&self) -> CrawlProgress {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return CrawlProgress::default();
            }
            Err(e) => {
                tracing::warn!("Cannot read progress {}: {}", self.path.display(), e);
                return CrawlProgress::default();
            }
        };

        match serde_json::from_str::<CrawlProgress>(&raw) {
            Ok(progress) => progress,
            Err(e) => {
                tracing::warn!("Ignoring corrupt progress {}: {}", self.path.display(), e);
                CrawlProgress::default()
            }
        }
    }

    /// Persists `progress`, replacing the previous record
    ///
    /// The record is written to a temporary file and renamed into place so
    /// an interrupted write never leaves a truncated checkpoint.
    pub fn save(&self, progress: CrawlProgress) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }

        let body = serde_json::to_string(&progress).map_err(|e| CacheError::Serialize {
            path: self.path.display().to_string(),
            source: e,
        })?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body).map_err(|e| io_error(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| io_error(&self.path, e))?;
        Ok(())
    }

    /// Removes the progress record so the next run starts over
    pub fn clear(&self) -> Result<(), CacheError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&self.path, e)),
        }
    }
}

fn io_error(path: &Path, source: std::io::Error) -> CacheError {
    CacheError::Io {
        path: path.display().to_string(),
        source,
    }
}
