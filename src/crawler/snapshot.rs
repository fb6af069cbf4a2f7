use crate::url::snapshot_name;
use crate::CacheError;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// Raw detail pages of completed targets, named by URL slug and hash
///
/// A snapshot is the only evidence that a target was fetched in an earlier
/// run; its absence never implies the target failed.
#[derive(Debug, Clone)]
pub struct SnapshotArchive {
    dir: PathBuf,
}

impl SnapshotArchive {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns where the snapshot of `url` lives
    pub fn path_for(&self, url: &Url) -> PathBuf {
        self.dir.join(format!("{}.html", snapshot_name(url)))
    }

    pub fn save(&self, url: &Url, html: &str) -> Result<PathBuf, CacheError> {
        fs::create_dir_all(&self.dir).map_err(|e| CacheError::Io {
            path: self.dir.display().to_string(),
            source: e,
        })?;

        let path = self.path_for(url);
        fs::write(&path, html).map_err(|e| CacheError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(path)
    }

    /// Reads the snapshot of `url`, if one was saved and is readable
    pub fn load(&self, url: &Url) -> Option<String> {
        let path = self.path_for(url);
        match fs::read_to_string(&path) {
            Ok(html) => Some(html),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!("Cannot read snapshot {}: {}", path.display(), e);
                None
            }
        }
    }
}
