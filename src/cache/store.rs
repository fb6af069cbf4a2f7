//! File-backed cache of fetched documents
//!
//! Every entry is two files: `<path>` holding the content and
//! `<path>.metadata` holding a small JSON record with the creation time.
//! An entry only counts when both files exist, the metadata parses, and the
//! entry is no older than the caller's TTL.

use crate::CacheError;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const METADATA_SUFFIX: &str = ".metadata";

/// Sidecar record written next to every cached file
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CacheMetadata {
    /// Unix timestamp (seconds) of the write
    pub created_time: i64,
}

impl CacheMetadata {
    pub fn now() -> Self {
        Self {
            created_time: Utc::now().timestamp(),
        }
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.created_time, 0).single()
    }

    /// Returns how long ago the entry was written
    ///
    /// `None` when the timestamp is unrepresentable or lies in the future;
    /// such a sidecar is invalid rather than fresh.
    pub fn age(&self) -> Option<ChronoDuration> {
        let age = Utc::now().signed_duration_since(self.created_at()?);
        (age >= ChronoDuration::zero()).then_some(age)
    }

    /// Checks if the entry is older than `ttl`
    ///
    /// Invalid metadata is always stale.
    pub fn is_stale(&self, ttl: Duration) -> bool {
        let Some(age) = self.age() else {
            return true;
        };
        match ChronoDuration::from_std(ttl) {
            Ok(ttl) => age > ttl,
            // a TTL too large to represent never expires
            Err(_) => false,
        }
    }
}

/// A fresh cache hit
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub path: PathBuf,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Path-namespaced document cache rooted at a directory
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves `path` against the cache root (absolute paths are kept)
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        self.root.join(path)
    }

    /// Writes content, then its metadata record
    ///
    /// Parent directories are created as needed. I/O errors are returned to
    /// the caller and never retried here.
    pub fn put(&self, path: impl AsRef<Path>, content: &str) -> Result<(), CacheError> {
        let path = self.resolve(path);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }
        fs::write(&path, content).map_err(|e| io_error(&path, e))?;

        let meta_path = metadata_path(&path);
        let meta = serde_json::to_string_pretty(&CacheMetadata::now()).map_err(|e| {
            CacheError::Serialize {
                path: meta_path.display().to_string(),
                source: e,
            }
        })?;
        fs::write(&meta_path, meta).map_err(|e| io_error(&meta_path, e))?;

        tracing::debug!("Cached {} ({} chars)", path.display(), content.len());
        Ok(())
    }

    /// Serializes `value` as JSON and stores it like [`CacheStore::put`]
    pub fn put_json<T: Serialize>(
        &self,
        path: impl AsRef<Path>,
        value: &T,
    ) -> Result<(), CacheError> {
        let path = path.as_ref();
        let body = serde_json::to_string_pretty(value).map_err(|e| CacheError::Serialize {
            path: self.resolve(path).display().to_string(),
            source: e,
        })?;
        self.put(path, &body)
    }

    /// Returns the cached entry if it exists, is readable and is fresh
    ///
    /// Any problem is logged and reported as a miss.
    pub fn load(&self, path: impl AsRef<Path>, ttl: Duration) -> Option<CacheEntry> {
        let path = self.resolve(path);
        let meta_path = metadata_path(&path);

        if !path.is_file() || !meta_path.is_file() {
            tracing::trace!("Cache miss for {}", path.display());
            return None;
        }

        let meta = match read_metadata(&meta_path) {
            Ok(meta) => meta,
            Err(e) => {
                tracing::warn!("Ignoring cache entry {}: {}", path.display(), e);
                return None;
            }
        };

        let (Some(created_at), Some(age)) = (meta.created_at(), meta.age()) else {
            tracing::warn!(
                "Ignoring cache entry {}: invalid creation time {}",
                path.display(),
                meta.created_time
            );
            return None;
        };

        if meta.is_stale(ttl) {
            tracing::debug!(
                "Cache entry {} expired (age={}s)",
                path.display(),
                age.num_seconds()
            );
            return None;
        }

        match fs::read_to_string(&path) {
            Ok(content) => {
                tracing::debug!(
                    "Loaded cached {} (age={}s)",
                    path.display(),
                    age.num_seconds()
                );
                Some(CacheEntry {
                    path,
                    content,
                    created_at,
                })
            }
            Err(e) => {
                tracing::warn!("Failed to read cache entry {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Returns cached content if fresh, otherwise `None`
    pub fn get(&self, path: impl AsRef<Path>, ttl: Duration) -> Option<String> {
        self.load(path, ttl).map(|entry| entry.content)
    }

    /// Returns a fresh cached JSON value; undecodable content is a miss
    pub fn get_json<T: DeserializeOwned>(&self, path: impl AsRef<Path>, ttl: Duration) -> Option<T> {
        let entry = self.load(path, ttl)?;
        match serde_json::from_str(&entry.content) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Ignoring cached JSON {}: {}", entry.path.display(), e);
                None
            }
        }
    }
}

/// Returns the sidecar path for a cached file
pub fn metadata_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(METADATA_SUFFIX);
    PathBuf::from(name)
}

fn read_metadata(path: &Path) -> Result<CacheMetadata, String> {
    let raw = fs::read_to_string(path).map_err(|e| e.to_string())?;
    serde_json::from_str(&raw).map_err(|e| e.to_string())
}

fn io_error(path: &Path, source: std::io::Error) -> CacheError {
    CacheError::Io {
        path: path.display().to_string(),
        source,
    }
}
