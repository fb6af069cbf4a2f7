use crate::cache::RefreshTier;
use crate::output::traits::{OutputError, OutputResult, ResultSink};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Writes each job's result as pretty JSON under `<root>/<tier>/json/`
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    root: PathBuf,
}

impl JsonFileSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the file a job's output is written to
    pub fn path_for(&self, tier: RefreshTier, output: &str) -> PathBuf {
        self.root
            .join(tier.as_str())
            .join("json")
            .join(format!("{}.json", output))
    }
}

impl ResultSink for JsonFileSink {
    fn write(&self, tier: RefreshTier, output: &str, value: &Value) -> OutputResult<PathBuf> {
        if output.is_empty() || output.contains(['/', '\\']) || output.starts_with('.') {
            return Err(OutputError::InvalidIdentifier(output.to_string()));
        }

        let path = self.path_for(tier, output);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }

        let body = serde_json::to_string_pretty(value)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, body).map_err(|e| io_error(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| io_error(&path, e))?;

        tracing::info!("Wrote {}", path.display());
        Ok(path)
    }
}

fn io_error(path: &Path, source: std::io::Error) -> OutputError {
    OutputError::Io {
        path: path.display().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_write_layout() {
        let dir = TempDir::new().unwrap();
        let sink = JsonFileSink::new(dir.path());

        let path = sink
            .write(RefreshTier::Hourly, "raids", &json!({"results": []}))
            .unwrap();

        assert_eq!(path, dir.path().join("hourly").join("json").join("raids.json"));
        let written: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, json!({"results": []}));
    }

    #[test]
    fn test_overwrite() {
        let dir = TempDir::new().unwrap();
        let sink = JsonFileSink::new(dir.path());

        sink.write(RefreshTier::Daily, "events", &json!({"v": 1})).unwrap();
        let path = sink.write(RefreshTier::Daily, "events", &json!({"v": 2})).unwrap();

        let written: Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(written["v"], 2);
    }

    #[test]
    fn test_rejects_path_like_identifiers() {
        let dir = TempDir::new().unwrap();
        let sink = JsonFileSink::new(dir.path());

        for bad in ["", "../escape", "a/b", ".hidden"] {
            assert!(matches!(
                sink.write(RefreshTier::Daily, bad, &json!({})),
                Err(OutputError::InvalidIdentifier(_))
            ));
        }
    }
}
