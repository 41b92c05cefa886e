//! Durable key-value preferences.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::error::StorageError;

/// String key-value store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Get the value for `key`, or `None` if it was never set.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Set `key` to `value`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// In-process preferences. Not persisted across restarts.
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferences {
    values: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryPreferences {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Preferences persisted as a single JSON object file.
///
/// Writes go to a sibling temp file which is then renamed over the target.
pub struct JsonFilePreferences {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFilePreferences {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<HashMap<String, String>, StorageError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(StorageError::io(self.path.display().to_string(), e)),
        };

        if raw.trim().is_empty() {
            return Ok(HashMap::new());
        }

        match serde_json::from_str(&raw) {
            Ok(values) => Ok(values),
            Err(e) => {
                warn!(
                    "Preferences file {} is corrupt ({}), starting empty",
                    self.path.display(),
                    e
                );
                Ok(HashMap::new())
            }
        }
    }
}

#[async_trait]
impl KeyValueStore for JsonFilePreferences {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;

        let mut values = self.load().await?;
        values.insert(key.to_string(), value.to_string());
        let serialized = serde_json::to_string_pretty(&values)?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::io(parent.display().to_string(), e))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serialized)
            .await
            .map_err(|e| StorageError::io(tmp.display().to_string(), e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StorageError::io(self.path.display().to_string(), e))?;

        debug!("Saved preference '{}' to {}", key, self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_memory_get_missing() {
        let prefs = MemoryPreferences::new();
        assert_eq!(prefs.get("photos").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_set_overwrites() {
        let prefs = MemoryPreferences::new();
        prefs.set("photos", "[]").await.unwrap();
        prefs.set("photos", "[1]").await.unwrap();
        assert_eq!(prefs.get("photos").await.unwrap().as_deref(), Some("[1]"));
    }

    #[tokio::test]
    async fn test_json_file_persists_across_instances() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.json");

        JsonFilePreferences::new(&path)
            .set("photos", "[]")
            .await
            .unwrap();

        let reopened = JsonFilePreferences::new(&path);
        assert_eq!(reopened.get("photos").await.unwrap().as_deref(), Some("[]"));
        assert_eq!(reopened.get("other").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_json_file_keeps_other_keys() {
        let dir = tempdir().unwrap();
        let prefs = JsonFilePreferences::new(dir.path().join("prefs.json"));

        prefs.set("a", "1").await.unwrap();
        prefs.set("b", "2").await.unwrap();

        assert_eq!(prefs.get("a").await.unwrap().as_deref(), Some("1"));
        assert_eq!(prefs.get("b").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_json_file_corrupt_reads_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "{not json").unwrap();

        let prefs = JsonFilePreferences::new(&path);
        assert_eq!(prefs.get("photos").await.unwrap(), None);
    }
}
