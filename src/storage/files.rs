//! Binary file storage keyed by path and storage area.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::data_url::split_data_url;
use crate::error::StorageError;

/// Storage area a relative path is resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Directory {
    /// Private application data (where captures are written).
    Data,
    /// User-visible documents.
    Documents,
    /// Disposable cache.
    Cache,
}

impl Directory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Directory::Data => "data",
            Directory::Documents => "documents",
            Directory::Cache => "cache",
        }
    }
}

impl std::fmt::Display for Directory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFile {
    /// URI of the written file.
    pub uri: String,
}

/// Contents of a read, base64-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileData {
    pub data: String,
}

/// Durable binary storage.
///
/// Data crosses this boundary as base64 text: writes accept plain base64 or a
/// base64 data URL, reads return plain base64.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Write `data` to `path` inside `directory`.
    async fn write_file(
        &self,
        path: &str,
        data: &str,
        directory: Directory,
    ) -> Result<WrittenFile, StorageError>;

    /// Read `path`. Without a directory, `path` is an absolute path or a
    /// `file://` URI.
    async fn read_file(
        &self,
        path: &str,
        directory: Option<Directory>,
    ) -> Result<FileData, StorageError>;
}

/// File storage on the local filesystem.
///
/// Each [`Directory`] maps to a subfolder of the root.
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let root = if root.is_absolute() {
            root
        } else {
            std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(root)
        };
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a path/URI and optional storage area to a filesystem path.
    pub fn resolve(&self, path: &str, directory: Option<Directory>) -> Result<PathBuf, StorageError> {
        if path.starts_with("file://") {
            let url = Url::parse(path)
                .map_err(|e| StorageError::InvalidData(format!("{}: {}", path, e)))?;
            return url
                .to_file_path()
                .map_err(|_| StorageError::InvalidData(format!("not a local file URI: {}", path)));
        }

        match directory {
            Some(dir) => {
                let relative = Path::new(path);
                if relative.is_absolute()
                    || relative
                        .components()
                        .any(|c| matches!(c, std::path::Component::ParentDir))
                {
                    return Err(StorageError::InvalidData(format!(
                        "path escapes {} area: {}",
                        dir, path
                    )));
                }
                Ok(self.root.join(dir.as_str()).join(relative))
            }
            None => Ok(PathBuf::from(path)),
        }
    }
}

fn decode_payload(data: &str) -> Result<Vec<u8>, StorageError> {
    let payload = split_data_url(data).map(|(_, p)| p).unwrap_or(data);
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| StorageError::InvalidData(format!("invalid base64 payload: {}", e)))
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn write_file(
        &self,
        path: &str,
        data: &str,
        directory: Directory,
    ) -> Result<WrittenFile, StorageError> {
        let target = self.resolve(path, Some(directory))?;
        let bytes = decode_payload(data)?;

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::io(parent.display().to_string(), e))?;
        }
        tokio::fs::write(&target, &bytes)
            .await
            .map_err(|e| StorageError::io(target.display().to_string(), e))?;

        debug!("Wrote {} bytes to {}", bytes.len(), target.display());

        let uri = Url::from_file_path(&target)
            .map_err(|_| StorageError::InvalidData(target.display().to_string()))?;
        Ok(WrittenFile {
            uri: uri.to_string(),
        })
    }

    async fn read_file(
        &self,
        path: &str,
        directory: Option<Directory>,
    ) -> Result<FileData, StorageError> {
        let target = self.resolve(path, directory)?;
        let bytes = tokio::fs::read(&target)
            .await
            .map_err(|e| StorageError::io(target.display().to_string(), e))?;
        Ok(FileData {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_write_then_read_data_area() {
        let dir = tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path());

        let written = storage
            .write_file("1.jpeg", "aGVsbG8=", Directory::Data)
            .await
            .unwrap();
        assert!(written.uri.starts_with("file://"));
        assert!(written.uri.ends_with("/data/1.jpeg"));

        let on_disk = std::fs::read(dir.path().join("data").join("1.jpeg")).unwrap();
        assert_eq!(on_disk, b"hello");

        let read = storage
            .read_file("1.jpeg", Some(Directory::Data))
            .await
            .unwrap();
        assert_eq!(read.data, "aGVsbG8=");
    }

    #[tokio::test]
    async fn test_write_accepts_data_url() {
        let dir = tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path());

        storage
            .write_file("2.jpeg", "data:image/jpeg;base64,aGVsbG8=", Directory::Data)
            .await
            .unwrap();

        let on_disk = std::fs::read(dir.path().join("data").join("2.jpeg")).unwrap();
        assert_eq!(on_disk, b"hello");
    }

    #[tokio::test]
    async fn test_read_by_uri() {
        let dir = tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path());

        let written = storage
            .write_file("3.jpeg", "aGk=", Directory::Data)
            .await
            .unwrap();
        let read = storage.read_file(&written.uri, None).await.unwrap();
        assert_eq!(read.data, "aGk=");
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let dir = tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path());

        let err = storage
            .read_file("missing.jpeg", Some(Directory::Data))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_write_rejects_invalid_base64() {
        let dir = tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path());

        let err = storage
            .write_file("bad.jpeg", "!!not base64!!", Directory::Data)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidData(_)));
    }

    #[test]
    fn test_resolve_rejects_parent_traversal() {
        let storage = LocalFileStorage::new("/tmp/photoscan");
        assert!(storage
            .resolve("../etc/passwd", Some(Directory::Data))
            .is_err());
    }
}
