//! Native mobile runtime.

use async_trait::async_trait;

use super::{Platform, RuntimeKind};
use crate::error::{CaptureError, Result, StorageError};
use crate::models::{CapturedPhoto, PhotoRecord};
use crate::storage::{FileStorage, WrittenFile};

/// Path prefix the embedded web server serves local files under.
const FILE_SERVE_PREFIX: &str = "/_capacitor_file_";

/// Native runtime: images are read straight from the device filesystem and
/// displayed through the local file server.
#[derive(Debug, Clone)]
pub struct NativePlatform {
    servable_host: String,
}

impl NativePlatform {
    pub fn new(servable_host: impl Into<String>) -> Self {
        let host: String = servable_host.into();
        Self {
            servable_host: host.trim_end_matches('/').to_string(),
        }
    }
}

impl Default for NativePlatform {
    fn default() -> Self {
        Self::new("http://localhost")
    }
}

#[async_trait]
impl Platform for NativePlatform {
    fn kind(&self) -> RuntimeKind {
        RuntimeKind::Native
    }

    fn to_servable_reference(&self, uri: &str) -> String {
        if let Some(path) = uri.strip_prefix("file://") {
            format!("{}{}{}", self.servable_host, FILE_SERVE_PREFIX, path)
        } else if uri.starts_with('/') {
            format!("{}{}{}", self.servable_host, FILE_SERVE_PREFIX, uri)
        } else {
            uri.to_string()
        }
    }

    async fn encode_capture(
        &self,
        photo: &CapturedPhoto,
        files: &dyn FileStorage,
    ) -> Result<String> {
        let path = photo
            .path
            .as_deref()
            .ok_or(CaptureError::MissingReference("native path"))?;
        Ok(files.read_file(path, None).await?.data)
    }

    fn build_record(
        &self,
        _file_name: &str,
        written: &WrittenFile,
        _photo: &CapturedPhoto,
    ) -> std::result::Result<PhotoRecord, CaptureError> {
        Ok(PhotoRecord::new(
            written.uri.clone(),
            self.to_servable_reference(&written.uri),
        ))
    }

    async fn hydrate(
        &self,
        record: PhotoRecord,
        _files: &dyn FileStorage,
    ) -> std::result::Result<PhotoRecord, StorageError> {
        if !record.display_path.is_empty() {
            return Ok(record);
        }
        let display_path = self.to_servable_reference(&record.file_path);
        Ok(PhotoRecord {
            display_path,
            ..record
        })
    }
}
