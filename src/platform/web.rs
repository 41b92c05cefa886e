//! Browser-hosted runtime.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{Platform, RuntimeKind};
use crate::capture::ImageFetcher;
use crate::error::{CaptureError, Result, StorageError};
use crate::models::{CapturedPhoto, PhotoRecord};
use crate::storage::{encode_data_url, Directory, FileStorage, WrittenFile, DEFAULT_IMAGE_MIME};

/// Browser runtime: captures are fetched by web path and stored as data URLs;
/// stored files are re-read and inlined when the gallery loads.
pub struct WebPlatform {
    fetcher: Arc<dyn ImageFetcher>,
}

impl WebPlatform {
    pub fn new(fetcher: Arc<dyn ImageFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl Platform for WebPlatform {
    fn kind(&self) -> RuntimeKind {
        RuntimeKind::Web
    }

    fn to_servable_reference(&self, uri: &str) -> String {
        uri.to_string()
    }

    async fn encode_capture(
        &self,
        photo: &CapturedPhoto,
        _files: &dyn FileStorage,
    ) -> Result<String> {
        let web_path = photo
            .web_path
            .as_deref()
            .ok_or(CaptureError::MissingReference("web path"))?;

        let fetched = self.fetcher.fetch(web_path).await?;
        debug!("Fetched {} bytes from {}", fetched.bytes.len(), web_path);

        let bytes = fetched.bytes;
        let content_type = fetched.content_type;
        let encoded = tokio::task::spawn_blocking(move || {
            encode_data_url(&bytes, content_type.as_deref())
        })
        .await
        .map_err(|e| StorageError::InvalidData(format!("encoding task failed: {}", e)))?;

        Ok(encoded)
    }

    fn build_record(
        &self,
        file_name: &str,
        _written: &WrittenFile,
        photo: &CapturedPhoto,
    ) -> std::result::Result<PhotoRecord, CaptureError> {
        let web_path = photo
            .web_path
            .clone()
            .ok_or(CaptureError::MissingReference("web path"))?;
        Ok(PhotoRecord::new(file_name, web_path))
    }

    async fn hydrate(
        &self,
        record: PhotoRecord,
        files: &dyn FileStorage,
    ) -> std::result::Result<PhotoRecord, StorageError> {
        let file = files
            .read_file(&record.file_path, Some(Directory::Data))
            .await?;
        Ok(PhotoRecord {
            display_path: format!("data:{};base64,{}", DEFAULT_IMAGE_MIME, file.data),
            ..record
        })
    }
}
