//! Image capture provider and web image fetching.

mod fetch;

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::error::CaptureError;
use crate::models::CapturedPhoto;

pub use fetch::{FetchedImage, HttpImageFetcher, ImageFetcher};

/// How the provider should hand back the captured image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CameraResultType {
    /// A path/URI reference to the image.
    #[default]
    Uri,
    /// Inline base64 payload.
    Base64,
    /// Inline data URL.
    DataUrl,
}

/// Where the image comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CameraSource {
    /// Let the provider ask.
    Prompt,
    /// Take a new picture.
    #[default]
    Camera,
    /// Pick from the existing photo library.
    Photos,
}

/// Options passed to the capture provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureOptions {
    pub result_type: CameraResultType,
    pub source: CameraSource,
    /// JPEG quality, 0-100.
    pub quality: u8,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            result_type: CameraResultType::Uri,
            source: CameraSource::Camera,
            quality: 100,
        }
    }
}

/// Source of freshly captured images.
#[async_trait]
pub trait ImageCapture: Send + Sync {
    async fn get_photo(&self, options: &CaptureOptions) -> Result<CapturedPhoto, CaptureError>;
}

/// Capture provider that "captures" an existing image file.
///
/// Used by the command line, where there is no camera: the imported file is
/// reported both as a native path and as a `file://` web path.
#[derive(Debug, Clone)]
pub struct FileImportCapture {
    source: PathBuf,
}

impl FileImportCapture {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

#[async_trait]
impl ImageCapture for FileImportCapture {
    async fn get_photo(&self, options: &CaptureOptions) -> Result<CapturedPhoto, CaptureError> {
        let path = tokio::fs::canonicalize(&self.source)
            .await
            .map_err(|e| {
                CaptureError::Unavailable(format!("{}: {}", self.source.display(), e))
            })?;

        let web_path = Url::from_file_path(&path)
            .map_err(|_| CaptureError::Unavailable(path.display().to_string()))?;

        let format = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .unwrap_or_else(|| "jpeg".to_string());

        debug!(
            "Imported {} as capture (quality {})",
            path.display(),
            options.quality
        );

        Ok(CapturedPhoto {
            path: Some(path.display().to_string()),
            web_path: Some(web_path.to_string()),
            format,
        })
    }
}

/// Capture provider for hosts without any image source.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCapture;

#[async_trait]
impl ImageCapture for NoCapture {
    async fn get_photo(&self, _options: &CaptureOptions) -> Result<CapturedPhoto, CaptureError> {
        Err(CaptureError::Unavailable(
            "no capture source configured".to_string(),
        ))
    }
}
