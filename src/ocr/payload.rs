//! Turning an [`ImageLike`] into a file an OCR engine can read.

use std::path::{Path, PathBuf};

use base64::Engine;
use tempfile::TempDir;
use url::Url;

use super::error::RecognitionError;
use super::job::ImageLike;
use crate::capture::ImageFetcher;
use crate::storage::split_data_url;

/// An image on disk. Temporary copies are removed on drop.
#[derive(Debug)]
pub struct MaterializedImage {
    path: PathBuf,
    _temp: Option<TempDir>,
}

impl MaterializedImage {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Decode base64 or a base64 data URL.
pub fn decode_base64_image(data: &str) -> Result<Vec<u8>, RecognitionError> {
    let payload = split_data_url(data).map(|(_, p)| p).unwrap_or(data);
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| RecognitionError::InvalidPayload(format!("invalid base64: {}", e)))
}

/// Write image bytes to a temporary file, refusing anything that is not an image.
pub async fn write_temp_image(bytes: Vec<u8>) -> Result<MaterializedImage, RecognitionError> {
    if bytes.is_empty() {
        return Err(RecognitionError::InvalidPayload("empty image".to_string()));
    }
    let kind = infer::get(&bytes)
        .filter(|k| k.matcher_type() == infer::MatcherType::Image)
        .ok_or_else(|| {
            RecognitionError::InvalidPayload("not a recognized image format".to_string())
        })?;

    let dir = TempDir::new()?;
    let path = dir.path().join(format!("image.{}", kind.extension()));
    tokio::fs::write(&path, &bytes).await?;

    Ok(MaterializedImage {
        path,
        _temp: Some(dir),
    })
}

/// Put `image` on disk, fetching or decoding it as needed.
pub async fn materialize(
    image: &ImageLike,
    fetcher: &dyn ImageFetcher,
) -> Result<MaterializedImage, RecognitionError> {
    match image {
        ImageLike::Bytes(bytes) => write_temp_image(bytes.clone()).await,
        ImageLike::Base64(data) => write_temp_image(decode_base64_image(data)?).await,
        ImageLike::Path(path) => existing_file(path.clone()).await,
        ImageLike::Uri(uri) if uri.starts_with("file://") => {
            let path = Url::parse(uri)
                .ok()
                .and_then(|u| u.to_file_path().ok())
                .ok_or_else(|| RecognitionError::PayloadUnavailable(uri.clone()))?;
            existing_file(path).await
        }
        ImageLike::Uri(uri) => {
            let fetched = fetcher
                .fetch(uri)
                .await
                .map_err(|e| RecognitionError::PayloadUnavailable(format!("{}: {}", uri, e)))?;
            write_temp_image(fetched.bytes).await
        }
    }
}

async fn existing_file(path: PathBuf) -> Result<MaterializedImage, RecognitionError> {
    match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => Ok(MaterializedImage { path, _temp: None }),
        _ => Err(RecognitionError::PayloadUnavailable(
            path.display().to_string(),
        )),
    }
}
