//! Fetching images by their web-accessible path.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::error::FetchError;

/// Binary payload of a fetched image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    /// Content type reported by the source, if any.
    pub content_type: Option<String>,
}

/// Resolves a web path to the image's bytes.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, web_path: &str) -> Result<FetchedImage, FetchError>;
}

/// Fetcher for `http(s)://` and `file://` paths.
#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, web_path: &str) -> Result<FetchedImage, FetchError> {
        let url = Url::parse(web_path).map_err(|e| FetchError::InvalidUrl {
            url: web_path.to_string(),
            reason: e.to_string(),
        })?;

        match url.scheme() {
            "http" | "https" => {
                debug!("Fetching image from {}", url);
                let response = self.client.get(url.clone()).send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(FetchError::Status {
                        url: url.to_string(),
                        status: status.as_u16(),
                    });
                }
                let content_type = response
                    .headers()
                    .get(reqwest::header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map(|v| v.to_string());
                let bytes = response.bytes().await?.to_vec();
                Ok(FetchedImage {
                    bytes,
                    content_type,
                })
            }
            "file" => {
                let path = url.to_file_path().map_err(|_| FetchError::InvalidUrl {
                    url: web_path.to_string(),
                    reason: "not a local file".to_string(),
                })?;
                let bytes = tokio::fs::read(&path).await?;
                Ok(FetchedImage {
                    bytes,
                    content_type: None,
                })
            }
            other => Err(FetchError::UnsupportedScheme(other.to_string())),
        }
    }
}
