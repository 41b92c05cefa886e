//! Error types shared across the crate.

use thiserror::Error;

use crate::ocr::RecognitionError;
use crate::ocr::SecondaryOcrError;
use crate::scanner::ScanError;

/// Errors from durable file and key-value storage.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid file data: {0}")]
    InvalidData(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            return StorageError::NotFound(path.into());
        }
        StorageError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors from the image capture provider.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Capture cancelled")]
    Cancelled,

    #[error("Camera permission denied")]
    PermissionDenied,

    #[error("Capture source unavailable: {0}")]
    Unavailable(String),

    #[error("Captured photo has no {0}")]
    MissingReference(&'static str),
}

/// Errors from fetching a web-accessible image path.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request to {url} failed with status {status}")]
    Status { url: String, status: u16 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// Top-level error for service operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Recognition(#[from] RecognitionError),

    #[error(transparent)]
    SecondaryOcr(#[from] SecondaryOcrError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, Error>;
