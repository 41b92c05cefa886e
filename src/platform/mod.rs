//! Runtime capability: everything that differs between a native mobile
//! runtime and a browser-hosted one.
//!
//! The gallery is handed one [`Platform`] at construction and never checks the
//! environment itself.

mod native;
mod web;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{CaptureError, Result, StorageError};
use crate::models::{CapturedPhoto, PhotoRecord};
use crate::storage::{FileStorage, WrittenFile};

pub use native::NativePlatform;
pub use web::WebPlatform;

/// Kind of runtime the service is hosted in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeKind {
    /// Native mobile runtime with a real filesystem.
    #[default]
    #[serde(alias = "android", alias = "ios")]
    Native,
    /// Browser-hosted runtime.
    #[serde(alias = "browser")]
    Web,
}

impl RuntimeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuntimeKind::Native => "native",
            RuntimeKind::Web => "web",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "native" | "android" | "ios" => Some(RuntimeKind::Native),
            "web" | "browser" => Some(RuntimeKind::Web),
            _ => None,
        }
    }
}

impl std::fmt::Display for RuntimeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Environment-dependent behavior of the photo gallery.
#[async_trait]
pub trait Platform: Send + Sync {
    fn kind(&self) -> RuntimeKind;

    fn is_native(&self) -> bool {
        self.kind() == RuntimeKind::Native
    }

    /// Whether the app runs inside a hybrid native shell.
    fn is_hybrid(&self) -> bool {
        self.is_native()
    }

    /// Transform a file URI into a URL a rendering surface can load.
    fn to_servable_reference(&self, uri: &str) -> String;

    /// Turn a captured photo into the string form written to file storage.
    async fn encode_capture(&self, photo: &CapturedPhoto, files: &dyn FileStorage)
        -> Result<String>;

    /// Build the record for a capture written as `file_name`.
    fn build_record(
        &self,
        file_name: &str,
        written: &WrittenFile,
        photo: &CapturedPhoto,
    ) -> std::result::Result<PhotoRecord, CaptureError>;

    /// Materialize the display path of a stored record, if this runtime needs it.
    async fn hydrate(
        &self,
        record: PhotoRecord,
        files: &dyn FileStorage,
    ) -> std::result::Result<PhotoRecord, StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_kind_from_str() {
        assert_eq!(RuntimeKind::from_str("native"), Some(RuntimeKind::Native));
        assert_eq!(RuntimeKind::from_str("Android"), Some(RuntimeKind::Native));
        assert_eq!(RuntimeKind::from_str("browser"), Some(RuntimeKind::Web));
        assert_eq!(RuntimeKind::from_str("desktop"), None);
    }
}
