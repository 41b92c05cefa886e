//! Photo models: captured images and the records persisted for them.

use serde::{Deserialize, Serialize};

/// Extension appended to every stored capture.
pub const PHOTO_FILE_EXTENSION: &str = "jpeg";

/// A stored photo, as persisted in the gallery list.
///
/// The on-disk field names (`filepath`, `webviewPath`) are kept stable so
/// lists written by earlier builds keep loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoRecord {
    /// Where the image bytes live: a file URI on native runtimes, the
    /// generated file name in the data area on browser runtimes.
    #[serde(rename = "filepath")]
    pub file_path: String,
    /// Reference a rendering surface can load directly.
    #[serde(rename = "webviewPath", default)]
    pub display_path: String,
}

impl PhotoRecord {
    pub fn new(file_path: impl Into<String>, display_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            display_path: display_path.into(),
        }
    }

    /// Build the file name for a capture taken at `timestamp_ms`.
    pub fn file_name_for(timestamp_ms: i64) -> String {
        format!("{}.{}", timestamp_ms, PHOTO_FILE_EXTENSION)
    }
}

/// Reference to a freshly captured image, as returned by a capture provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedPhoto {
    /// Native filesystem path of the image, when the provider has one.
    pub path: Option<String>,
    /// Web-accessible path (`http(s)://`, `blob:`, `file://`) of the image.
    pub web_path: Option<String>,
    /// Image format reported by the provider (e.g. "jpeg").
    pub format: String,
}

impl CapturedPhoto {
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            web_path: None,
            format: PHOTO_FILE_EXTENSION.to_string(),
        }
    }

    pub fn with_web_path(web_path: impl Into<String>) -> Self {
        Self {
            path: None,
            web_path: Some(web_path.into()),
            format: PHOTO_FILE_EXTENSION.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_for_timestamp() {
        assert_eq!(
            PhotoRecord::file_name_for(1_700_000_000_123),
            "1700000000123.jpeg"
        );
    }

    #[test]
    fn test_record_uses_stable_field_names() {
        let record = PhotoRecord::new("1.jpeg", "blob://x");
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"filepath":"1.jpeg","webviewPath":"blob://x"}"#);
    }

    #[test]
    fn test_record_without_display_path_parses() {
        let record: PhotoRecord = serde_json::from_str(r#"{"filepath":"2.jpeg"}"#).unwrap();
        assert_eq!(record.file_path, "2.jpeg");
        assert!(record.display_path.is_empty());
    }
}
