//! Secondary OCR engine: one-shot text recognition outside the pool.
//!
//! Results carry the block/line/word breakdown rather than just plain text.

use std::path::PathBuf;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;
use url::Url;

use super::command::{run, stdout_or_failure};
use super::error::RecognitionError;
use super::payload::{decode_base64_image, write_temp_image, MaterializedImage};
use super::tsv::{self, TsvWord};

/// Errors from the secondary OCR engine.
#[derive(Debug, Error)]
pub enum SecondaryOcrError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("OCR engine unavailable: {0}")]
    Unavailable(String),

    #[error("OCR failed: {0}")]
    Failed(String),
}

impl From<RecognitionError> for SecondaryOcrError {
    fn from(e: RecognitionError) -> Self {
        match e {
            RecognitionError::InvalidPayload(m) | RecognitionError::PayloadUnavailable(m) => {
                SecondaryOcrError::InvalidInput(m)
            }
            RecognitionError::BackendNotAvailable(m) => SecondaryOcrError::Unavailable(m),
            other => SecondaryOcrError::Failed(other.to_string()),
        }
    }
}

/// How the `data` argument of [`TextRecognizer::rec_text`] is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OcrSourceType {
    /// Full-resolution image at a URI or path.
    NormUri,
    /// Image at a URI or path; engines may downscale for speed.
    FastUri,
    /// Base64 payload or data URL.
    Base64,
}

/// Text found by the secondary engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrTextResult {
    pub found_text: bool,
    pub blocks: Vec<String>,
    pub lines: Vec<String>,
    pub words: Vec<TsvWord>,
    pub processing_time_ms: u64,
}

impl OcrTextResult {
    pub fn text(&self) -> String {
        self.blocks.join("\n\n")
    }
}

/// A one-shot text recognizer.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn rec_text(
        &self,
        source_type: OcrSourceType,
        data: &str,
    ) -> Result<OcrTextResult, SecondaryOcrError>;
}

/// Secondary engine backed by a fresh Tesseract process per call.
#[derive(Debug, Clone)]
pub struct TesseractTextRecognizer {
    binary: String,
    language: String,
}

impl TesseractTextRecognizer {
    pub fn new(binary: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            language: language.into(),
        }
    }

    async fn input_file(
        &self,
        source_type: OcrSourceType,
        data: &str,
    ) -> Result<MaterializedImage, SecondaryOcrError> {
        match source_type {
            OcrSourceType::Base64 => Ok(write_temp_image(decode_base64_image(data)?).await?),
            OcrSourceType::NormUri | OcrSourceType::FastUri => {
                let path = if data.starts_with("file://") {
                    Url::parse(data)
                        .ok()
                        .and_then(|u| u.to_file_path().ok())
                        .ok_or_else(|| SecondaryOcrError::InvalidInput(data.to_string()))?
                } else {
                    PathBuf::from(data)
                };
                let bytes = tokio::fs::read(&path)
                    .await
                    .map_err(|e| SecondaryOcrError::InvalidInput(format!("{}: {}", data, e)))?;
                Ok(write_temp_image(bytes).await?)
            }
        }
    }
}

#[async_trait]
impl TextRecognizer for TesseractTextRecognizer {
    async fn rec_text(
        &self,
        source_type: OcrSourceType,
        data: &str,
    ) -> Result<OcrTextResult, SecondaryOcrError> {
        let start = Instant::now();
        let file = self.input_file(source_type, data).await?;

        let mut command = Command::new(&self.binary);
        command
            .arg(file.path())
            .arg("stdout")
            .args(["-l", &self.language]);
        if source_type == OcrSourceType::FastUri {
            // Sparse text mode is noticeably faster on photos.
            command.args(["--psm", "11"]);
        }
        command.arg("tsv");

        let output = stdout_or_failure(
            run(command, "tesseract not found (install tesseract-ocr)").await?,
            "tesseract",
        )?;
        let layout = tsv::layout(tsv::parse_words(&output));
        debug!("Secondary OCR found {} word(s)", layout.words.len());

        Ok(OcrTextResult {
            found_text: !layout.words.is_empty(),
            blocks: layout.blocks,
            lines: layout.lines,
            words: layout.words,
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_base64_is_invalid_input() {
        let recognizer = TesseractTextRecognizer::new("tesseract", "eng");
        let err = recognizer
            .rec_text(OcrSourceType::Base64, "%%% not base64")
            .await
            .unwrap_err();
        assert!(matches!(err, SecondaryOcrError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_missing_file_is_invalid_input() {
        let recognizer = TesseractTextRecognizer::new("tesseract", "eng");
        let err = recognizer
            .rec_text(OcrSourceType::NormUri, "/no/such/scan.jpeg")
            .await
            .unwrap_err();
        assert!(matches!(err, SecondaryOcrError::InvalidInput(_)));
    }

    #[test]
    fn test_result_text_joins_blocks() {
        let result = OcrTextResult {
            found_text: true,
            blocks: vec!["a b".into(), "c".into()],
            ..Default::default()
        };
        assert_eq!(result.text(), "a b\n\nc");
    }
}
