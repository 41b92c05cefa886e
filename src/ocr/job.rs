//! Recognition jobs and their results.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::error::RecognitionError;

/// Kind of work a recognition job asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    /// Extract text.
    Recognize,
    /// Detect orientation and script.
    Detect,
    /// Change engine parameters.
    Configure,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Recognize => "recognize",
            JobKind::Detect => "detect",
            JobKind::Configure => "configure",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "recognize" => Some(JobKind::Recognize),
            "detect" => Some(JobKind::Detect),
            "configure" | "setparameters" => Some(JobKind::Configure),
            _ => None,
        }
    }
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An image in any of the forms callers hand over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageLike {
    /// Encoded image bytes.
    Bytes(Vec<u8>),
    /// Local filesystem path.
    Path(PathBuf),
    /// `file://`, `http(s)://` or other URI.
    Uri(String),
    /// Base64 text, optionally as a data URL.
    Base64(String),
}

impl ImageLike {
    pub fn describe(&self) -> String {
        match self {
            ImageLike::Bytes(b) => format!("{} byte(s)", b.len()),
            ImageLike::Path(p) => p.display().to_string(),
            ImageLike::Uri(u) => u.clone(),
            ImageLike::Base64(s) => format!("base64 ({} chars)", s.len()),
        }
    }
}

/// Job input: an image for recognize/detect, parameters for configure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobPayload {
    Image(ImageLike),
    Parameters(BTreeMap<String, String>),
}

impl JobPayload {
    fn label(&self) -> &'static str {
        match self {
            JobPayload::Image(_) => "image",
            JobPayload::Parameters(_) => "parameters",
        }
    }
}

impl From<ImageLike> for JobPayload {
    fn from(image: ImageLike) -> Self {
        JobPayload::Image(image)
    }
}

/// A validated unit of work for a recognition worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    Recognize(ImageLike),
    Detect(ImageLike),
    Configure(BTreeMap<String, String>),
}

impl Job {
    /// Pair a kind with its payload, rejecting combinations that make no sense.
    pub fn new(kind: JobKind, payload: JobPayload) -> Result<Self, RecognitionError> {
        match (kind, payload) {
            (JobKind::Recognize, JobPayload::Image(image)) => Ok(Job::Recognize(image)),
            (JobKind::Detect, JobPayload::Image(image)) => Ok(Job::Detect(image)),
            (JobKind::Configure, JobPayload::Parameters(params)) => Ok(Job::Configure(params)),
            (kind, payload) => Err(RecognitionError::PayloadMismatch {
                kind,
                payload: payload.label(),
            }),
        }
    }

    pub fn kind(&self) -> JobKind {
        match self {
            Job::Recognize(_) => JobKind::Recognize,
            Job::Detect(_) => JobKind::Detect,
            Job::Configure(_) => JobKind::Configure,
        }
    }
}

/// Text extracted from an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizeResult {
    pub text: String,
    /// Mean word confidence (0.0 - 1.0), if the engine reported one.
    pub confidence: Option<f32>,
    pub processing_time_ms: u64,
}

/// Orientation and script detected for an image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectResult {
    pub orientation_degrees: Option<u32>,
    pub orientation_confidence: Option<f32>,
    pub script: Option<String>,
    pub script_confidence: Option<f32>,
}

/// Parameters in effect after a configure job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigResult {
    pub parameters: BTreeMap<String, String>,
}

/// Raw result of a job, by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum JobOutput {
    Recognized(RecognizeResult),
    Detected(DetectResult),
    Configured(ConfigResult),
}

impl JobOutput {
    pub fn text(&self) -> Option<&str> {
        match self {
            JobOutput::Recognized(r) => Some(&r.text),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_kind_round_trip_names() {
        for kind in [JobKind::Recognize, JobKind::Detect, JobKind::Configure] {
            assert_eq!(JobKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(JobKind::from_str("setParameters"), Some(JobKind::Configure));
        assert_eq!(JobKind::from_str("translate"), None);
    }

    #[test]
    fn test_job_rejects_mismatched_payload() {
        let err = Job::new(JobKind::Configure, ImageLike::Uri("blob://x".into()).into())
            .unwrap_err();
        assert!(matches!(
            err,
            RecognitionError::PayloadMismatch {
                kind: JobKind::Configure,
                payload: "image"
            }
        ));

        let err = Job::new(JobKind::Recognize, JobPayload::Parameters(BTreeMap::new()))
            .unwrap_err();
        assert!(matches!(err, RecognitionError::PayloadMismatch { .. }));
    }

    #[test]
    fn test_job_kind_matches_constructor() {
        let job = Job::new(JobKind::Detect, ImageLike::Bytes(vec![1]).into()).unwrap();
        assert_eq!(job.kind(), JobKind::Detect);
    }

    #[test]
    fn test_output_text() {
        let output = JobOutput::Recognized(RecognizeResult {
            text: "hello".into(),
            confidence: None,
            processing_time_ms: 1,
        });
        assert_eq!(output.text(), Some("hello"));
        assert_eq!(JobOutput::Configured(ConfigResult::default()).text(), None);
    }
}
