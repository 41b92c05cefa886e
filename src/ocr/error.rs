//! Recognition error types.

use thiserror::Error;

use super::job::JobKind;
use super::worker::PreparationStep;

/// Errors from the recognition pool and its workers.
#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("Backend not available: {0}")]
    BackendNotAvailable(String),

    #[error("Language model not found: {0}")]
    LanguageNotFound(String),

    #[error("Worker {worker} failed to {step}: {reason}")]
    Preparation {
        worker: usize,
        step: PreparationStep,
        reason: String,
    },

    #[error("Pool started {started} of {requested} worker(s), {required} required")]
    PoolStartup {
        started: usize,
        requested: usize,
        required: usize,
        failures: Vec<String>,
    },

    #[error("Worker is not initialized")]
    NotInitialized,

    #[error("{kind} job cannot take {payload} payload")]
    PayloadMismatch {
        kind: JobKind,
        payload: &'static str,
    },

    #[error("Invalid image payload: {0}")]
    InvalidPayload(String),

    #[error("Image payload unavailable: {0}")]
    PayloadUnavailable(String),

    #[error("OCR failed: {0}")]
    OcrFailed(String),

    #[error("Recognition pool is shut down")]
    PoolClosed,

    #[error("Worker stopped before answering")]
    WorkerLost,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
