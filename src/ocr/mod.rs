//! Text recognition.
//!
//! Two engines live here:
//! - the [`RecognitionPool`], a fixed set of long-lived workers (Tesseract by
//!   default) fed from one shared job queue;
//! - a secondary [`TextRecognizer`] for one-shot recognition that returns the
//!   block/line/word breakdown.

mod command;
mod error;
mod job;
mod payload;
mod pool;
mod secondary;
mod tesseract;
mod tsv;
mod worker;

pub use error::RecognitionError;
pub use job::{
    ConfigResult, DetectResult, ImageLike, Job, JobKind, JobOutput, JobPayload, RecognizeResult,
};
pub use pool::{PoolConfig, PoolStartup, RecognitionPool, DEFAULT_LANGUAGE, DEFAULT_POOL_WORKERS};
pub use secondary::{
    OcrSourceType, OcrTextResult, SecondaryOcrError, TesseractTextRecognizer, TextRecognizer,
};
pub use tesseract::{TesseractConfig, TesseractWorker, TesseractWorkerFactory};
pub use tsv::TsvWord;
pub use worker::{prepare_worker, PreparationStep, RecognitionWorker, WorkerFactory};
