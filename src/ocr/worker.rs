//! Recognition worker abstraction.

use async_trait::async_trait;

use super::error::RecognitionError;
use super::job::{Job, JobOutput};

/// Preparation steps a worker goes through before accepting jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreparationStep {
    Load,
    LoadLanguage,
    Initialize,
}

impl PreparationStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            PreparationStep::Load => "load runtime",
            PreparationStep::LoadLanguage => "load language",
            PreparationStep::Initialize => "initialize",
        }
    }
}

impl std::fmt::Display for PreparationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A long-lived text recognition worker.
///
/// A worker handles one job at a time; the pool owns it exclusively.
#[async_trait]
pub trait RecognitionWorker: Send {
    /// Load the recognition runtime.
    async fn load(&mut self) -> Result<(), RecognitionError>;

    /// Load the model for `language` (e.g. "eng", "eng+deu").
    async fn load_language(&mut self, language: &str) -> Result<(), RecognitionError>;

    /// Initialize the engine with a loaded language.
    async fn initialize(&mut self, language: &str) -> Result<(), RecognitionError>;

    /// Run a job.
    async fn run(&mut self, job: Job) -> Result<JobOutput, RecognitionError>;

    /// Release resources. Called once when the worker leaves the pool.
    async fn terminate(&mut self) {}
}

/// Creates workers for a pool.
pub trait WorkerFactory: Send + Sync {
    fn create_worker(&self, index: usize) -> Box<dyn RecognitionWorker>;
}

/// Run the three preparation steps in order, stopping at the first failure.
pub async fn prepare_worker(
    index: usize,
    worker: &mut dyn RecognitionWorker,
    language: &str,
) -> Result<(), RecognitionError> {
    let wrap = |step: PreparationStep| {
        move |e: RecognitionError| RecognitionError::Preparation {
            worker: index,
            step,
            reason: e.to_string(),
        }
    };

    worker.load().await.map_err(wrap(PreparationStep::Load))?;
    worker
        .load_language(language)
        .await
        .map_err(wrap(PreparationStep::LoadLanguage))?;
    worker
        .initialize(language)
        .await
        .map_err(wrap(PreparationStep::Initialize))?;
    Ok(())
}
