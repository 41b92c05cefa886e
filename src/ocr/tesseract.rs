//! Tesseract recognition workers.
//!
//! Each worker drives the `tesseract` command-line tool. Loading probes for
//! the binary, loading a language checks the installed traineddata, and
//! initializing binds the worker to that language.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::command::{find_binary, run, stdout_or_failure};
use super::error::RecognitionError;
use super::job::{ConfigResult, DetectResult, ImageLike, Job, JobOutput, RecognizeResult};
use super::payload::materialize;
use super::tsv;
use super::worker::{RecognitionWorker, WorkerFactory};
use crate::capture::ImageFetcher;

const INSTALL_HINT: &str = "tesseract not found (install tesseract-ocr)";

/// Settings shared by every Tesseract worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TesseractConfig {
    /// Binary name on PATH, or an explicit path.
    pub binary: String,
    /// Override for the traineddata directory.
    pub tessdata_dir: Option<PathBuf>,
}

impl Default for TesseractConfig {
    fn default() -> Self {
        Self {
            binary: "tesseract".to_string(),
            tessdata_dir: None,
        }
    }
}

impl TesseractConfig {
    fn command(&self, binary: &Path) -> Command {
        let mut command = Command::new(binary);
        if let Some(ref dir) = self.tessdata_dir {
            command.arg("--tessdata-dir").arg(dir);
        }
        command
    }
}

/// Worker backed by the Tesseract CLI.
pub struct TesseractWorker {
    index: usize,
    config: TesseractConfig,
    fetcher: Arc<dyn ImageFetcher>,
    binary: Option<PathBuf>,
    loaded_language: Option<String>,
    language: Option<String>,
    parameters: BTreeMap<String, String>,
}

impl TesseractWorker {
    pub fn new(index: usize, config: TesseractConfig, fetcher: Arc<dyn ImageFetcher>) -> Self {
        Self {
            index,
            config,
            fetcher,
            binary: None,
            loaded_language: None,
            language: None,
            parameters: BTreeMap::new(),
        }
    }

    fn binary(&self) -> Result<&PathBuf, RecognitionError> {
        self.binary.as_ref().ok_or(RecognitionError::NotInitialized)
    }

    fn language(&self) -> Result<&str, RecognitionError> {
        self.language
            .as_deref()
            .ok_or(RecognitionError::NotInitialized)
    }

    async fn recognize(&self, image: &ImageLike) -> Result<JobOutput, RecognitionError> {
        let start = Instant::now();
        let file = materialize(image, self.fetcher.as_ref()).await?;

        let mut command = self.config.command(self.binary()?);
        command
            .arg(file.path())
            .arg("stdout")
            .args(["-l", self.language()?]);
        for (key, value) in &self.parameters {
            command.arg("-c").arg(format!("{}={}", key, value));
        }
        command.arg("tsv");

        let output = stdout_or_failure(run(command, INSTALL_HINT).await?, "tesseract")?;
        let layout = tsv::layout(tsv::parse_words(&output));

        debug!(
            "Worker {} recognized {} word(s) in {:?}",
            self.index,
            layout.words.len(),
            start.elapsed()
        );

        Ok(JobOutput::Recognized(RecognizeResult {
            text: layout.text(),
            confidence: layout.mean_confidence(),
            processing_time_ms: start.elapsed().as_millis() as u64,
        }))
    }

    async fn detect(&self, image: &ImageLike) -> Result<JobOutput, RecognitionError> {
        let file = materialize(image, self.fetcher.as_ref()).await?;

        let mut command = self.config.command(self.binary()?);
        command.arg(file.path()).arg("stdout").args(["--psm", "0"]);

        let output = stdout_or_failure(run(command, INSTALL_HINT).await?, "tesseract")?;
        Ok(JobOutput::Detected(parse_osd(&output)))
    }
}

#[async_trait]
impl RecognitionWorker for TesseractWorker {
    async fn load(&mut self) -> Result<(), RecognitionError> {
        let binary = find_binary(&self.config.binary)
            .ok_or_else(|| RecognitionError::BackendNotAvailable(INSTALL_HINT.to_string()))?;
        debug!("Worker {} using {}", self.index, binary.display());
        self.binary = Some(binary);
        Ok(())
    }

    async fn load_language(&mut self, language: &str) -> Result<(), RecognitionError> {
        let mut command = self.config.command(self.binary()?);
        command.arg("--list-langs");

        let output = run(command, INSTALL_HINT).await?;
        // Older releases print the list on stderr.
        let listing = format!(
            "{}\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        let installed = parse_language_list(&listing);

        if let Some(missing) = language
            .split('+')
            .find(|lang| !installed.iter().any(|i| i.as_str() == *lang))
        {
            return Err(RecognitionError::LanguageNotFound(missing.to_string()));
        }

        self.loaded_language = Some(language.to_string());
        Ok(())
    }

    async fn initialize(&mut self, language: &str) -> Result<(), RecognitionError> {
        if self.loaded_language.as_deref() != Some(language) {
            return Err(RecognitionError::LanguageNotFound(format!(
                "{} was not loaded",
                language
            )));
        }
        self.language = Some(language.to_string());
        Ok(())
    }

    async fn run(&mut self, job: Job) -> Result<JobOutput, RecognitionError> {
        self.language()?;
        match job {
            Job::Recognize(image) => self.recognize(&image).await,
            Job::Detect(image) => self.detect(&image).await,
            Job::Configure(parameters) => {
                self.parameters.extend(parameters);
                Ok(JobOutput::Configured(ConfigResult {
                    parameters: self.parameters.clone(),
                }))
            }
        }
    }

    async fn terminate(&mut self) {
        self.language = None;
        self.loaded_language = None;
    }
}

/// Builds [`TesseractWorker`]s sharing one configuration and fetcher.
pub struct TesseractWorkerFactory {
    config: TesseractConfig,
    fetcher: Arc<dyn ImageFetcher>,
}

impl TesseractWorkerFactory {
    pub fn new(config: TesseractConfig, fetcher: Arc<dyn ImageFetcher>) -> Self {
        Self { config, fetcher }
    }
}

impl WorkerFactory for TesseractWorkerFactory {
    fn create_worker(&self, index: usize) -> Box<dyn RecognitionWorker> {
        Box::new(TesseractWorker::new(
            index,
            self.config.clone(),
            self.fetcher.clone(),
        ))
    }
}

/// Parse `--list-langs` output into language codes.
fn parse_language_list(listing: &str) -> Vec<String> {
    listing
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("List of available languages"))
        .filter(|line| !line.contains(' '))
        .map(|line| line.to_string())
        .collect()
}

/// Parse orientation/script detection (`--psm 0`) output.
fn parse_osd(output: &str) -> DetectResult {
    let mut result = DetectResult::default();
    for line in output.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "Orientation in degrees" => result.orientation_degrees = value.parse().ok(),
            "Orientation confidence" => result.orientation_confidence = value.parse().ok(),
            "Script" => result.script = Some(value.to_string()),
            "Script confidence" => result.script_confidence = value.parse().ok(),
            _ => {}
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::HttpImageFetcher;
    use std::time::Duration;

    fn worker(binary: &str) -> TesseractWorker {
        let config = TesseractConfig {
            binary: binary.to_string(),
            tessdata_dir: None,
        };
        let fetcher = Arc::new(HttpImageFetcher::new(Duration::from_secs(1)).unwrap());
        TesseractWorker::new(0, config, fetcher)
    }

    #[test]
    fn test_parse_language_list() {
        let listing = "List of available languages in \"/usr/share/tessdata/\" (3):\neng\nosd\ndeu\n";
        assert_eq!(parse_language_list(listing), vec!["eng", "osd", "deu"]);
    }

    #[test]
    fn test_parse_osd() {
        let output = "Page number: 0\nOrientation in degrees: 270\nRotate: 90\n\
                      Orientation confidence: 4.12\nScript: Latin\nScript confidence: 2.05\n";
        let result = parse_osd(output);
        assert_eq!(result.orientation_degrees, Some(270));
        assert_eq!(result.orientation_confidence, Some(4.12));
        assert_eq!(result.script.as_deref(), Some("Latin"));
        assert_eq!(result.script_confidence, Some(2.05));
    }

    #[test]
    fn test_parse_osd_garbage() {
        assert_eq!(parse_osd("nothing useful"), DetectResult::default());
    }

    #[tokio::test]
    async fn test_load_missing_binary() {
        let mut worker = worker("photoscan-no-such-tesseract");
        let err = worker.load().await.unwrap_err();
        assert!(matches!(err, RecognitionError::BackendNotAvailable(_)));
    }

    #[tokio::test]
    async fn test_run_before_initialize() {
        let mut worker = worker("tesseract");
        let err = worker
            .run(Job::Configure(BTreeMap::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, RecognitionError::NotInitialized));
    }

    #[tokio::test]
    async fn test_initialize_requires_loaded_language() {
        let mut worker = worker("tesseract");
        let err = worker.initialize("eng").await.unwrap_err();
        assert!(matches!(err, RecognitionError::LanguageNotFound(_)));
    }
}
