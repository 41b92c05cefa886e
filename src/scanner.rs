//! Document scanning.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, error, info};

use crate::platform::Platform;

/// Errors from a document scan.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Scan cancelled")]
    Cancelled,

    #[error("Scanner unavailable: {0}")]
    Unavailable(String),

    #[error("Scan failed: {0}")]
    Failed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Options for a scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// Offer crop adjustment before returning pages.
    pub let_user_adjust_crop: bool,
    /// Stop after this many pages.
    pub max_num_documents: Option<u32>,
}

/// Result of a scan request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Pages were scanned; paths in scan order.
    Scanned { scanned_images: Vec<String> },
    /// Scanning is not offered on this platform.
    Skipped,
}

/// A document scanner.
#[async_trait]
pub trait DocumentScanner: Send + Sync {
    /// Scan pages, returning the path of each page image.
    async fn scan_document(&self, options: &ScanOptions) -> Result<Vec<String>, ScanError>;
}

/// Scanner driven by a batch scanning command (SANE `scanimage` by default).
///
/// Pages land in `output_dir` as `scan-<n>.jpeg`.
#[derive(Debug, Clone)]
pub struct CommandDocumentScanner {
    program: String,
    extra_args: Vec<String>,
    output_dir: PathBuf,
}

impl CommandDocumentScanner {
    pub fn new(program: impl Into<String>, extra_args: Vec<String>, output_dir: PathBuf) -> Self {
        Self {
            program: program.into(),
            extra_args,
            output_dir,
        }
    }

    fn batch_dir(&self) -> PathBuf {
        self.output_dir
            .join(chrono::Utc::now().format("%Y%m%dT%H%M%S%3f").to_string())
    }
}

#[async_trait]
impl DocumentScanner for CommandDocumentScanner {
    async fn scan_document(&self, options: &ScanOptions) -> Result<Vec<String>, ScanError> {
        let dir = self.batch_dir();
        tokio::fs::create_dir_all(&dir).await?;

        if options.let_user_adjust_crop {
            debug!("Crop adjustment is not available for {}", self.program);
        }

        let mut command = Command::new(&self.program);
        command
            .arg(format!("--batch={}/scan-%d.jpeg", dir.display()))
            .arg("--format=jpeg")
            .args(&self.extra_args);
        if let Some(max) = options.max_num_documents {
            command.arg(format!("--batch-count={}", max));
        }

        let output = match command.kill_on_drop(true).output().await {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ScanError::Unavailable(format!(
                    "{} not found (install sane-utils)",
                    self.program
                )))
            }
            Err(e) => return Err(ScanError::Io(e)),
        };

        let pages = collect_pages(&dir).await?;

        // Batch scanners exit non-zero once the feeder runs dry, so pages
        // on disk count as success.
        if pages.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ScanError::Failed(if stderr.trim().is_empty() {
                format!("{} produced no pages", self.program)
            } else {
                stderr.trim().to_string()
            }));
        }

        info!("Scanned {} page(s) into {}", pages.len(), dir.display());
        Ok(pages)
    }
}

/// Scan documents unless `platform` is a hybrid native shell.
///
/// Failures are logged and returned.
pub async fn scan_documents(
    platform: &dyn Platform,
    scanner: &dyn DocumentScanner,
) -> Result<ScanOutcome, ScanError> {
    if platform.is_hybrid() {
        info!("Document scanning is not offered on hybrid platforms");
        return Ok(ScanOutcome::Skipped);
    }

    info!("Scan in progress");
    let options = ScanOptions {
        let_user_adjust_crop: false,
        max_num_documents: None,
    };
    match scanner.scan_document(&options).await {
        Ok(scanned_images) => {
            info!("Number of scanned images: {}", scanned_images.len());
            Ok(ScanOutcome::Scanned { scanned_images })
        }
        Err(e) => {
            error!("Document scan failed: {}", e);
            Err(e)
        }
    }
}

/// Page images in `dir`, ordered by page number.
async fn collect_pages(dir: &Path) -> Result<Vec<String>, ScanError> {
    let mut pages: Vec<(u32, String)> = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().to_string();
        let number = name
            .strip_prefix("scan-")
            .and_then(|rest| rest.strip_suffix(".jpeg"))
            .and_then(|n| n.parse::<u32>().ok());
        if let Some(number) = number {
            pages.push((number, entry.path().display().to_string()));
        }
    }

    pages.sort_by_key(|(n, _)| *n);
    Ok(pages.into_iter().map(|(_, path)| path).collect())
}
