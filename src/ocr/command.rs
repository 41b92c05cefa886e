//! Running OCR command-line tools.

use std::path::PathBuf;
use std::process::Output;

use tokio::process::Command;

use super::error::RecognitionError;

/// Locate `binary` (a name on PATH or an explicit path).
pub fn find_binary(binary: &str) -> Option<PathBuf> {
    which::which(binary).ok()
}

/// Run a command to completion, mapping a missing executable to
/// [`RecognitionError::BackendNotAvailable`].
pub async fn run(mut command: Command, hint: &str) -> Result<Output, RecognitionError> {
    match command.kill_on_drop(true).output().await {
        Ok(output) => Ok(output),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(RecognitionError::BackendNotAvailable(hint.to_string()))
        }
        Err(e) => Err(RecognitionError::Io(e)),
    }
}

/// Stdout of a successful run, or the stderr text as an OCR failure.
pub fn stdout_or_failure(output: Output, tool: &str) -> Result<String, RecognitionError> {
    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(RecognitionError::OcrFailed(format!(
            "{} failed: {}",
            tool,
            stderr.trim()
        )))
    }
}
