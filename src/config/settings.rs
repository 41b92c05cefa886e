//! Resolved application settings.

use std::path::PathBuf;
use std::time::Duration;

use super::{parse_startup, Config};
use crate::error::ConfigError;
use crate::ocr::{PoolConfig, TesseractConfig};
use crate::platform::RuntimeKind;

const DEFAULT_PREFERENCES_FILE: &str = "preferences.json";
const SCANS_SUBDIR: &str = "scans";

/// Application settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Base data directory; file storage areas live below it.
    pub data_dir: PathBuf,
    /// Preferences file name inside the data directory.
    pub preferences_file: String,
    /// Runtime the gallery behaves as.
    pub runtime: RuntimeKind,
    /// Host prefix for servable file URLs on native runtimes.
    pub servable_host: String,
    /// Timeout for fetching web image paths.
    pub fetch_timeout: Duration,
    /// Recognition pool settings.
    pub pool: PoolConfig,
    /// Tesseract settings shared by workers and the secondary engine.
    pub tesseract: TesseractConfig,
    /// Document scanner command.
    pub scanner_program: String,
    /// Extra scanner arguments.
    pub scanner_args: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        let data_dir = dirs::document_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("photoscan");

        Self {
            data_dir,
            preferences_file: DEFAULT_PREFERENCES_FILE.to_string(),
            runtime: RuntimeKind::Native,
            servable_host: "http://localhost".to_string(),
            fetch_timeout: Duration::from_secs(30),
            pool: PoolConfig::default(),
            tesseract: TesseractConfig::default(),
            scanner_program: "scanimage".to_string(),
            scanner_args: Vec::new(),
        }
    }
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            ..Default::default()
        }
    }

    pub fn set_data_dir(&mut self, data_dir: PathBuf) {
        self.data_dir = data_dir;
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.data_dir.join(&self.preferences_file)
    }

    pub fn scans_dir(&self) -> PathBuf {
        self.data_dir.join(SCANS_SUBDIR)
    }

    /// Ensure the data directory exists.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create data directory '{}': {}",
                    self.data_dir.display(),
                    e
                ),
            )
        })
    }

    /// Overlay values from a config file.
    pub fn apply_config(&mut self, config: Config) -> Result<(), ConfigError> {
        if let Some(dir) = config.data_dir {
            self.data_dir = dir;
        }
        if let Some(file) = config.preferences_file {
            self.preferences_file = file;
        }
        if let Some(runtime) = config.runtime {
            self.runtime = runtime;
        }
        if let Some(host) = config.servable_host {
            self.servable_host = host;
        }
        if let Some(secs) = config.fetch_timeout_secs {
            self.fetch_timeout = Duration::from_secs(secs);
        }

        let recognition = config.recognition;
        if let Some(workers) = recognition.workers {
            self.pool.workers = workers;
        }
        if let Some(language) = recognition.language {
            self.pool.language = language;
        }
        if let Some(startup) = recognition.startup {
            self.pool.startup = parse_startup(&startup, recognition.min_workers)?;
        }
        if let Some(binary) = recognition.tesseract {
            self.tesseract.binary = binary;
        }
        if recognition.tessdata_dir.is_some() {
            self.tesseract.tessdata_dir = recognition.tessdata_dir;
        }

        if let Some(program) = config.scanner.program {
            self.scanner_program = program;
        }
        if let Some(args) = config.scanner.args {
            self.scanner_args = args;
        }
        Ok(())
    }

    /// Overlay `PHOTOSCAN_*` environment variables.
    pub fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        let get = |key: &str| env(key).filter(|v| !v.is_empty());

        if let Some(dir) = get("PHOTOSCAN_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(runtime) = get("PHOTOSCAN_RUNTIME") {
            self.runtime = RuntimeKind::from_str(&runtime).ok_or(ConfigError::InvalidValue {
                key: "PHOTOSCAN_RUNTIME".to_string(),
                value: runtime,
            })?;
        }
        if let Some(workers) = get("PHOTOSCAN_WORKERS") {
            self.pool.workers = workers.parse().map_err(|_| ConfigError::InvalidValue {
                key: "PHOTOSCAN_WORKERS".to_string(),
                value: workers.clone(),
            })?;
        }
        if let Some(language) = get("PHOTOSCAN_LANGUAGE") {
            self.pool.language = language;
        }
        if let Some(binary) = get("PHOTOSCAN_TESSERACT") {
            self.tesseract.binary = binary;
        }
        if let Some(dir) = get("TESSDATA_PREFIX") {
            self.tesseract.tessdata_dir = Some(PathBuf::from(dir));
        }
        Ok(())
    }
}
