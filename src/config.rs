//! Configuration for photoscan.
//!
//! Settings come from, lowest priority first: built-in defaults, an optional
//! TOML file, `PHOTOSCAN_*` environment variables, then command-line flags.
//!
//! The config file is the first of: `--config` / `PHOTOSCAN_CONFIG`,
//! `photoscan.toml` in the data directory, or a `photoscan.toml` discovered
//! in the standard config locations by `prefer`.

mod settings;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::ocr::PoolStartup;
use crate::platform::RuntimeKind;

pub use settings::Settings;

/// Default config filename looked up in the data directory.
pub const DEFAULT_CONFIG_FILENAME: &str = "photoscan.toml";

/// Name `prefer` searches the standard config locations for.
const CONFIG_NAME: &str = "photoscan";

/// Config file structure. Every field is optional; missing ones keep defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<RuntimeKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servable_host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_timeout_secs: Option<u64>,
    #[serde(default)]
    pub recognition: RecognitionConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
}

/// `[recognition]` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecognitionConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// "all-or-nothing" or "degraded".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub startup: Option<String>,
    /// Minimum ready workers when `startup = "degraded"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_workers: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tesseract: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tessdata_dir: Option<PathBuf>,
}

/// `[scanner]` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScannerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
}

impl Config {
    /// Load a config file.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.display().to_string(),
                source,
            })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Find a config file in the standard locations.
    ///
    /// Only TOML files are used; anything else `prefer` turns up is skipped
    /// with a warning.
    pub async fn discover() -> Option<PathBuf> {
        let found = prefer::load(CONFIG_NAME).await.ok()?;
        let path = found.source_path()?.to_path_buf();
        if path.extension().and_then(|e| e.to_str()) != Some("toml") {
            tracing::warn!("Ignoring non-TOML config at {}", path.display());
            return None;
        }
        Some(path)
    }
}

/// Parse a startup policy name.
pub fn parse_startup(name: &str, min_workers: Option<usize>) -> Result<PoolStartup, ConfigError> {
    match name.to_lowercase().as_str() {
        "all-or-nothing" | "strict" => Ok(PoolStartup::AllOrNothing),
        "degraded" => Ok(PoolStartup::Degraded {
            min_workers: min_workers.unwrap_or(1),
        }),
        other => Err(ConfigError::InvalidValue {
            key: "recognition.startup".to_string(),
            value: other.to_string(),
        }),
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file (overrides lookup in the data directory).
    pub config_path: Option<PathBuf>,
    /// Data directory from the command line.
    pub data_dir: Option<PathBuf>,
}

/// Load settings from defaults, config file, and the process environment.
pub async fn load_settings(options: &LoadOptions) -> Result<Settings, ConfigError> {
    load_settings_from(options, |key| std::env::var(key).ok()).await
}

/// Same as [`load_settings`], reading environment variables through `env`.
pub async fn load_settings_from(
    options: &LoadOptions,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Settings, ConfigError> {
    let mut settings = Settings::default();

    // The data directory decides where the config file is looked up, so
    // resolve it before reading the file.
    let env_data_dir = env("PHOTOSCAN_DATA_DIR")
        .filter(|s| !s.is_empty())
        .map(PathBuf::from);
    let early_data_dir = options
        .data_dir
        .clone()
        .or_else(|| env_data_dir.clone())
        .unwrap_or_else(|| settings.data_dir.clone());

    let config_path = options
        .config_path
        .clone()
        .or_else(|| env("PHOTOSCAN_CONFIG").filter(|s| !s.is_empty()).map(PathBuf::from));

    let config_path = match config_path {
        Some(path) => Some(path),
        None => {
            let candidate = early_data_dir.join(DEFAULT_CONFIG_FILENAME);
            if tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
                Some(candidate)
            } else {
                Config::discover().await
            }
        }
    };

    if let Some(path) = config_path {
        tracing::debug!("Loading config from {}", path.display());
        settings.apply_config(Config::load(&path).await?)?;
    }

    settings.apply_env(&env)?;

    if let Some(ref dir) = options.data_dir {
        settings.set_data_dir(dir.clone());
    }

    Ok(settings)
}
