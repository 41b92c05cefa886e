//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod config_cmd;
mod gallery;
mod recognize;
mod scan;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use photoscan::config::{load_settings, LoadOptions};
use photoscan::platform::RuntimeKind;

#[derive(Parser)]
#[command(name = "photoscan")]
#[command(about = "Photo capture, gallery storage and OCR")]
#[command(version)]
pub struct Cli {
    /// Data directory (overrides config file and PHOTOSCAN_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Config file path (overrides lookup in the data directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Runtime to behave as: native or web
    #[arg(long, global = true)]
    runtime: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Add an image file to the gallery as a new capture
    Capture {
        /// Image to import
        image: PathBuf,
    },

    /// List photos in the gallery, newest first
    List {
        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Recognize text in images using the worker pool
    Recognize {
        /// Images (paths or URLs)
        #[arg(required = true)]
        images: Vec<String>,
        /// Detect orientation and script instead of recognizing text
        #[arg(long)]
        detect: bool,
        /// Number of recognition workers
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// Recognize text in one image with the secondary engine
    Ocr {
        /// Image to read
        image: PathBuf,
    },

    /// Scan documents with the configured scanner
    Scan,

    /// Show effective configuration
    Config,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        data_dir: cli.data_dir,
    };
    let mut settings = load_settings(&options).await?;

    if let Some(runtime) = cli.runtime {
        settings.runtime = RuntimeKind::from_str(&runtime)
            .ok_or_else(|| anyhow::anyhow!("Unknown runtime: {}", runtime))?;
    }

    match cli.command {
        Commands::Capture { image } => gallery::cmd_capture(&settings, image).await,
        Commands::List { json } => gallery::cmd_list(&settings, json).await,
        Commands::Recognize {
            images,
            detect,
            workers,
        } => {
            if let Some(workers) = workers {
                settings.pool.workers = workers;
            }
            recognize::cmd_recognize(&settings, &images, detect).await
        }
        Commands::Ocr { image } => recognize::cmd_ocr(&settings, &image).await,
        Commands::Scan => scan::cmd_scan(&settings).await,
        Commands::Config => config_cmd::cmd_config_show(&settings),
    }
}
