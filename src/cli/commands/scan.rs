//! Document scan command.

use std::sync::Arc;

use crate::cli::icons::{bullet, success, warn};
use photoscan::capture::HttpImageFetcher;
use photoscan::config::Settings;
use photoscan::scanner::{scan_documents, CommandDocumentScanner, ScanOutcome};
use photoscan::services::platform_for;

pub async fn cmd_scan(settings: &Settings) -> anyhow::Result<()> {
    let fetcher = Arc::new(HttpImageFetcher::new(settings.fetch_timeout)?);
    let platform = platform_for(settings, fetcher);
    let scanner = CommandDocumentScanner::new(
        settings.scanner_program.clone(),
        settings.scanner_args.clone(),
        settings.scans_dir(),
    );

    match scan_documents(platform.as_ref(), &scanner).await? {
        ScanOutcome::Skipped => {
            println!(
                "{} Scanning is not offered on the {} runtime (try --runtime web)",
                warn(),
                platform.kind()
            );
        }
        ScanOutcome::Scanned { scanned_images } => {
            println!("{} Scanned {} page(s)", success(), scanned_images.len());
            for path in scanned_images {
                println!("  {} {}", bullet(), path);
            }
        }
    }
    Ok(())
}
