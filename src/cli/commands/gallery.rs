//! Gallery commands.

use std::path::PathBuf;
use std::sync::Arc;

use console::style;

use crate::cli::icons::{bullet, dim_arrow, success};
use photoscan::capture::{FileImportCapture, HttpImageFetcher, NoCapture};
use photoscan::config::Settings;
use photoscan::services::{open_gallery, platform_for};

/// Import an image as a new capture.
pub async fn cmd_capture(settings: &Settings, image: PathBuf) -> anyhow::Result<()> {
    let fetcher = Arc::new(HttpImageFetcher::new(settings.fetch_timeout)?);
    let platform = platform_for(settings, fetcher);
    let store = open_gallery(settings, platform, Arc::new(FileImportCapture::new(image))).await?;

    let record = store.capture_photo().await?;

    println!("{} Added {}", success(), style(&record.file_path).cyan());
    println!("  {} {}", dim_arrow(), record.display_path);
    Ok(())
}

/// List gallery records.
pub async fn cmd_list(settings: &Settings, json: bool) -> anyhow::Result<()> {
    let fetcher = Arc::new(HttpImageFetcher::new(settings.fetch_timeout)?);
    let platform = platform_for(settings, fetcher);
    let store = open_gallery(settings, platform, Arc::new(NoCapture)).await?;

    let photos = store.load_photos().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&photos)?);
        return Ok(());
    }

    if photos.is_empty() {
        println!("No photos in gallery.");
        return Ok(());
    }

    println!("{} photo(s):", photos.len());
    for photo in &photos {
        println!("  {} {}", bullet(), style(&photo.file_path).cyan());
        println!("    {} {}", dim_arrow(), truncate(&photo.display_path, 96));
    }
    Ok(())
}

/// Shorten long display paths (browser data URLs) for terminal output.
fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let head: String = s.chars().take(max_chars).collect();
    format!("{}...", head)
}
