//! Text recognition commands.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::cli::icons::{dim_arrow, success, warn};
use photoscan::capture::NoCapture;
use photoscan::config::Settings;
use photoscan::ocr::{
    ImageLike, JobKind, JobOutput, JobPayload, OcrSourceType, TesseractTextRecognizer,
    TextRecognizer,
};
use photoscan::services::PhotoService;

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn image_like(input: &str) -> ImageLike {
    if input.contains("://") {
        ImageLike::Uri(input.to_string())
    } else {
        ImageLike::Path(PathBuf::from(input))
    }
}

/// Run recognize (or detect) jobs for each image on the worker pool.
pub async fn cmd_recognize(
    settings: &Settings,
    images: &[String],
    detect: bool,
) -> anyhow::Result<()> {
    let pb = spinner(format!(
        "Starting {} recognition worker(s) ({})...",
        settings.pool.workers, settings.pool.language
    ));
    let service = PhotoService::from_settings(settings, Arc::new(NoCapture)).await;
    pb.finish_and_clear();
    let service = service?;

    let kind = if detect {
        JobKind::Detect
    } else {
        JobKind::Recognize
    };

    let pb = spinner(format!("Processing {} image(s)...", images.len()));
    let jobs = images.iter().map(|input| {
        let service = &service;
        async move {
            let result = service
                .submit_job(kind, JobPayload::Image(image_like(input)))
                .await;
            (input, result)
        }
    });
    let results = futures::future::join_all(jobs).await;
    pb.finish_and_clear();

    let mut failed = 0usize;
    for (input, result) in results {
        match result {
            Ok(output) => print_output(input, &output),
            Err(e) => {
                failed += 1;
                eprintln!("{} {}: {}", warn(), input, e);
            }
        }
    }

    service.shutdown().await;

    if failed > 0 {
        anyhow::bail!("{} of {} image(s) failed", failed, images.len());
    }
    Ok(())
}

fn print_output(input: &str, output: &JobOutput) {
    println!("{} {}", success(), style(input).cyan());
    match output {
        JobOutput::Recognized(r) => {
            if let Some(confidence) = r.confidence {
                println!(
                    "  {} confidence {:.0}%, {} ms",
                    dim_arrow(),
                    confidence * 100.0,
                    r.processing_time_ms
                );
            }
            println!("{}", r.text.trim_end());
        }
        JobOutput::Detected(d) => {
            if let Some(degrees) = d.orientation_degrees {
                println!("  {} orientation: {}°", dim_arrow(), degrees);
            }
            if let Some(ref script) = d.script {
                println!("  {} script: {}", dim_arrow(), script);
            }
        }
        JobOutput::Configured(c) => {
            for (key, value) in &c.parameters {
                println!("  {} {} = {}", dim_arrow(), key, value);
            }
        }
    }
}

/// Read one image with the secondary engine.
pub async fn cmd_ocr(settings: &Settings, image: &Path) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(image)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", image.display(), e))?;
    let data = base64::engine::general_purpose::STANDARD.encode(bytes);

    let recognizer =
        TesseractTextRecognizer::new(&settings.tesseract.binary, &settings.pool.language);
    let result = recognizer.rec_text(OcrSourceType::Base64, &data).await?;

    if !result.found_text {
        println!("{} No text found in {}", warn(), image.display());
        return Ok(());
    }

    println!(
        "{} {} block(s), {} line(s), {} word(s) in {} ms",
        success(),
        result.blocks.len(),
        result.lines.len(),
        result.words.len(),
        result.processing_time_ms
    );
    println!("{}", result.text());
    Ok(())
}
