//! Configuration commands.

use console::style;

use photoscan::config::Settings;
use photoscan::ocr::PoolStartup;

/// Print the effective settings.
pub fn cmd_config_show(settings: &Settings) -> anyhow::Result<()> {
    let startup = match settings.pool.startup {
        PoolStartup::AllOrNothing => "all-or-nothing".to_string(),
        PoolStartup::Degraded { min_workers } => format!("degraded (min {})", min_workers),
    };
    let tessdata = settings
        .tesseract
        .tessdata_dir
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(tesseract default)".to_string());

    let rows = [
        ("data_dir", settings.data_dir.display().to_string()),
        ("preferences", settings.preferences_path().display().to_string()),
        ("runtime", settings.runtime.to_string()),
        ("servable_host", settings.servable_host.clone()),
        (
            "fetch_timeout",
            format!("{}s", settings.fetch_timeout.as_secs()),
        ),
        ("workers", settings.pool.workers.to_string()),
        ("language", settings.pool.language.clone()),
        ("startup", startup),
        ("tesseract", settings.tesseract.binary.clone()),
        ("tessdata", tessdata),
        (
            "scanner",
            format!(
                "{} {}",
                settings.scanner_program,
                settings.scanner_args.join(" ")
            )
            .trim_end()
            .to_string(),
        ),
    ];

    for (key, value) in rows {
        println!("{:<14} {}", style(key).bold(), value);
    }
    Ok(())
}
