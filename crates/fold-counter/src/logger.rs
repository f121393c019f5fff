//! Logging using simplelog
//!
//! Logs go to stderr by default so they do not mix with the state printout on
//! stdout. With `log_dir` configured they go to a timestamped file instead.

use anyhow::{Context, Result};
use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode, WriteLogger};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Level from RUST_LOG, info when unset or unknown
fn level_from_env() -> LevelFilter {
    std::env::var("RUST_LOG")
        .map(|v| parse_level(&v))
        .unwrap_or(LevelFilter::Info)
}

fn parse_level(value: &str) -> LevelFilter {
    match value.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

fn log_file_name() -> String {
    let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    format!("fold-counter-{}.log", timestamp)
}

/// Initialize logging
///
/// Returns the log file path when logging to a file.
pub fn init(log_dir: Option<&Path>) -> Result<Option<PathBuf>> {
    let level = level_from_env();

    // Configure simplelog with timestamps
    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_time_offset_to_local()
        .unwrap_or_else(|c| c) // Fallback if local time offset fails
        .build();

    match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let log_file = dir.join(log_file_name());
            let file = File::create(&log_file)
                .with_context(|| format!("Failed to create log file {}", log_file.display()))?;
            WriteLogger::init(level, config, file).context("Failed to initialize logger")?;
            Ok(Some(log_file))
        }
        None => {
            TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto)
                .context("Failed to initialize logger")?;
            Ok(None)
        }
    }
}
