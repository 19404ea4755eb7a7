//! Process-wide logging setup.

use anyhow::{Context, Result};
use log::LevelFilter;
use std::str::FromStr;

use crate::config::LoggingConfig;

/// Install the global logger.
///
/// Lines go to stderr and, when `file` is set, are appended to that file.
/// With logging disabled only errors are printed.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let level = if config.enabled {
        LevelFilter::from_str(&config.level).with_context(|| format!("Invalid logging level '{}'", config.level))?
    } else {
        LevelFilter::Error
    };

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {:<5} {}] {}",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        // sqlx and hyper are chatty at debug level
        .level_for("sqlx", LevelFilter::Warn)
        .level_for("hyper", LevelFilter::Warn)
        .chain(std::io::stderr());

    if let Some(path) = config.file.as_ref().filter(|_| config.enabled) {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
        }
        let file = fern::log_file(path).with_context(|| format!("Failed to open log file: {}", path.display()))?;
        dispatch = dispatch.chain(file);
    }

    dispatch.apply().context("Logger already installed")?;
    Ok(())
}
