//! File logging.
//!
//! The terminal belongs to the UI, so log lines only ever go to
//! `<log dir>/csv-form.log`. `RUST_LOG` overrides the configured level.

use anyhow::{Context, Result};
use std::fs;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

pub const LOG_FILE: &str = "csv-form.log";

/// Install the global subscriber when logging is enabled in `config`.
pub fn init(config: &Config) -> Result<()> {
    if !config.log_enabled() {
        return Ok(());
    }

    let logs_dir = config.log_dir()?;
    fs::create_dir_all(&logs_dir)
        .with_context(|| format!("create log directory {}", logs_dir.display()))?;

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(config.log_level())
            .with_context(|| format!("invalid log level {:?}", config.log_level()))?,
    };

    let file_appender = tracing_appender::rolling::never(&logs_dir, LOG_FILE);
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init()
        .context("install log subscriber")?;

    tracing::info!(dir = %logs_dir.display(), "logging started");
    Ok(())
}
