//! Structured Logger
//!
//! Wraps `tracing` to provide human console output, optional NDJSON file
//! rotation, and environment-based level control.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Rolling files are named `medibook.YYYY-MM-DD.log`.
pub const LOG_FILE_PREFIX: &str = "medibook";

/// Initialize the global subscriber.
///
/// `RUST_LOG` overrides `level`. When `log_dir` is set, a JSON layer writes to
/// a daily-rotated file there as well. Calling this twice is harmless; the
/// second call leaves the first subscriber in place.
pub fn init_logger(level: &str, log_dir: Option<&Path>) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("Invalid log level directive: {level}"))?;

    let file_layer = match log_dir {
        Some(dir) => Some(
            fmt::layer()
                .json()
                .with_writer(file_appender(dir)?)
                .with_ansi(false),
        ),
        None => None,
    };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(true);

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();
    Ok(())
}

fn file_appender(dir: &Path) -> Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .build(dir)
        .with_context(|| format!("Failed to open log directory: {}", dir.display()))
}
