//! Process-wide tracing setup.
//!
//! Human-readable events go to stderr so stdout stays clean for command
//! output. When `[logging] json_dir` is set, the same events are also written
//! as JSON lines to a daily-rotated file there.

use anyhow::Result;
use std::io;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::shipyard_config::LoggingSection;

/// Keeps the non-blocking file writer alive. Drop it at exit to flush.
pub struct LogGuard {
    _guard: Option<WorkerGuard>,
}

/// Install the global subscriber. `verbose` forces debug level.
///
/// `RUST_LOG` still wins over both when set.
pub fn init(config: &LoggingSection, verbose: bool) -> Result<LogGuard> {
    let default_level = if verbose {
        Level::DEBUG
    } else {
        parse_log_level(&config.level)?
    };

    let env_filter = || {
        EnvFilter::builder()
            .with_default_directive(default_level.into())
            .from_env_lossy()
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .with_filter(env_filter());

    let guard = if let Some(ref json_dir) = config.json_dir {
        std::fs::create_dir_all(json_dir)?;
        let file_appender = rolling::daily(json_dir, "shipyard.log");
        let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

        let file_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(non_blocking_file)
            .with_ansi(false)
            .with_current_span(true)
            .with_target(true)
            .with_filter(env_filter());

        tracing_subscriber::registry()
            .with(stderr_layer)
            .with(file_layer)
            .try_init()?;
        Some(guard)
    } else {
        tracing_subscriber::registry().with(stderr_layer).try_init()?;
        None
    };

    tracing::debug!(
        level = %default_level,
        json_file = config.json_dir.is_some(),
        "logger initialized"
    );

    Ok(LogGuard { _guard: guard })
}

fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!("Invalid log level: {level}"),
    }
}
