use super::{LogLevel, LogRecord};
use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::pipeline::Phase;

/// Append-only run log.
///
/// Write failures are reported through `tracing` and otherwise ignored; a
/// broken log must never fail a run.
pub struct RunLog {
    path: Option<PathBuf>,
    lock: Mutex<()>,
}

impl RunLog {
    pub fn new(log_dir: &Path, run_id: &str) -> Self {
        Self {
            path: Some(Self::path_for(log_dir, run_id)),
            lock: Mutex::new(()),
        }
    }

    /// A log that only mirrors to `tracing`.
    pub fn disabled() -> Self {
        Self {
            path: None,
            lock: Mutex::new(()),
        }
    }

    pub fn path_for(log_dir: &Path, run_id: &str) -> PathBuf {
        log_dir.join(format!("{}.jsonl", run_id))
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn record(&self, record: LogRecord) {
        mirror(&record);
        if let Some(ref path) = self.path
            && let Err(e) = self.append(path, &record)
        {
            tracing::warn!(path = %path.display(), error = %e, "failed to append run log record");
        }
    }

    pub fn debug(&self, phase: Phase, message: impl Into<String>) {
        self.record(LogRecord::new(LogLevel::Debug, phase, message));
    }

    pub fn info(&self, phase: Phase, message: impl Into<String>) {
        self.record(LogRecord::new(LogLevel::Info, phase, message));
    }

    pub fn warn(&self, phase: Phase, message: impl Into<String>) {
        self.record(LogRecord::new(LogLevel::Warn, phase, message));
    }

    pub fn error(&self, phase: Phase, message: impl Into<String>) {
        self.record(LogRecord::new(LogLevel::Error, phase, message));
    }

    fn append(&self, path: &Path, record: &LogRecord) -> Result<()> {
        let _held = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create log directory")?;
        }
        let line = serde_json::to_string(record).context("Failed to serialize log record")?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open run log {}", path.display()))?;
        writeln!(file, "{}", line).context("Failed to write run log record")?;
        Ok(())
    }

    /// Read every record back, skipping lines that don't parse.
    pub fn read(path: &Path) -> Result<Vec<LogRecord>> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read run log {}", path.display()))?;
        Ok(content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .filter_map(|l| serde_json::from_str(l).ok())
            .collect())
    }
}

fn mirror(record: &LogRecord) {
    let oracle = record.oracle.as_deref().unwrap_or("-");
    let phase = record.phase.as_str();
    let msg = record.message.as_str();
    match record.level {
        LogLevel::Debug => {
            tracing::debug!(phase, oracle, duration_ms = record.duration, "{}", msg)
        }
        LogLevel::Info => {
            tracing::info!(phase, oracle, duration_ms = record.duration, "{}", msg)
        }
        LogLevel::Warn => {
            tracing::warn!(phase, oracle, duration_ms = record.duration, "{}", msg)
        }
        LogLevel::Error => {
            tracing::error!(phase, oracle, duration_ms = record.duration, "{}", msg)
        }
    }
}
