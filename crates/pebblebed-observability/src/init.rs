// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Unified logging initialization
//!
//! Console output always; when a log directory is configured, a timestamped run folder
//! with a combined JSON log is created and old run folders are pruned.

use anyhow::{Context, Result};
use chrono::{NaiveDateTime, Utc};
use std::path::{Path, PathBuf};
use tracing_appender::rolling;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;
use crate::config::{LogFormat, LoggingConfig};

const RUN_PREFIX: &str = "run_";
const RUN_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Keeps file writers alive; logs are flushed when this is dropped
pub struct LoggingGuard {
    _file_guards: Vec<tracing_appender::non_blocking::WorkerGuard>,
    run_dir: Option<PathBuf>,
}

impl LoggingGuard {
    /// Folder holding this run's log files, if file logging is enabled
    pub fn run_dir(&self) -> Option<&Path> {
        self.run_dir.as_deref()
    }
}

/// Initialize the global `tracing` subscriber
///
/// ```text
/// <log_dir>/
///   └── run_20250101_120000/
///       └── pebblebed.log.2025-01-01   (JSON, daily rotation)
/// ```
///
/// # Errors
/// Fails if the run folder cannot be created or a global subscriber is already set.
pub fn init_logging(config: &LoggingConfig, debug_flags: &CrateDebugFlags) -> Result<LoggingGuard> {
    let filter = debug_flags.to_filter_string(&config.level);

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    let mut file_guards = Vec::new();

    let console_layer = match config.format {
        LogFormat::Text => tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_names(true)
            .with_filter(EnvFilter::new(&filter))
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_thread_names(true)
            .with_filter(EnvFilter::new(&filter))
            .boxed(),
    };
    layers.push(console_layer);

    let run_dir = match &config.log_dir {
        Some(base_log_dir) => {
            let run_dir = create_run_dir(base_log_dir)?;
            cleanup_old_runs(base_log_dir, config.retention_runs)?;

            let file_appender = rolling::daily(&run_dir, "pebblebed.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            file_guards.push(guard);

            layers.push(
                tracing_subscriber::fmt::layer()
                    .with_writer(non_blocking)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_thread_names(true)
                    .json()
                    .with_filter(EnvFilter::new(&filter))
                    .boxed(),
            );
            Some(run_dir)
        }
        None => None,
    };

    Registry::default()
        .with(layers)
        .try_init()
        .context("A global tracing subscriber is already installed")?;

    tracing::info!("[LOGGING] Initialized with filter '{}'", filter);
    if let Some(dir) = &run_dir {
        tracing::info!("[LOGGING] Writing JSON logs to {}", dir.display());
    }

    Ok(LoggingGuard {
        _file_guards: file_guards,
        run_dir,
    })
}

/// Initialize console-only logging at `info` with the given debug flags
pub fn init_logging_default(debug_flags: &CrateDebugFlags) -> Result<LoggingGuard> {
    init_logging(&LoggingConfig::default(), debug_flags)
}

fn create_run_dir(base_log_dir: &Path) -> Result<PathBuf> {
    let timestamp = Utc::now().format(RUN_TIMESTAMP_FORMAT);
    let run_dir = base_log_dir.join(format!("{}{}", RUN_PREFIX, timestamp));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("Failed to create log directory: {}", run_dir.display()))?;
    Ok(run_dir)
}

/// Remove all but the `retention_runs` most recent `run_*` folders under `base_log_dir`
pub(crate) fn cleanup_old_runs(base_log_dir: &Path, retention_runs: usize) -> Result<usize> {
    if !base_log_dir.exists() {
        return Ok(0);
    }

    let mut runs: Vec<(PathBuf, NaiveDateTime)> = Vec::new();
    for entry in std::fs::read_dir(base_log_dir)
        .with_context(|| format!("Failed to list {}", base_log_dir.display()))?
    {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let stamp = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_prefix(RUN_PREFIX))
            .and_then(|s| NaiveDateTime::parse_from_str(s, RUN_TIMESTAMP_FORMAT).ok());
        if let Some(stamp) = stamp {
            runs.push((path, stamp));
        }
    }

    if runs.len() <= retention_runs {
        return Ok(0);
    }

    // Oldest first
    runs.sort_by_key(|(_, stamp)| *stamp);
    let excess = runs.len() - retention_runs;
    let mut removed = 0;
    for (path, _) in runs.into_iter().take(excess) {
        match std::fs::remove_dir_all(&path) {
            Ok(()) => removed += 1,
            Err(e) => eprintln!(
                "Warning: Failed to remove old log directory {}: {}",
                path.display(),
                e
            ),
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_cleanup_keeps_most_recent_runs() {
        let dir = tempdir().unwrap();
        for stamp in [
            "20240101_000000",
            "20240102_000000",
            "20240103_000000",
            "20240104_000000",
        ] {
            std::fs::create_dir(dir.path().join(format!("run_{}", stamp))).unwrap();
        }
        // Unrelated folders are left alone
        std::fs::create_dir(dir.path().join("archive")).unwrap();

        let removed = cleanup_old_runs(dir.path(), 2).unwrap();
        assert_eq!(removed, 2);
        assert!(!dir.path().join("run_20240101_000000").exists());
        assert!(!dir.path().join("run_20240102_000000").exists());
        assert!(dir.path().join("run_20240103_000000").exists());
        assert!(dir.path().join("run_20240104_000000").exists());
        assert!(dir.path().join("archive").exists());
    }

    #[test]
    fn test_cleanup_missing_dir_is_noop() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert_eq!(cleanup_old_runs(&missing, 1).unwrap(), 0);
    }

    #[test]
    fn test_create_run_dir_naming() {
        let dir = tempdir().unwrap();
        let run_dir = create_run_dir(dir.path()).unwrap();
        let name = run_dir.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with(RUN_PREFIX));
        assert!(NaiveDateTime::parse_from_str(&name[RUN_PREFIX.len()..], RUN_TIMESTAMP_FORMAT).is_ok());
    }
}
