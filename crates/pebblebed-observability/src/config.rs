// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Observability configuration types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Console format
    pub format: LogFormat,

    /// Base directory for per-run JSON log files (console only when `None`)
    pub log_dir: Option<PathBuf>,

    /// Keep this many most recent run folders in `log_dir`
    pub retention_runs: usize,
}

/// Log format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            format: LogFormat::Text,
            log_dir: None,
            retention_runs: 10,
        }
    }
}
