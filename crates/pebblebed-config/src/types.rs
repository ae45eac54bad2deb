// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! This module defines the structs that map to sections in `pebblebed.toml`.

use pebblebed_physics::{LinearCoolantModel, TimestampPolicy};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Aggregator tick period used when `aggregation_interval_ms` is omitted
pub const DEFAULT_AGGREGATION_INTERVAL_MS: u64 = 10;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PebbleBedConfig {
    pub engine: EngineSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl PebbleBedConfig {
    pub fn new(engine: EngineSettings) -> Self {
        Self {
            engine,
            logging: LoggingSettings::default(),
        }
    }
}

/// `[engine]` section
///
/// ```toml
/// [engine]
/// max_coolant_temp = 1000.0
/// ingestion_workers = 2
/// processing_workers = 4
/// buffer_size = 1024
/// # optional
/// aggregation_interval_ms = 10
/// timestamp_policy = "extrapolate"   # or "clamp_to_now"
///
/// [engine.coolant]
/// base_temp = 300.0
/// heat_coefficient = 0.01
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EngineSettings {
    /// SCRAM threshold on the derived coolant temperature
    pub max_coolant_temp: f64,
    pub ingestion_workers: usize,
    pub processing_workers: usize,
    /// Capacity of every internal queue
    pub buffer_size: usize,
    #[serde(default = "default_aggregation_interval_ms")]
    pub aggregation_interval_ms: u64,
    #[serde(default)]
    pub coolant: LinearCoolantModel,
    #[serde(default)]
    pub timestamp_policy: TimestampPolicy,
}

fn default_aggregation_interval_ms() -> u64 {
    DEFAULT_AGGREGATION_INTERVAL_MS
}

impl EngineSettings {
    pub fn new(
        max_coolant_temp: f64,
        ingestion_workers: usize,
        processing_workers: usize,
        buffer_size: usize,
    ) -> Self {
        Self {
            max_coolant_temp,
            ingestion_workers,
            processing_workers,
            buffer_size,
            aggregation_interval_ms: DEFAULT_AGGREGATION_INTERVAL_MS,
            coolant: LinearCoolantModel::reference(),
            timestamp_policy: TimestampPolicy::default(),
        }
    }
}

/// `[logging]` section
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// trace, debug, info, warn, error
    pub level: String,
    /// Per-run JSON log files are written here when set
    pub log_dir: Option<PathBuf>,
    /// Number of run folders kept in `log_dir`
    pub retention_runs: usize,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: None,
            retention_runs: 10,
        }
    }
}
