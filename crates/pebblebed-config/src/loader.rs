// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! 3-tier loading:
//! 1. TOML file (base values)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)
//!
//! Validation runs after all overrides are applied.

use crate::validation::validate_config;
use crate::{ConfigError, ConfigResult, PebbleBedConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default config file name
pub const CONFIG_FILE_NAME: &str = "pebblebed.toml";

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "PEBBLEBED_CONFIG_PATH";

/// Find the configuration file
///
/// Search order:
/// 1. `PEBBLEBED_CONFIG_PATH` environment variable
/// 2. Current working directory: `./pebblebed.toml`
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by {} not found: {}",
            CONFIG_PATH_ENV,
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));
        let mut current = cwd.as_path();
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent;
                }
                None => break,
            }
        }
    }

    if let Some(found) = search_paths.iter().find(|p| p.exists()) {
        return Ok(found.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet {} to specify a custom location.",
        CONFIG_FILE_NAME, search_list, CONFIG_PATH_ENV
    )))
}

/// Load configuration from TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if config file is not found, contains invalid TOML, misses a required
/// engine setting, or fails validation
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<PebbleBedConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: PebbleBedConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    validate_config(&config)?;
    Ok(config)
}

fn parse_into<T: FromStr>(raw: Option<String>, target: &mut T) {
    if let Some(parsed) = raw.and_then(|value| value.trim().parse::<T>().ok()) {
        *target = parsed;
    }
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `PEBBLEBED_MAX_COOLANT_TEMP` -> `engine.max_coolant_temp`
/// - `PEBBLEBED_INGESTION_WORKERS` -> `engine.ingestion_workers`
/// - `PEBBLEBED_PROCESSING_WORKERS` -> `engine.processing_workers`
/// - `PEBBLEBED_BUFFER_SIZE` -> `engine.buffer_size`
/// - `PEBBLEBED_AGGREGATION_INTERVAL_MS` -> `engine.aggregation_interval_ms`
/// - `PEBBLEBED_LOG_LEVEL` -> `logging.level`
/// - `PEBBLEBED_LOG_DIR` -> `logging.log_dir`
///
/// Unparseable numeric values are ignored.
pub fn apply_environment_overrides(config: &mut PebbleBedConfig) {
    let engine = &mut config.engine;
    parse_into(env::var("PEBBLEBED_MAX_COOLANT_TEMP").ok(), &mut engine.max_coolant_temp);
    parse_into(env::var("PEBBLEBED_INGESTION_WORKERS").ok(), &mut engine.ingestion_workers);
    parse_into(env::var("PEBBLEBED_PROCESSING_WORKERS").ok(), &mut engine.processing_workers);
    parse_into(env::var("PEBBLEBED_BUFFER_SIZE").ok(), &mut engine.buffer_size);
    parse_into(
        env::var("PEBBLEBED_AGGREGATION_INTERVAL_MS").ok(),
        &mut engine.aggregation_interval_ms,
    );

    if let Ok(value) = env::var("PEBBLEBED_LOG_LEVEL") {
        config.logging.level = value;
    }
    if let Ok(value) = env::var("PEBBLEBED_LOG_DIR") {
        config.logging.log_dir = Some(PathBuf::from(value));
    }
}

/// Apply CLI argument overrides to configuration
///
/// # Arguments
///
/// * `config` - Configuration to modify
/// * `cli_args` - Map of CLI arguments (e.g., `{"max_coolant_temp": "950", "buffer_size": "4096"}`)
pub fn apply_cli_overrides(config: &mut PebbleBedConfig, cli_args: &HashMap<String, String>) {
    let engine = &mut config.engine;
    parse_into(cli_args.get("max_coolant_temp").cloned(), &mut engine.max_coolant_temp);
    parse_into(cli_args.get("ingestion_workers").cloned(), &mut engine.ingestion_workers);
    parse_into(cli_args.get("processing_workers").cloned(), &mut engine.processing_workers);
    parse_into(cli_args.get("buffer_size").cloned(), &mut engine.buffer_size);
    parse_into(
        cli_args.get("aggregation_interval_ms").cloned(),
        &mut engine.aggregation_interval_ms,
    );

    if let Some(value) = cli_args.get("log_level") {
        config.logging.level = value.clone();
    }
    if let Some(value) = cli_args.get("log_dir") {
        config.logging.log_dir = Some(PathBuf::from(value));
    }
}
