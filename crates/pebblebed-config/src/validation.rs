// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Collects every problem in one pass so an operator sees the whole list at once.

use crate::{ConfigError, ConfigResult, PebbleBedConfig};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    MustBePositive { field: String },
    NotFinite { field: String, value: f64 },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MustBePositive { field } => write!(f, "{} must be greater than zero", field),
            Self::NotFinite { field, value } => {
                write!(f, "{} must be a finite number (got {})", field, value)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every violation
pub fn validate_config(config: &PebbleBedConfig) -> ConfigResult<()> {
    let errors = collect_errors(config);
    if errors.is_empty() {
        return Ok(());
    }

    let error_messages = errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::ValidationError(format!(
        "Configuration validation failed:\n{}",
        error_messages
    )))
}

/// All violations, in field order
pub fn collect_errors(config: &PebbleBedConfig) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();
    validate_engine(config, &mut errors);
    validate_logging(config, &mut errors);
    errors
}

fn validate_engine(config: &PebbleBedConfig, errors: &mut Vec<ConfigValidationError>) {
    let engine = &config.engine;

    for (field, value) in [
        ("engine.ingestion_workers", engine.ingestion_workers),
        ("engine.processing_workers", engine.processing_workers),
        ("engine.buffer_size", engine.buffer_size),
    ] {
        if value == 0 {
            errors.push(ConfigValidationError::MustBePositive {
                field: field.to_string(),
            });
        }
    }

    if engine.aggregation_interval_ms == 0 {
        errors.push(ConfigValidationError::MustBePositive {
            field: "engine.aggregation_interval_ms".to_string(),
        });
    }

    for (field, value) in [
        ("engine.max_coolant_temp", engine.max_coolant_temp),
        ("engine.coolant.base_temp", engine.coolant.base_temp),
        ("engine.coolant.heat_coefficient", engine.coolant.heat_coefficient),
    ] {
        if !value.is_finite() {
            errors.push(ConfigValidationError::NotFinite {
                field: field.to_string(),
                value,
            });
        }
    }
}

fn validate_logging(config: &PebbleBedConfig, errors: &mut Vec<ConfigValidationError>) {
    let level = config.logging.level.to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.level".to_string(),
            reason: format!("'{}' is not one of {}", config.logging.level, LOG_LEVELS.join(", ")),
        });
    }
    if config.logging.log_dir.is_some() && config.logging.retention_runs == 0 {
        errors.push(ConfigValidationError::MustBePositive {
            field: "logging.retention_runs".to_string(),
        });
    }
}
