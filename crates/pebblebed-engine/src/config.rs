// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Engine construction parameters

use std::sync::Arc;
use std::time::Duration;

use pebblebed_config::{EngineSettings, DEFAULT_AGGREGATION_INTERVAL_MS};
use pebblebed_physics::{CoolantModel, LinearCoolantModel, TimestampPolicy};

use crate::error::{EngineError, EngineResult};

/// Configuration accepted by [`TelemetryEngine::new`](crate::TelemetryEngine::new)
///
/// The four safety-relevant fields are required by `new`. The remaining knobs start at
/// documented values (10 ms ticks, reference linear coolant model, `Extrapolate`) and
/// are changed through the `with_*` builders.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// SCRAM fires once the derived coolant temperature exceeds this
    pub max_coolant_temp: f64,
    pub ingestion_workers: usize,
    pub processing_workers: usize,
    /// Capacity of the intake, processing and fragment queues
    pub buffer_size: usize,
    pub aggregation_interval: Duration,
    pub coolant: Arc<dyn CoolantModel>,
    pub timestamp_policy: TimestampPolicy,
}

impl EngineConfig {
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
            aggregation_interval: Duration::from_millis(DEFAULT_AGGREGATION_INTERVAL_MS),
            coolant: Arc::new(LinearCoolantModel::reference()),
            timestamp_policy: TimestampPolicy::default(),
        }
    }

    /// Build from the `[engine]` section of a loaded config file
    pub fn from_settings(settings: &EngineSettings) -> Self {
        Self::new(
            settings.max_coolant_temp,
            settings.ingestion_workers,
            settings.processing_workers,
            settings.buffer_size,
        )
        .with_aggregation_interval(Duration::from_millis(settings.aggregation_interval_ms))
        .with_coolant_model(Arc::new(settings.coolant))
        .with_timestamp_policy(settings.timestamp_policy)
    }

    pub fn with_aggregation_interval(mut self, interval: Duration) -> Self {
        self.aggregation_interval = interval;
        self
    }

    pub fn with_coolant_model(mut self, coolant: Arc<dyn CoolantModel>) -> Self {
        self.coolant = coolant;
        self
    }

    pub fn with_timestamp_policy(mut self, policy: TimestampPolicy) -> Self {
        self.timestamp_policy = policy;
        self
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> EngineResult<()> {
        if !self.max_coolant_temp.is_finite() {
            return Err(EngineError::InvalidConfig(format!(
                "max_coolant_temp must be finite, got {}",
                self.max_coolant_temp
            )));
        }
        if self.ingestion_workers == 0 {
            return Err(EngineError::InvalidConfig(
                "ingestion_workers must be at least 1".to_string(),
            ));
        }
        if self.processing_workers == 0 {
            return Err(EngineError::InvalidConfig(
                "processing_workers must be at least 1".to_string(),
            ));
        }
        if self.buffer_size == 0 {
            return Err(EngineError::InvalidConfig(
                "buffer_size must be at least 1".to_string(),
            ));
        }
        if self.aggregation_interval.is_zero() {
            return Err(EngineError::InvalidConfig(
                "aggregation_interval must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Threads a running engine owns: both worker pools, the aggregator and the SCRAM listener
    pub fn thread_count(&self) -> usize {
        self.ingestion_workers + self.processing_workers + 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_for_optional_knobs() {
        let config = EngineConfig::new(1000.0, 2, 4, 128);
        assert_eq!(config.aggregation_interval, Duration::from_millis(10));
        assert_eq!(config.timestamp_policy, TimestampPolicy::Extrapolate);
        assert_eq!(config.coolant.coolant_temp(0.0), 300.0);
        assert_eq!(config.thread_count(), 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_and_non_finite() {
        let cases = [
            EngineConfig::new(f64::NAN, 1, 1, 1),
            EngineConfig::new(f64::INFINITY, 1, 1, 1),
            EngineConfig::new(1000.0, 0, 1, 1),
            EngineConfig::new(1000.0, 1, 0, 1),
            EngineConfig::new(1000.0, 1, 1, 0),
            EngineConfig::new(1000.0, 1, 1, 1).with_aggregation_interval(Duration::ZERO),
        ];
        for config in cases {
            assert!(
                matches!(config.validate(), Err(EngineError::InvalidConfig(_))),
                "{:?} should be rejected",
                config
            );
        }
    }

    #[test]
    fn test_from_settings() {
        let mut settings = EngineSettings::new(750.0, 3, 5, 64);
        settings.aggregation_interval_ms = 25;
        settings.coolant = LinearCoolantModel::new(280.0, 0.02);
        settings.timestamp_policy = TimestampPolicy::ClampToNow;

        let config = EngineConfig::from_settings(&settings);
        assert_eq!(config.max_coolant_temp, 750.0);
        assert_eq!(config.ingestion_workers, 3);
        assert_eq!(config.processing_workers, 5);
        assert_eq!(config.buffer_size, 64);
        assert_eq!(config.aggregation_interval, Duration::from_millis(25));
        assert_eq!(config.timestamp_policy, TimestampPolicy::ClampToNow);
        assert!((config.coolant.coolant_temp(100.0) - 282.0).abs() < 1e-9);
    }
}
