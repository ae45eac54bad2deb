// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Per-pebble telemetry samples

use super::error::TelemetryError;
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};

/// One radioisotope in a pebble's inventory
///
/// `decay_energy` is a power coefficient per unit of remaining activity, so a fresh
/// inventory already contributes `initial_mass * decay_energy`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Isotope {
    pub half_life: Duration,
    pub initial_mass: f64,
    pub decay_energy: f64,
}

impl Isotope {
    pub fn new(half_life: Duration, initial_mass: f64, decay_energy: f64) -> Self {
        Self {
            half_life,
            initial_mass,
            decay_energy,
        }
    }
}

/// One telemetry sample from one fuel pebble
///
/// Created by an external producer, consumed once by a processing worker, never retained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PebbleTelemetry {
    pub pebble_id: i64,
    pub isotopes: Vec<Isotope>,
    pub timestamp: SystemTime,
}

impl PebbleTelemetry {
    pub fn new(pebble_id: i64, isotopes: Vec<Isotope>, timestamp: SystemTime) -> Self {
        Self {
            pebble_id,
            isotopes,
            timestamp,
        }
    }

    /// Sample stamped with the current wall-clock time
    pub fn sampled_now(pebble_id: i64, isotopes: Vec<Isotope>) -> Self {
        Self::new(pebble_id, isotopes, SystemTime::now())
    }

    /// Boundary check run before a sample is admitted to the pipeline.
    ///
    /// The decay model divides by the half-life and does not guard its inputs, so every
    /// sample must pass through here first. Future timestamps are *not* rejected.
    pub fn validate(&self) -> Result<(), TelemetryError> {
        for (isotope_index, isotope) in self.isotopes.iter().enumerate() {
            if isotope.half_life.is_zero() {
                return Err(TelemetryError::ZeroHalfLife {
                    pebble_id: self.pebble_id,
                    isotope_index,
                });
            }
            if !isotope.initial_mass.is_finite() || isotope.initial_mass < 0.0 {
                return Err(TelemetryError::InvalidMass {
                    pebble_id: self.pebble_id,
                    isotope_index,
                    value: isotope.initial_mass,
                });
            }
            if !isotope.decay_energy.is_finite() || isotope.decay_energy < 0.0 {
                return Err(TelemetryError::InvalidDecayEnergy {
                    pebble_id: self.pebble_id,
                    isotope_index,
                    value: isotope.decay_energy,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn isotope(half_life_secs: u64) -> Isotope {
        Isotope::new(Duration::from_secs(half_life_secs), 1.0, 100.0)
    }

    #[test]
    fn test_valid_sample_passes() {
        let sample = PebbleTelemetry::sampled_now(7, vec![isotope(10), isotope(3600)]);
        assert!(sample.validate().is_ok());
    }

    #[test]
    fn test_empty_inventory_is_valid() {
        let sample = PebbleTelemetry::sampled_now(1, Vec::new());
        assert!(sample.validate().is_ok());
    }

    #[test]
    fn test_zero_half_life_rejected() {
        let sample = PebbleTelemetry::sampled_now(42, vec![isotope(10), isotope(0)]);
        assert_eq!(
            sample.validate(),
            Err(TelemetryError::ZeroHalfLife {
                pebble_id: 42,
                isotope_index: 1
            })
        );
    }

    #[test]
    fn test_negative_and_nan_values_rejected() {
        let negative_mass = PebbleTelemetry::sampled_now(
            3,
            vec![Isotope::new(Duration::from_secs(1), -1.0, 1.0)],
        );
        assert!(matches!(
            negative_mass.validate(),
            Err(TelemetryError::InvalidMass { pebble_id: 3, .. })
        ));

        let nan_energy = PebbleTelemetry::sampled_now(
            4,
            vec![Isotope::new(Duration::from_secs(1), 1.0, f64::NAN)],
        );
        let err = nan_energy.validate().unwrap_err();
        assert!(matches!(err, TelemetryError::InvalidDecayEnergy { .. }));
        assert_eq!(err.pebble_id(), 4);
    }

    #[test]
    fn test_future_timestamp_is_accepted() {
        let future = SystemTime::now() + Duration::from_secs(60);
        let sample = PebbleTelemetry::new(5, vec![isotope(10)], future);
        assert!(sample.validate().is_ok());
    }

    #[test]
    fn test_serde_json_shape() {
        let sample = PebbleTelemetry::sampled_now(9, vec![isotope(10)]);
        let json = serde_json::to_value(&sample).unwrap();
        assert_eq!(json["pebble_id"], 9);
        assert_eq!(json["isotopes"][0]["half_life"]["secs"], 10);
    }
}
