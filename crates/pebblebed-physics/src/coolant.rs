// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Coolant temperature estimation
//!
//! The aggregator gates SCRAM on the value produced here, so every model must state its
//! formula exactly. Thermal-hydraulics proper is out of scope; the reference model is a
//! linear placeholder.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Converts reactor-wide decay heat into a coolant temperature estimate
pub trait CoolantModel: Send + Sync + Debug {
    /// Coolant temperature for the given total decay heat
    fn coolant_temp(&self, total_decay_heat: f64) -> f64;

    /// Human-readable formula, logged once at engine start
    fn describe(&self) -> String;
}

/// `coolant_temp = base_temp + heat_coefficient × total_decay_heat`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearCoolantModel {
    pub base_temp: f64,
    pub heat_coefficient: f64,
}

impl LinearCoolantModel {
    /// Reference inlet temperature
    pub const REFERENCE_BASE_TEMP: f64 = 300.0;
    /// Reference temperature rise per unit of decay heat
    pub const REFERENCE_HEAT_COEFFICIENT: f64 = 0.01;

    pub fn new(base_temp: f64, heat_coefficient: f64) -> Self {
        Self {
            base_temp,
            heat_coefficient,
        }
    }

    /// Placeholder scale used by the reference simulator
    pub fn reference() -> Self {
        Self::new(Self::REFERENCE_BASE_TEMP, Self::REFERENCE_HEAT_COEFFICIENT)
    }

    /// Total decay heat at which this model reaches `coolant_temp`
    pub fn heat_for_temp(&self, coolant_temp: f64) -> f64 {
        (coolant_temp - self.base_temp) / self.heat_coefficient
    }
}

impl Default for LinearCoolantModel {
    fn default() -> Self {
        Self::reference()
    }
}

impl CoolantModel for LinearCoolantModel {
    #[inline]
    fn coolant_temp(&self, total_decay_heat: f64) -> f64 {
        self.base_temp + self.heat_coefficient * total_decay_heat
    }

    fn describe(&self) -> String {
        format!(
            "linear: T = {} + {} * total_decay_heat",
            self.base_temp, self.heat_coefficient
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_model() {
        let model = LinearCoolantModel::reference();
        assert_eq!(model.coolant_temp(0.0), 300.0);
        assert!((model.coolant_temp(10_000.0) - 400.0).abs() < 1e-9);
    }

    #[test]
    fn test_heat_for_temp_inverts_model() {
        let model = LinearCoolantModel::new(250.0, 0.5);
        let heat = model.heat_for_temp(1000.0);
        assert!((model.coolant_temp(heat) - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_describe_mentions_coefficients() {
        let text = LinearCoolantModel::new(1.5, 2.0).describe();
        assert!(text.contains("1.5"));
        assert!(text.contains('2'));
    }

    #[test]
    fn test_usable_as_trait_object() {
        let model: Box<dyn CoolantModel> = Box::new(LinearCoolantModel::reference());
        assert!((model.coolant_temp(100.0) - 301.0).abs() < 1e-9);
    }
}
