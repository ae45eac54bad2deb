// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Validation errors raised at the ingestion boundary

/// Reasons a telemetry sample is refused before it can reach the decay model
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TelemetryError {
    #[error("pebble {pebble_id}: isotope #{isotope_index} has a zero half-life")]
    ZeroHalfLife { pebble_id: i64, isotope_index: usize },

    #[error("pebble {pebble_id}: isotope #{isotope_index} has invalid initial mass {value}")]
    InvalidMass {
        pebble_id: i64,
        isotope_index: usize,
        value: f64,
    },

    #[error("pebble {pebble_id}: isotope #{isotope_index} has invalid decay energy {value}")]
    InvalidDecayEnergy {
        pebble_id: i64,
        isotope_index: usize,
        value: f64,
    },
}

impl TelemetryError {
    /// Pebble the rejected sample belonged to
    pub fn pebble_id(&self) -> i64 {
        match self {
            TelemetryError::ZeroHalfLife { pebble_id, .. }
            | TelemetryError::InvalidMass { pebble_id, .. }
            | TelemetryError::InvalidDecayEnergy { pebble_id, .. } => *pebble_id,
        }
    }
}
