// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Pebble-Bed Physics (Pure)
//!
//! Everything that turns one telemetry sample into a number, with no threads and no I/O:
//! - **Types**: `Isotope`, `PebbleTelemetry`, boundary validation errors
//! - **Decay**: instantaneous decay heat of one pebble
//! - **Coolant**: pluggable conversion from total decay heat to coolant temperature
//!
//! All functions here are safe to call concurrently from any number of worker threads
//! on independent inputs.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod coolant;
pub mod decay;
pub mod types;

pub use coolant::{CoolantModel, LinearCoolantModel};
pub use decay::{
    compute_decay_heat, compute_decay_heat_at, compute_decay_heat_with_policy, elapsed_seconds,
    remaining_fraction, TimestampPolicy, OVERFLOW_EXPONENT_LIMIT, UNDERFLOW_EXPONENT_LIMIT,
};
pub use types::{Isotope, PebbleTelemetry, TelemetryError};
