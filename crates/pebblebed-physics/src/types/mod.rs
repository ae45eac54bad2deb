// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Core telemetry types

pub mod error;
pub mod telemetry;

pub use error::TelemetryError;
pub use telemetry::{Isotope, PebbleTelemetry};
