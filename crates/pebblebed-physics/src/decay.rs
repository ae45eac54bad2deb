// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Instantaneous decay heat of a single pebble
//!
//! For every isotope in the inventory:
//!
//! ```text
//! λ         = ln(2) / half_life_s
//! exponent  = -λ × elapsed_s
//! remaining = exp(exponent)            (forced to 0.0 when exponent < -700,
//!                                       capped at exp(700) when exponent > 700)
//! heat     += initial_mass × remaining × decay_energy
//! ```
//!
//! Isotopes with zero mass or zero decay energy contribute nothing and are skipped, so a
//! capped fraction is never multiplied by zero. The result is always finite or +inf,
//! never NaN.
//!
//! Pure functions: no allocation, no shared state, safe from any thread.
//! Inputs are expected to have passed `PebbleTelemetry::validate`.

use crate::types::PebbleTelemetry;
use serde::{Deserialize, Serialize};
use std::f64::consts::LN_2;
use std::time::{Duration, SystemTime};

/// Below this exponent the remaining fraction is treated as exactly zero.
///
/// `exp` would underflow gracefully on its own, but values this close to the
/// representable boundary are denormal noise.
pub const UNDERFLOW_EXPONENT_LIMIT: f64 = -700.0;

/// Positive exponents (samples stamped far in the future) are capped here.
///
/// `exp(709.8)` is already +inf.
pub const OVERFLOW_EXPONENT_LIMIT: f64 = 700.0;

/// What to do with samples stamped in the future (clock skew between producer and engine)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampPolicy {
    /// Use the negative elapsed time as-is; remaining fraction may exceed 1.0
    #[default]
    Extrapolate,
    /// Treat future samples as taken "now" (elapsed = 0)
    ClampToNow,
}

/// Fraction of the initial inventory left after `elapsed_secs`
///
/// `half_life` must be non-zero. The result is always finite.
#[inline]
pub fn remaining_fraction(half_life: Duration, elapsed_secs: f64) -> f64 {
    debug_assert!(!half_life.is_zero(), "half-life must be validated upstream");
    let decay_constant = LN_2 / half_life.as_secs_f64();
    let exponent = -decay_constant * elapsed_secs;
    if exponent < UNDERFLOW_EXPONENT_LIMIT {
        0.0
    } else {
        exponent.min(OVERFLOW_EXPONENT_LIMIT).exp()
    }
}

/// Signed seconds from `timestamp` to `now` (negative when `timestamp` is in the future)
#[inline]
pub fn elapsed_seconds(timestamp: SystemTime, now: SystemTime) -> f64 {
    match now.duration_since(timestamp) {
        Ok(elapsed) => elapsed.as_secs_f64(),
        Err(skew) => -skew.duration().as_secs_f64(),
    }
}

/// Decay heat of `pebble` evaluated against the current wall clock
pub fn compute_decay_heat(pebble: &PebbleTelemetry) -> f64 {
    compute_decay_heat_at(pebble, SystemTime::now())
}

/// Decay heat of `pebble` evaluated at `now`, extrapolating future timestamps
pub fn compute_decay_heat_at(pebble: &PebbleTelemetry, now: SystemTime) -> f64 {
    compute_decay_heat_with_policy(pebble, now, TimestampPolicy::Extrapolate)
}

/// Decay heat of `pebble` evaluated at `now` under an explicit timestamp policy
pub fn compute_decay_heat_with_policy(
    pebble: &PebbleTelemetry,
    now: SystemTime,
    policy: TimestampPolicy,
) -> f64 {
    let mut elapsed = elapsed_seconds(pebble.timestamp, now);
    if policy == TimestampPolicy::ClampToNow && elapsed < 0.0 {
        elapsed = 0.0;
    }

    pebble
        .isotopes
        .iter()
        .filter(|isotope| isotope.initial_mass != 0.0 && isotope.decay_energy != 0.0)
        .map(|isotope| {
            isotope.initial_mass
                * remaining_fraction(isotope.half_life, elapsed)
                * isotope.decay_energy
        })
        .sum()
}
