// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Decay model properties checked through the public API only.

use pebblebed_physics::{
    compute_decay_heat_at, remaining_fraction, Isotope, PebbleTelemetry, TelemetryError,
};
use std::time::{Duration, SystemTime};

#[test]
fn half_life_holds_across_time_scales() {
    let half_lives = [
        Duration::from_millis(1),
        Duration::from_secs(1),
        Duration::from_secs(8 * 24 * 3600),         // I-131-ish
        Duration::from_secs(30 * 365 * 24 * 3600), // Cs-137-ish
    ];
    for half_life in half_lives {
        let fraction = remaining_fraction(half_life, half_life.as_secs_f64());
        assert!(
            (fraction - 0.5).abs() < 1e-9,
            "half-life {:?} gave {}",
            half_life,
            fraction
        );
        let two = remaining_fraction(half_life, 2.0 * half_life.as_secs_f64());
        assert!((two - 0.25).abs() < 1e-9);
    }
}

#[test]
fn inventory_heat_is_bounded_by_fresh_heat() {
    let t0 = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
    let isotopes: Vec<Isotope> = (1..=16)
        .map(|i| Isotope::new(Duration::from_secs(i * 7), i as f64 * 0.5, 12.5))
        .collect();
    let fresh: f64 = isotopes
        .iter()
        .map(|iso| iso.initial_mass * iso.decay_energy)
        .sum();
    let pebble = PebbleTelemetry::new(11, isotopes, t0);

    assert!((compute_decay_heat_at(&pebble, t0) - fresh).abs() < 1e-9);
    for secs in [1, 10, 100, 1_000, 100_000] {
        let heat = compute_decay_heat_at(&pebble, t0 + Duration::from_secs(secs));
        assert!(heat >= 0.0 && heat < fresh);
    }
    // Long after every half-life the underflow guard drives the total to exactly zero.
    assert_eq!(
        compute_decay_heat_at(&pebble, t0 + Duration::from_secs(10_000_000)),
        0.0
    );
}

#[test]
fn zero_half_life_never_validates() {
    let pebble = PebbleTelemetry::sampled_now(
        99,
        vec![Isotope::new(Duration::ZERO, 1.0, 1.0)],
    );
    assert!(matches!(
        pebble.validate(),
        Err(TelemetryError::ZeroHalfLife { pebble_id: 99, isotope_index: 0 })
    ));
}

#[test]
fn validated_samples_never_produce_nan() {
    let now = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
    let inventories = [
        vec![Isotope::new(Duration::from_millis(1), 0.0, 100.0)],
        vec![Isotope::new(Duration::from_millis(1), 5.0, 0.0)],
        vec![
            Isotope::new(Duration::from_millis(1), 0.0, 0.0),
            Isotope::new(Duration::from_secs(10), 1.0, 100.0),
        ],
        vec![Isotope::new(Duration::from_nanos(1), f64::MAX, f64::MAX)],
    ];
    for skew in [Duration::from_secs(10), Duration::from_secs(86_400 * 365)] {
        for isotopes in &inventories {
            let pebble = PebbleTelemetry::new(12, isotopes.clone(), now + skew);
            assert!(pebble.validate().is_ok());
            let heat = compute_decay_heat_at(&pebble, now);
            assert!(!heat.is_nan(), "skew {:?} gave NaN for {:?}", skew, isotopes);
            assert!(heat >= 0.0);
        }
    }
}
