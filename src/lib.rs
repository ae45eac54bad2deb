// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # pebblebed - decay-heat telemetry and SCRAM trigger for a pebble-bed reactor simulator
//!
//! Ingests per-pebble radioisotope telemetry at high rate, computes each pebble's decay
//! heat, accumulates a reactor-wide total under concurrent writers, derives a coolant
//! temperature and trips an irreversible SCRAM exactly once when the coolant limit is
//! exceeded.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! pebblebed = "0.1"  # Default: engine + config + observability
//! ```
//!
//! ```rust,no_run
//! use pebblebed::prelude::*;
//! use std::time::Duration;
//!
//! let engine = TelemetryEngine::new(EngineConfig::new(1000.0, 2, 4, 4096))?;
//! engine.start()?;
//!
//! let scram = engine.get_scram_context();
//! let isotope = Isotope::new(Duration::from_secs(10), 1.0, 100.0);
//! engine.ingest_pebble_data(PebbleTelemetry::sampled_now(1, vec![isotope]));
//!
//! if scram.wait_timeout(Duration::from_millis(100)) {
//!     eprintln!("SCRAM: {:?}", engine.scram_signal());
//! }
//! engine.stop();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Feature Flags
//!
//! - **`engine`** (default): ingestion / processing / aggregation pipeline
//! - **`config`** (default): `pebblebed.toml` loader with env and CLI overrides
//! - **`observability`** (default): `tracing` subscriber setup
//!
//! The physics model and the lock-free state primitives are always available.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Foundation: pebblebed-physics, pebblebed-config        │
//! │  (Isotope, PebbleTelemetry, decay heat, coolant model)  │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Infrastructure: pebblebed-state-manager                │
//! │  (HeatAccumulator, SCRAM latch, snapshot slot)          │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Runtime: pebblebed-engine                              │
//! │  (ingestion → processing → aggregation, lifecycle)      │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## License
//!
//! Apache-2.0

// Re-export foundation
pub use pebblebed_physics as physics;

// Re-export infrastructure
pub use pebblebed_state_manager as state_manager;

#[cfg(feature = "config")]
pub use pebblebed_config as config;

#[cfg(feature = "observability")]
pub use pebblebed_observability as observability;

// Re-export runtime
#[cfg(feature = "engine")]
pub use pebblebed_engine as engine;

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::physics::{
        compute_decay_heat, CoolantModel, Isotope, LinearCoolantModel, PebbleTelemetry,
        TelemetryError, TimestampPolicy,
    };
    pub use crate::state_manager::{ReactorState, ScramContext, ScramSignal};

    #[cfg(feature = "engine")]
    pub use crate::engine::{
        EngineConfig, EngineError, EngineLifecycleState, PipelineStatsSnapshot, TelemetryEngine,
    };

    #[cfg(feature = "config")]
    pub use crate::config::{load_config, PebbleBedConfig};

    #[cfg(feature = "observability")]
    pub use crate::observability::{init_logging, parse_debug_flags, LoggingConfig};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_facade_imports() {
        use crate::prelude::*;
        use std::time::Duration;

        let pebble = PebbleTelemetry::sampled_now(
            0,
            vec![Isotope::new(Duration::from_secs(1), 1.0, 1.0)],
        );
        assert!(pebble.validate().is_ok());
        assert_eq!(LinearCoolantModel::default().coolant_temp(0.0), 300.0);
    }
}
