// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # pebblebed-engine
//!
//! Runtime pipeline for pebble-bed decay-heat telemetry:
//!
//! - **Ingestion**: bounded intake with drop-oldest backpressure; `submit` never blocks
//! - **Processing**: worker pool computing decay heat into the shared accumulator
//! - **Aggregation**: periodic snapshot, coolant temperature, SCRAM on threshold breach
//! - **Lifecycle**: ordered, leak-free start/stop through [`TelemetryEngine`]
//!
//! Threads are plain OS threads connected by crossbeam channels; the only shared mutable
//! state is lock-free (see `pebblebed-state-manager`).

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod aggregator;
pub mod channels;
pub mod config;
pub mod engine;
pub mod error;
pub mod ingestion;
mod pipeline;
pub mod processing;
pub mod stats;
mod worker;

pub use channels::{ChannelStats, QueueName};
pub use config::EngineConfig;
pub use engine::TelemetryEngine;
pub use error::{EngineError, EngineResult};
pub use ingestion::IntakeQueue;
pub use processing::HeatFragment;
pub use stats::{PipelineStats, PipelineStatsSnapshot};

// Shared-state types callers see through the engine API
pub use pebblebed_state_manager::{EngineLifecycleState, ReactorState, ScramContext, ScramSignal};
