// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Pebble-Bed State Manager
//!
//! Shared runtime state of one telemetry engine, all of it lock-free on the hot path.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   HeatAccumulator                   │  ← f64 bits in an AtomicU64, CAS retry loop
//! │   Pebble counter                    │  ← AtomicU64 (owned by the engine)
//! └─────────────────────────────────────┘
//!           ↓ read every tick
//! ┌─────────────────────────────────────┐
//! │   LatestStateSlot                   │  ← single writer, last-write-wins
//! │   ScramController / ScramContext    │  ← exactly-once latch + broadcast
//! └─────────────────────────────────────┘
//! ```
//!
//! Every type here is an explicit field of a constructed engine. There are no
//! process-wide statics, so several engines can coexist in one process.
//!
//! ## Usage
//!
//! ```rust
//! use pebblebed_state_manager::{HeatAccumulator, ScramController};
//!
//! let heat = HeatAccumulator::new();
//! heat.add(12.5);
//! assert_eq!(heat.total(), 12.5);
//!
//! let scram = ScramController::new();
//! let ctx = scram.context();
//! assert!(scram.trigger("coolant over limit"));
//! assert!(!scram.trigger("again"));
//! assert!(ctx.is_cancelled());
//! ```

pub mod core_state;
pub mod heat_accumulator;
pub mod reactor_state;
pub mod scram;

pub use core_state::{AtomicLifecycleState, EngineLifecycleState};
pub use heat_accumulator::HeatAccumulator;
pub use reactor_state::{LatestStateSlot, ReactorState};
pub use scram::{ScramContext, ScramController, ScramSignal};
