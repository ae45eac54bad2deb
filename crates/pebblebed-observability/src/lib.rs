// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # pebblebed-observability
//!
//! Logging setup shared by every pebble-bed binary and test harness.
//!
//! Components log through `tracing` with bracketed tags (`[INGEST]`, `[PROCESS]`,
//! `[AGGREGATOR]`, `[SCRAM]`, `[ENGINE]`); this crate decides where those events go:
//! - console output (text or JSON)
//! - optional per-run JSON log files with retention
//! - per-crate debug flags (`--debug-pebblebed-engine`, `PEBBLEBED_DEBUG=all`)

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod config;
pub mod init;

pub use cli::*;
pub use config::*;
pub use init::*;

/// Known workspace crate names for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "pebblebed",
    "pebblebed-engine",
    "pebblebed-state-manager",
    "pebblebed-physics",
    "pebblebed-config",
];
