// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Engine error types

use thiserror::Error;

/// Errors surfaced by engine construction and lifecycle operations
///
/// The hot path (`ingest_pebble_data`, aggregation) never returns these; it degrades by
/// dropping and counting instead.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to spawn thread '{name}': {source}")]
    ThreadSpawn {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

pub type EngineResult<T> = Result<T, EngineError>;
