// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! CLI argument parsing for per-crate debug flags
//!
//! Supports flags like `--debug-pebblebed-engine` and `--debug-all`.

use std::collections::BTreeSet;
use std::env;

use crate::KNOWN_CRATES;

/// Environment variable listing crates to debug (comma-separated, or `all`)
pub const DEBUG_ENV: &str = "PEBBLEBED_DEBUG";

/// Crates whose log level is raised to DEBUG
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrateDebugFlags {
    pub enabled_crates: BTreeSet<String>,
}

impl CrateDebugFlags {
    /// Parse debug flags from command-line arguments
    ///
    /// Looks for arguments matching `--debug-{crate-name}`; `--debug-all` enables every
    /// known crate. Other arguments are ignored.
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut flags = CrateDebugFlags::default();
        for arg in args {
            if arg == "--debug-all" {
                flags.enable_all();
            } else if let Some(crate_name) = arg.strip_prefix("--debug-") {
                flags.enabled_crates.insert(crate_name.to_string());
            }
        }
        flags
    }

    /// Merge a `PEBBLEBED_DEBUG`-style value (`all` or `a,b,c`)
    pub fn merge_env_value(&mut self, value: &str) {
        if value.trim() == "all" {
            self.enable_all();
            return;
        }
        for crate_name in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            self.enabled_crates.insert(crate_name.to_string());
        }
    }

    fn enable_all(&mut self) {
        for crate_name in KNOWN_CRATES {
            self.enabled_crates.insert(crate_name.to_string());
        }
    }

    /// Check if debug is enabled for a specific crate
    pub fn is_enabled(&self, crate_name: &str) -> bool {
        self.enabled_crates.contains(crate_name)
    }

    /// Check if debug is enabled for any crate
    pub fn any_enabled(&self) -> bool {
        !self.enabled_crates.is_empty()
    }

    /// `tracing::Level::DEBUG` if enabled, `INFO` otherwise
    pub fn log_level(&self, crate_name: &str) -> tracing::Level {
        if self.is_enabled(crate_name) {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// `EnvFilter` directive string with `base_level` for everything not flagged.
    ///
    /// Crate names are turned into tracing targets (`pebblebed-engine` → `pebblebed_engine`).
    pub fn to_filter_string(&self, base_level: &str) -> String {
        let mut directives: Vec<String> = self
            .enabled_crates
            .iter()
            .map(|crate_name| format!("{}=debug", crate_name.replace('-', "_")))
            .collect();
        directives.push(base_level.to_lowercase());
        directives.join(",")
    }
}

/// Debug flags from the process arguments plus `PEBBLEBED_DEBUG`
pub fn parse_debug_flags() -> CrateDebugFlags {
    let mut flags = CrateDebugFlags::from_args(env::args());
    if let Ok(value) = env::var(DEBUG_ENV) {
        flags.merge_env_value(&value);
    }
    flags
}

/// Generate help text for debug flags
pub fn debug_flags_help() -> String {
    format!(
        r#"Debug Flags:
  --debug-all                    Enable debug logging for all crates
  --debug-{{crate-name}}          Enable debug logging for specific crate

Available crates:
  {}

Environment Variable:
  {}={{crate-name}}[,{{crate-name}}]  Enable debug for crates (comma-separated)
  {}=all                               Enable debug for all crates
"#,
        KNOWN_CRATES.join(", "),
        DEBUG_ENV,
        DEBUG_ENV
    )
}
