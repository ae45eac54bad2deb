// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Soak driver for the telemetry engine.
//!
//! Loads `pebblebed.toml` (or built-in settings when none is found), starts an engine,
//! hammers it with synthetic producers for a fixed duration, stops it and prints a JSON
//! summary of the pipeline statistics, the final snapshot and the SCRAM state.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use pebblebed::config::{
    apply_cli_overrides, apply_environment_overrides, load_config, validate_config,
    EngineSettings, PebbleBedConfig,
};
use pebblebed::engine::{EngineConfig, TelemetryEngine};
use pebblebed::observability::{
    debug_flags_help, init_logging, parse_debug_flags, LogFormat, LoggingConfig,
};
use pebblebed::physics::{Isotope, PebbleTelemetry};
use serde_json::json;
use tracing::{info, warn};

struct SoakArgs {
    config_path: Option<PathBuf>,
    duration: Duration,
    producers: usize,
    json_logs: bool,
    overrides: HashMap<String, String>,
}

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: pebble_soak [--config <path>] [--duration-ms <ms>] [--producers <n>]\n\
         \x20                  [--set <key>=<value>]... [--json-logs] [--debug-<crate>]\n\n\
         Defaults:\n\
         - config: $PEBBLEBED_CONFIG_PATH, else pebblebed.toml in cwd or parents,\n\
         \x20 else built-in settings (1000.0 limit, 2 ingestion, 4 processing, 4096 buffer)\n\
         - duration-ms: 2000\n\
         - producers: 4\n\n\
         --set keys: max_coolant_temp, ingestion_workers, processing_workers, buffer_size,\n\
         \x20           aggregation_interval_ms, log_level, log_dir\n\n{}",
        debug_flags_help()
    );
    process::exit(2);
}

fn parse_args() -> SoakArgs {
    let mut parsed = SoakArgs {
        config_path: None,
        duration: Duration::from_millis(2000),
        producers: 4,
        json_logs: false,
        overrides: HashMap::new(),
    };

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let v = args.next().unwrap_or_else(|| usage_and_exit());
                parsed.config_path = Some(PathBuf::from(v));
            }
            "--duration-ms" => {
                let v = args.next().unwrap_or_else(|| usage_and_exit());
                let ms = v.parse::<u64>().unwrap_or_else(|_| usage_and_exit());
                parsed.duration = Duration::from_millis(ms);
            }
            "--producers" => {
                let v = args.next().unwrap_or_else(|| usage_and_exit());
                parsed.producers = v.parse::<usize>().unwrap_or_else(|_| usage_and_exit());
            }
            "--set" => {
                let v = args.next().unwrap_or_else(|| usage_and_exit());
                let Some((key, value)) = v.split_once('=') else {
                    eprintln!("--set expects key=value, got: {v}");
                    usage_and_exit();
                };
                parsed.overrides.insert(key.trim().to_string(), value.trim().to_string());
            }
            "--json-logs" => parsed.json_logs = true,
            "-h" | "--help" => usage_and_exit(),
            // Collected separately by parse_debug_flags()
            other if other.starts_with("--debug-") => {}
            other => {
                eprintln!("Unknown argument: {other}");
                usage_and_exit();
            }
        }
    }

    parsed
}

/// File config when one exists, otherwise built-in settings with the same override chain
fn resolve_config(args: &SoakArgs) -> Result<PebbleBedConfig> {
    match load_config(args.config_path.as_deref(), Some(&args.overrides)) {
        Ok(config) => Ok(config),
        Err(pebblebed::config::ConfigError::FileNotFound(searched)) if args.config_path.is_none() => {
            eprintln!("No config file found ({searched}); using built-in settings");
            let mut config = PebbleBedConfig::new(EngineSettings::new(1000.0, 2, 4, 4096));
            apply_environment_overrides(&mut config);
            apply_cli_overrides(&mut config, &args.overrides);
            validate_config(&config)?;
            Ok(config)
        }
        Err(e) => Err(e).context("Failed to load configuration"),
    }
}

/// Deterministic but varied isotope inventory for a pebble
fn synthetic_pebble(pebble_id: i64) -> PebbleTelemetry {
    let spread = (pebble_id.rem_euclid(97)) as f64 / 97.0;
    PebbleTelemetry::sampled_now(
        pebble_id,
        vec![
            // Short-lived fission products dominate early heat
            Isotope::new(Duration::from_secs(30), 0.5 + spread, 4.0),
            Isotope::new(Duration::from_secs(8 * 24 * 3600), 1.0, 0.8 + spread),
            Isotope::new(Duration::from_secs(30 * 365 * 24 * 3600), 2.0, 0.05),
        ],
    )
}

fn main() -> Result<()> {
    let args = parse_args();
    let config = resolve_config(&args)?;

    let logging = LoggingConfig {
        level: config.logging.level.clone(),
        format: if args.json_logs {
            LogFormat::Json
        } else {
            LogFormat::Text
        },
        log_dir: config.logging.log_dir.clone(),
        retention_runs: config.logging.retention_runs,
    };
    let _log_guard = init_logging(&logging, &parse_debug_flags())?;

    let engine = Arc::new(TelemetryEngine::new(EngineConfig::from_settings(&config.engine))?);
    let scram = engine.get_scram_context();
    engine.start()?;
    info!(
        "[SOAK] Driving {} producer(s) for {:?}",
        args.producers, args.duration
    );

    let submitted = Arc::new(AtomicU64::new(0));
    let refused = Arc::new(AtomicU64::new(0));
    let started = Instant::now();
    let deadline = started + args.duration;

    let producers = (0..args.producers)
        .map(|producer_id| {
            let engine = Arc::clone(&engine);
            let submitted = Arc::clone(&submitted);
            let refused = Arc::clone(&refused);
            thread::Builder::new()
                .name(format!("soak-producer-{producer_id}"))
                .spawn(move || {
                    let mut pebble_id = (producer_id as i64) << 40;
                    while Instant::now() < deadline {
                        submitted.fetch_add(1, Ordering::Relaxed);
                        if !engine.ingest_pebble_data(synthetic_pebble(pebble_id)) {
                            refused.fetch_add(1, Ordering::Relaxed);
                        }
                        pebble_id += 1;
                    }
                })
                .with_context(|| format!("Failed to spawn producer {producer_id}"))
        })
        .collect::<Result<Vec<_>>>()?;

    for producer in producers {
        if producer.join().is_err() {
            warn!("[SOAK] A producer thread panicked");
        }
    }
    engine.stop();
    let elapsed = started.elapsed();

    let stats = engine.stats();
    let summary = json!({
        "elapsed_ms": elapsed.as_millis() as u64,
        "producers": args.producers,
        "engine": {
            "max_coolant_temp": config.engine.max_coolant_temp,
            "ingestion_workers": config.engine.ingestion_workers,
            "processing_workers": config.engine.processing_workers,
            "buffer_size": config.engine.buffer_size,
            "aggregation_interval_ms": config.engine.aggregation_interval_ms,
            "coolant_model": engine.config().coolant.describe(),
        },
        "submitted": submitted.load(Ordering::Relaxed),
        "refused": refused.load(Ordering::Relaxed),
        "throughput_per_sec": stats.processed as f64 / elapsed.as_secs_f64().max(f64::EPSILON),
        "stats": stats,
        "final_state": engine.get_last_state(),
        "total_heat": engine.get_total_heat(),
        "scram": {
            "triggered": scram.is_cancelled(),
            "signal": engine.scram_signal(),
        },
        "live_workers_after_stop": engine.live_workers(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
