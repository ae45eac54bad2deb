// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Config file → engine → telemetry, through the umbrella crate

use std::io::Write;
use std::thread;
use std::time::Duration;

use pebblebed::config::load_config;
use pebblebed::prelude::*;

const CONFIG: &str = r#"
[engine]
max_coolant_temp = 1000.0
ingestion_workers = 2
processing_workers = 3
buffer_size = 512
aggregation_interval_ms = 5
timestamp_policy = "clamp_to_now"

[engine.coolant]
base_temp = 290.0
heat_coefficient = 0.02

[logging]
level = "warn"
"#;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_engine_from_config_file() {
    let file = write_config(CONFIG);
    let config = load_config(Some(file.path()), None).unwrap();
    assert_eq!(config.logging.level, "warn");

    let engine_config = EngineConfig::from_settings(&config.engine);
    assert_eq!(engine_config.aggregation_interval, Duration::from_millis(5));
    let engine = TelemetryEngine::new(engine_config).unwrap();
    engine.start().unwrap();

    for id in 0..50 {
        let pebble = PebbleTelemetry::sampled_now(
            id,
            vec![
                Isotope::new(Duration::from_secs(3600), 2.0, 10.0),
                Isotope::new(Duration::from_secs(60), 1.0, 5.0),
            ],
        );
        assert!(engine.ingest_pebble_data(pebble));
    }
    thread::sleep(Duration::from_millis(50));
    engine.stop();

    let state = engine.get_last_state().unwrap();
    assert_eq!(state.pebble_count, 50);
    // 50 × (20 + 5), minus a sliver of decay
    assert!(state.total_decay_heat <= 1250.0 && state.total_decay_heat > 1240.0);
    assert!((state.coolant_temp - (290.0 + 0.02 * state.total_decay_heat)).abs() < 1e-9);
    assert!(!engine.is_scram_triggered());
}

#[test]
fn test_scram_context_usable_in_select() {
    use crossbeam::channel;
    use crossbeam::select;

    let file = write_config(CONFIG);
    let mut settings = load_config(Some(file.path()), None).unwrap().engine;
    // 290 + 0.02 × heat > 300 once heat exceeds 500
    settings.max_coolant_temp = 300.0;

    let engine = TelemetryEngine::new(EngineConfig::from_settings(&settings)).unwrap();
    let scram = engine.get_scram_context();
    let (_work_tx, work_rx) = channel::unbounded::<u32>();
    engine.start().unwrap();

    for id in 0..10 {
        let pebble = PebbleTelemetry::sampled_now(
            id,
            vec![Isotope::new(Duration::from_secs(3600), 1.0, 100.0)],
        );
        assert!(engine.ingest_pebble_data(pebble));
    }

    let woke_on_scram = select! {
        recv(scram.done()) -> _ => true,
        recv(work_rx) -> _ => false,
        default(Duration::from_secs(5)) => false,
    };
    assert!(woke_on_scram);
    engine.stop();
    assert!(engine.scram_signal().unwrap().triggered);
}

#[test]
fn test_invalid_config_is_refused() {
    let file = write_config(
        "[engine]\nmax_coolant_temp = 1000.0\ningestion_workers = 0\nprocessing_workers = 1\nbuffer_size = 8\n",
    );
    let err = load_config(Some(file.path()), None).unwrap_err();
    assert!(err.to_string().contains("ingestion_workers"));
}
