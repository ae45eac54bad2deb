// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Processing stage: decay heat per pebble, folded into the shared accumulator

use std::sync::atomic::Ordering;
use std::time::SystemTime;

use crossbeam::channel::{Receiver, Sender};
use pebblebed_physics::{compute_decay_heat_with_policy, PebbleTelemetry, TimestampPolicy};
use tracing::{debug, trace};

use crate::pipeline::PipelineShared;

/// Per-event record sent to the aggregator (best-effort, drop-newest)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatFragment {
    pub pebble_id: i64,
    pub decay_heat: f64,
}

/// Apply one pebble to the shared state
///
/// Heat is committed before the pebble is counted, so a reader that loads the count
/// first and the total second never sees a counted pebble without its heat.
pub(crate) fn process_pebble(
    shared: &PipelineShared,
    pebble: &PebbleTelemetry,
    policy: TimestampPolicy,
    now: SystemTime,
) -> HeatFragment {
    let decay_heat = compute_decay_heat_with_policy(pebble, now, policy);
    shared.heat.add(decay_heat);
    shared.pebble_count.fetch_add(1, Ordering::AcqRel);
    shared.stats.record_processed(decay_heat);
    HeatFragment {
        pebble_id: pebble.pebble_id,
        decay_heat,
    }
}

/// Processing worker loop
///
/// Blocks on its own queue and exits once that queue is closed and drained.
pub(crate) fn run_processing_worker(
    worker_id: usize,
    processing_rx: Receiver<PebbleTelemetry>,
    fragment_tx: Sender<HeatFragment>,
    shared: &PipelineShared,
    policy: TimestampPolicy,
) {
    debug!("[PROCESS] Worker {} started", worker_id);
    let mut processed: u64 = 0;

    for pebble in processing_rx.iter() {
        let fragment = process_pebble(shared, &pebble, policy, SystemTime::now());
        processed += 1;
        trace!(
            "[PROCESS] Worker {}: pebble {} → {:.4}",
            worker_id,
            fragment.pebble_id,
            fragment.decay_heat
        );

        if fragment_tx.try_send(fragment).is_err() {
            shared.stats.record_fragment_dropped();
        }
    }

    debug!(
        "[PROCESS] Worker {} exiting after {} pebble(s)",
        worker_id, processed
    );
}
