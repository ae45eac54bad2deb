// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Ingestion stage
//!
//! Producers submit into a bounded intake queue that never blocks: when it is full the
//! oldest queued item is evicted and the submit is retried once. Ingestion workers move
//! items on to the processing queue and shed them if that queue is full.

use crossbeam::channel::{Receiver, Sender, TrySendError};
use pebblebed_physics::PebbleTelemetry;
use tracing::{debug, warn};

use crate::channels::{create_bounded, ChannelStats, QueueName};
use crate::stats::{log_sample, PipelineStats};

/// Producer-facing end of the intake queue
///
/// Holds a receiver clone of its own so a full queue can evict its oldest item.
/// Dropping the `IntakeQueue` closes intake for the ingestion workers.
#[derive(Debug)]
pub struct IntakeQueue<T> {
    tx: Sender<T>,
    evict_rx: Receiver<T>,
}

impl<T> IntakeQueue<T> {
    /// Bounded intake queue plus the receiver ingestion workers consume from
    pub fn bounded(capacity: usize) -> (Self, Receiver<T>) {
        let (tx, rx) = create_bounded(capacity);
        let intake = Self {
            tx,
            evict_rx: rx.clone(),
        };
        (intake, rx)
    }

    /// Non-blocking submit with drop-oldest backpressure
    ///
    /// Returns `false` only when the retry after eviction also found the queue full, or
    /// when every consumer is gone.
    pub fn submit(&self, item: T, stats: &PipelineStats) -> bool {
        let item = match self.tx.try_send(item) {
            Ok(()) => {
                stats.record_accepted();
                return true;
            }
            Err(TrySendError::Full(item)) => item,
            Err(TrySendError::Disconnected(_)) => {
                stats.record_rejected_not_running();
                return false;
            }
        };

        // A racing consumer may have drained the slot already; nothing to evict then
        if self.evict_rx.try_recv().is_ok() {
            let evicted = stats.record_dropped_oldest();
            if log_sample(evicted) {
                warn!(
                    "[INGEST] Intake queue full (capacity {}), evicted oldest telemetry (total evicted: {})",
                    self.capacity(),
                    evicted
                );
            }
        }

        match self.tx.try_send(item) {
            Ok(()) => {
                stats.record_accepted();
                true
            }
            Err(_) => {
                let rejected = stats.record_rejected_full();
                if log_sample(rejected) {
                    warn!(
                        "[INGEST] Intake queue still full after eviction, telemetry rejected (total rejected: {})",
                        rejected
                    );
                }
                false
            }
        }
    }

    pub fn capacity(&self) -> usize {
        self.tx.capacity().unwrap_or(0)
    }

    /// Items currently resident in the queue
    pub fn len(&self) -> usize {
        self.tx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }

    pub fn stats(&self) -> ChannelStats {
        ChannelStats::from_sender(QueueName::Intake, &self.tx)
    }
}

/// Ingestion worker loop: intake → processing, shedding when processing is full
///
/// Exits once the intake queue is closed and drained.
pub(crate) fn run_ingestion_worker(
    worker_id: usize,
    intake_rx: Receiver<PebbleTelemetry>,
    processing_tx: Sender<PebbleTelemetry>,
    stats: &PipelineStats,
) {
    debug!("[INGEST] Worker {} started", worker_id);
    let mut forwarded: u64 = 0;

    for pebble in intake_rx.iter() {
        match processing_tx.try_send(pebble) {
            Ok(()) => forwarded += 1,
            Err(TrySendError::Full(shed)) => {
                let total = stats.record_shed_at_processing();
                if log_sample(total) {
                    warn!(
                        "[INGEST] Processing queue full, shed pebble {} (total shed: {})",
                        shed.pebble_id, total
                    );
                }
            }
            Err(TrySendError::Disconnected(_)) => {
                // Processing closes only after ingestion has been joined
                warn!("[INGEST] Worker {} found processing queue closed", worker_id);
                break;
            }
        }
    }

    debug!(
        "[INGEST] Worker {} exiting after forwarding {} pebble(s)",
        worker_id, forwarded
    );
}
