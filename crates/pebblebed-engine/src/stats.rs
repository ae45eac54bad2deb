// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Pipeline counters
//!
//! Observational only. The authoritative heat total lives in the accumulator; these
//! counters explain where telemetry went (accepted, evicted, shed, rejected).

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default, Debug)]
pub struct PipelineStats {
    accepted: AtomicU64,
    dropped_oldest: AtomicU64,
    rejected_full: AtomicU64,
    rejected_invalid: AtomicU64,
    rejected_not_running: AtomicU64,
    shed_at_processing: AtomicU64,
    processed: AtomicU64,
    fragments_dropped: AtomicU64,
    fragments_observed: AtomicU64,
    aggregator_ticks: AtomicU64,
    /// f64 bit pattern
    peak_pebble_heat: AtomicU64,
}

/// Plain copy of [`PipelineStats`] at one instant
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineStatsSnapshot {
    pub accepted: u64,
    pub dropped_oldest: u64,
    pub rejected_full: u64,
    pub rejected_invalid: u64,
    pub rejected_not_running: u64,
    pub shed_at_processing: u64,
    pub processed: u64,
    pub fragments_dropped: u64,
    pub fragments_observed: u64,
    pub aggregator_ticks: u64,
    pub peak_pebble_heat: f64,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the running total, used to rate-limit the log line
    pub(crate) fn record_dropped_oldest(&self) -> u64 {
        self.dropped_oldest.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn record_rejected_full(&self) -> u64 {
        self.rejected_full.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn record_rejected_invalid(&self) -> u64 {
        self.rejected_invalid.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn record_rejected_not_running(&self) {
        self.rejected_not_running.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_shed_at_processing(&self) -> u64 {
        self.shed_at_processing.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn record_processed(&self, pebble_heat: f64) {
        self.processed.fetch_add(1, Ordering::Relaxed);
        self.update_peak(pebble_heat);
    }

    pub(crate) fn record_fragment_dropped(&self) {
        self.fragments_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_fragments_observed(&self, count: u64) {
        self.fragments_observed.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn record_tick(&self) -> u64 {
        self.aggregator_ticks.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn update_peak(&self, pebble_heat: f64) {
        if !pebble_heat.is_finite() {
            return;
        }
        let mut previous = self.peak_pebble_heat.load(Ordering::Relaxed);
        while pebble_heat > f64::from_bits(previous) {
            match self.peak_pebble_heat.compare_exchange_weak(
                previous,
                pebble_heat.to_bits(),
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => previous = actual,
            }
        }
    }

    pub fn snapshot(&self) -> PipelineStatsSnapshot {
        PipelineStatsSnapshot {
            accepted: self.accepted.load(Ordering::Relaxed),
            dropped_oldest: self.dropped_oldest.load(Ordering::Relaxed),
            rejected_full: self.rejected_full.load(Ordering::Relaxed),
            rejected_invalid: self.rejected_invalid.load(Ordering::Relaxed),
            rejected_not_running: self.rejected_not_running.load(Ordering::Relaxed),
            shed_at_processing: self.shed_at_processing.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
            fragments_dropped: self.fragments_dropped.load(Ordering::Relaxed),
            fragments_observed: self.fragments_observed.load(Ordering::Relaxed),
            aggregator_ticks: self.aggregator_ticks.load(Ordering::Relaxed),
            peak_pebble_heat: f64::from_bits(self.peak_pebble_heat.load(Ordering::Relaxed)),
        }
    }
}

/// Sample high-volume drop logs: the first occurrence, then every thousandth
pub(crate) fn log_sample(count: u64) -> bool {
    count == 1 || count % 1000 == 0
}

impl PipelineStatsSnapshot {
    /// Submissions that did not make it into the intake queue
    pub fn rejected_total(&self) -> u64 {
        self.rejected_full + self.rejected_invalid + self.rejected_not_running
    }

    /// Telemetry accepted at intake but never processed (evicted or shed)
    pub fn lost_after_accept(&self) -> u64 {
        self.dropped_oldest + self.shed_at_processing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_peak_tracks_maximum() {
        let stats = PipelineStats::new();
        stats.record_processed(3.5);
        stats.record_processed(10.0);
        stats.record_processed(7.25);
        stats.record_processed(f64::NAN);

        let snap = stats.snapshot();
        assert_eq!(snap.processed, 4);
        assert_eq!(snap.peak_pebble_heat, 10.0);
    }

    #[test]
    fn test_concurrent_peak() {
        let stats = Arc::new(PipelineStats::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let stats = Arc::clone(&stats);
                thread::spawn(move || {
                    for i in 0..1000 {
                        stats.record_processed((t * 1000 + i) as f64);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let snap = stats.snapshot();
        assert_eq!(snap.processed, 8000);
        assert_eq!(snap.peak_pebble_heat, 7999.0);
    }

    #[test]
    fn test_log_sample() {
        assert!(log_sample(1));
        assert!(!log_sample(2));
        assert!(!log_sample(999));
        assert!(log_sample(1000));
        assert!(log_sample(3000));
    }

    #[test]
    fn test_derived_totals() {
        let stats = PipelineStats::new();
        stats.record_rejected_full();
        stats.record_rejected_invalid();
        stats.record_rejected_invalid();
        stats.record_rejected_not_running();
        stats.record_dropped_oldest();
        stats.record_shed_at_processing();

        let snap = stats.snapshot();
        assert_eq!(snap.rejected_total(), 4);
        assert_eq!(snap.lost_after_accept(), 2);
    }
}
