// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Latest reactor snapshot (current-value cache, not a log)

use crossbeam::atomic::AtomicCell;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

/// Periodic snapshot produced by the state aggregator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReactorState {
    pub total_decay_heat: f64,
    pub coolant_temp: f64,
    pub timestamp: SystemTime,
    pub pebble_count: u64,
}

/// Single-slot, last-write-wins holder for the newest `ReactorState`
///
/// Exactly one writer (the aggregator) stores into the slot, so a plain atomic
/// store/load pair is enough. Once populated it never goes back to empty.
#[derive(Debug, Default)]
pub struct LatestStateSlot {
    slot: AtomicCell<Option<ReactorState>>,
    publications: AtomicU64,
}

impl LatestStateSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the slot with a newer snapshot
    pub fn publish(&self, state: ReactorState) {
        self.slot.store(Some(state));
        self.publications.fetch_add(1, Ordering::Release);
    }

    /// Newest snapshot, `None` before the first publish
    pub fn latest(&self) -> Option<ReactorState> {
        self.slot.load()
    }

    /// Number of snapshots published so far
    pub fn publications(&self) -> u64 {
        self.publications.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn snapshot(pebble_count: u64) -> ReactorState {
        ReactorState {
            total_decay_heat: pebble_count as f64 * 10.0,
            coolant_temp: 300.0 + pebble_count as f64,
            timestamp: SystemTime::UNIX_EPOCH + Duration::from_secs(pebble_count),
            pebble_count,
        }
    }

    #[test]
    fn test_empty_until_first_publish() {
        let slot = LatestStateSlot::new();
        assert!(slot.latest().is_none());
        assert_eq!(slot.publications(), 0);

        slot.publish(snapshot(1));
        assert_eq!(slot.latest(), Some(snapshot(1)));
    }

    #[test]
    fn test_last_write_wins() {
        let slot = LatestStateSlot::new();
        for count in 1..=5 {
            slot.publish(snapshot(count));
        }
        assert_eq!(slot.latest().unwrap().pebble_count, 5);
        assert_eq!(slot.publications(), 5);
    }

    #[test]
    fn test_readers_never_see_mixed_snapshots() {
        let slot = Arc::new(LatestStateSlot::new());
        let writer = {
            let slot = Arc::clone(&slot);
            thread::spawn(move || {
                for count in 1..=20_000 {
                    slot.publish(snapshot(count));
                }
            })
        };

        while !writer.is_finished() {
            if let Some(state) = slot.latest() {
                assert_eq!(state, snapshot(state.pebble_count));
            }
        }
        writer.join().unwrap();
        assert_eq!(slot.latest(), Some(snapshot(20_000)));
    }
}
