// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! State aggregator
//!
//! Runs on a fixed tick. Each tick reads the authoritative totals, derives the coolant
//! temperature, overwrites the latest snapshot and trips SCRAM when the coolant limit
//! is exceeded or when either reading is no longer finite. Heat fragments from processing are drained for bookkeeping only.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crossbeam::channel::{self, Receiver};
use crossbeam::select;
use pebblebed_physics::CoolantModel;
use pebblebed_state_manager::ReactorState;
use tracing::{debug, error, info, trace};

use crate::pipeline::PipelineShared;
use crate::processing::HeatFragment;

pub(crate) struct StateAggregator {
    shared: Arc<PipelineShared>,
    fragments: Receiver<HeatFragment>,
    coolant: Arc<dyn CoolantModel>,
    max_coolant_temp: f64,
    interval: Duration,
}

impl StateAggregator {
    pub(crate) fn new(
        shared: Arc<PipelineShared>,
        fragments: Receiver<HeatFragment>,
        coolant: Arc<dyn CoolantModel>,
        max_coolant_temp: f64,
        interval: Duration,
    ) -> Self {
        Self {
            shared,
            fragments,
            coolant,
            max_coolant_temp,
            interval,
        }
    }

    /// Tick until `shutdown` disconnects, then tick once more and return
    pub(crate) fn run(self, shutdown: Receiver<()>) {
        info!(
            "[AGGREGATOR] Started: interval {:?}, limit {:.2}, coolant model {}",
            self.interval,
            self.max_coolant_temp,
            self.coolant.describe()
        );
        let ticker = channel::tick(self.interval);

        loop {
            select! {
                recv(ticker) -> _ => {
                    self.tick();
                }
                recv(shutdown) -> _ => {
                    // Upstream is fully drained by now; capture the final totals
                    let last = self.tick();
                    info!(
                        "[AGGREGATOR] Final snapshot: {} pebble(s), total heat {:.4}, coolant {:.2}",
                        last.pebble_count, last.total_decay_heat, last.coolant_temp
                    );
                    break;
                }
            }
        }
    }

    /// One aggregation step; returns the snapshot it published
    pub(crate) fn tick(&self) -> ReactorState {
        let observed = self.drain_fragments();

        // Count before total: every counted pebble already has its heat committed
        let pebble_count = self.shared.pebble_count.load(Ordering::Acquire);
        let total_decay_heat = self.shared.heat.total();
        let coolant_temp = self.coolant.coolant_temp(total_decay_heat);

        let state = ReactorState {
            total_decay_heat,
            coolant_temp,
            timestamp: SystemTime::now(),
            pebble_count,
        };
        self.shared.latest.publish(state);
        let ticks = self.shared.stats.record_tick();
        trace!(
            "[AGGREGATOR] Tick {}: {} pebble(s), heat {:.4}, coolant {:.2}, {} fragment(s)",
            ticks,
            pebble_count,
            total_decay_heat,
            coolant_temp,
            observed
        );

        if self.shared.scram.is_triggered() {
            return state;
        }

        // A NaN reading compares false against any limit, so it must trip on its own
        let reason = if !total_decay_heat.is_finite() || !coolant_temp.is_finite() {
            error!(
                "[AGGREGATOR] Non-finite reading: heat {}, coolant {}",
                total_decay_heat, coolant_temp
            );
            Some(format!(
                "non-finite reading: total decay heat {}, coolant temperature {} ({} pebbles)",
                total_decay_heat, coolant_temp, pebble_count
            ))
        } else if coolant_temp > self.max_coolant_temp {
            Some(format!(
                "coolant temperature {:.2} exceeds limit {:.2} (total decay heat {:.4}, {} pebbles)",
                coolant_temp, self.max_coolant_temp, total_decay_heat, pebble_count
            ))
        } else {
            None
        };

        if let Some(reason) = reason {
            if self.shared.scram.trigger(reason) {
                debug!("[AGGREGATOR] SCRAM triggered on tick {}", ticks);
            }
        }

        state
    }

    fn drain_fragments(&self) -> u64 {
        let observed = self.fragments.try_iter().count() as u64;
        if observed > 0 {
            self.shared.stats.record_fragments_observed(observed);
        }
        observed
    }
}
