// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Telemetry engine
//!
//! Public face of the pipeline: lifecycle (`start` / `stop`), non-blocking ingestion and
//! read access to the aggregate, the latest snapshot and the SCRAM state.
//!
//! All shared state is owned by the engine instance. Several engines can run side by
//! side in one process without interfering.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use pebblebed_physics::PebbleTelemetry;
use pebblebed_state_manager::{
    AtomicLifecycleState, EngineLifecycleState, ReactorState, ScramContext, ScramSignal,
};
use tracing::{debug, error, info, warn};

use crate::channels::ChannelStats;
use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::ingestion::IntakeQueue;
use crate::pipeline::{Pipeline, PipelineShared};
use crate::stats::{log_sample, PipelineStatsSnapshot};

/// Decay-heat telemetry engine with SCRAM trigger
///
/// # Example
/// ```no_run
/// use std::time::Duration;
/// use pebblebed_engine::{EngineConfig, TelemetryEngine};
/// use pebblebed_physics::{Isotope, PebbleTelemetry};
///
/// let engine = TelemetryEngine::new(EngineConfig::new(1000.0, 2, 4, 1024)).unwrap();
/// engine.start().unwrap();
///
/// let isotope = Isotope::new(Duration::from_secs(10), 1.0, 100.0);
/// engine.ingest_pebble_data(PebbleTelemetry::sampled_now(1, vec![isotope]));
///
/// engine.stop();
/// let state = engine.get_last_state().unwrap();
/// assert_eq!(state.pebble_count, 1);
/// ```
pub struct TelemetryEngine {
    config: EngineConfig,
    shared: Arc<PipelineShared>,
    lifecycle: AtomicLifecycleState,
    /// Producers' only access point; `None` while stopped
    intake: RwLock<Option<IntakeQueue<PebbleTelemetry>>>,
    /// Held for the whole of `start` and `stop`, which serialises them
    pipeline: Mutex<Option<Pipeline>>,
    live_workers: Arc<AtomicUsize>,
}

impl TelemetryEngine {
    /// Validate the configuration and build a stopped engine
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            shared: Arc::new(PipelineShared::new()),
            lifecycle: AtomicLifecycleState::new(),
            intake: RwLock::new(None),
            pipeline: Mutex::new(None),
            live_workers: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Start every pipeline thread. A no-op if already running.
    ///
    /// A stopped engine can be started again; heat, pebble count, the last snapshot and
    /// the SCRAM latch carry over.
    pub fn start(&self) -> EngineResult<()> {
        let mut pipeline_slot = self.pipeline.lock();
        if pipeline_slot.is_some() {
            debug!("[ENGINE] start() ignored: already running");
            return Ok(());
        }

        self.advance(EngineLifecycleState::Stopped, EngineLifecycleState::Starting);
        info!(
            "[ENGINE] Starting: {} ingestion / {} processing worker(s), buffer {}, tick {:?}, SCRAM above {:.2}",
            self.config.ingestion_workers,
            self.config.processing_workers,
            self.config.buffer_size,
            self.config.aggregation_interval,
            self.config.max_coolant_temp
        );
        if self.shared.scram.is_triggered() {
            warn!("[ENGINE] Starting an engine that has already SCRAMed");
        }

        match Pipeline::launch(&self.config, &self.shared, &self.live_workers) {
            Ok((pipeline, intake)) => {
                *self.intake.write() = Some(intake);
                *pipeline_slot = Some(pipeline);
                self.advance(EngineLifecycleState::Starting, EngineLifecycleState::Running);
                info!("[ENGINE] ✅ Running");
                Ok(())
            }
            Err(e) => {
                self.advance(EngineLifecycleState::Starting, EngineLifecycleState::Stopped);
                error!("[ENGINE] ❌ Failed to start: {}", e);
                Err(e)
            }
        }
    }

    /// Ordered graceful shutdown; blocks until every pipeline thread has exited
    ///
    /// Idempotent. Telemetry already accepted is processed before this returns, and the
    /// aggregator publishes one final snapshot.
    pub fn stop(&self) {
        let mut pipeline_slot = self.pipeline.lock();
        let Some(mut pipeline) = pipeline_slot.take() else {
            return;
        };

        info!("[ENGINE] Stopping...");
        self.advance(EngineLifecycleState::Running, EngineLifecycleState::Stopping);

        // Closing intake: waits out in-flight submits, then drops the last intake sender
        let intake = self.intake.write().take();
        drop(intake);

        pipeline.shutdown();
        self.advance(EngineLifecycleState::Stopping, EngineLifecycleState::Stopped);

        let stats = self.shared.stats.snapshot();
        info!(
            "[ENGINE] ✅ Stopped: {} accepted, {} processed, {} evicted, {} shed, {} rejected",
            stats.accepted,
            stats.processed,
            stats.dropped_oldest,
            stats.shed_at_processing,
            stats.rejected_total()
        );
    }

    /// Lifecycle step taken under the `pipeline` lock
    ///
    /// The lock already serialises `start` and `stop`, so a refused transition means the
    /// state was changed elsewhere; it is logged and overwritten.
    fn advance(&self, from: EngineLifecycleState, to: EngineLifecycleState) {
        if let Err(observed) = self.lifecycle.transition(from, to) {
            warn!(
                "[ENGINE] Lifecycle expected {:?} before {:?}, found {:?}",
                from, to, observed
            );
            self.lifecycle.store(to);
        }
    }

    /// Non-blocking submission; `false` means the sample was dropped or refused
    pub fn ingest_pebble_data(&self, telemetry: PebbleTelemetry) -> bool {
        if !self.lifecycle.is_running() {
            self.shared.stats.record_rejected_not_running();
            return false;
        }

        if let Err(e) = telemetry.validate() {
            let rejected = self.shared.stats.record_rejected_invalid();
            if log_sample(rejected) {
                warn!(
                    "[INGEST] Rejected invalid telemetry: {} (total rejected: {})",
                    e, rejected
                );
            }
            return false;
        }

        // Only fails while start/stop swaps the queue
        let Some(intake) = self.intake.try_read() else {
            self.shared.stats.record_rejected_not_running();
            return false;
        };
        match intake.as_ref() {
            Some(queue) => queue.submit(telemetry, &self.shared.stats),
            None => {
                self.shared.stats.record_rejected_not_running();
                false
            }
        }
    }

    /// Current authoritative aggregate decay heat
    pub fn get_total_heat(&self) -> f64 {
        self.shared.heat.total()
    }

    /// Latest periodic snapshot, `None` before the first aggregator tick
    pub fn get_last_state(&self) -> Option<ReactorState> {
        self.shared.latest.latest()
    }

    /// Handle that becomes cancelled exactly once, at SCRAM
    pub fn get_scram_context(&self) -> ScramContext {
        self.shared.scram.context()
    }

    pub fn is_scram_triggered(&self) -> bool {
        self.shared.scram.is_triggered()
    }

    /// Recorded SCRAM signal, `None` until triggered
    pub fn scram_signal(&self) -> Option<ScramSignal> {
        self.shared.scram.signal()
    }

    /// Manual SCRAM (operator or external interlock); `true` if this call performed it
    pub fn trigger_scram(&self, reason: impl Into<String>) -> bool {
        self.shared.scram.trigger(reason)
    }

    /// Pebbles processed into the accumulator so far
    pub fn pebble_count(&self) -> u64 {
        self.shared.pebble_count.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> PipelineStatsSnapshot {
        self.shared.stats.snapshot()
    }

    /// Occupancy of the intake, processing and fragment queues (empty while stopped)
    pub fn queue_stats(&self) -> Vec<ChannelStats> {
        let mut queues = Vec::with_capacity(3);
        if let Some(intake) = self.intake.read().as_ref() {
            queues.push(intake.stats());
        }
        // Skipped while start/stop holds the pipeline
        if let Some(guard) = self.pipeline.try_lock() {
            if let Some(pipeline) = guard.as_ref() {
                queues.extend(pipeline.processing_stats());
                queues.extend(pipeline.fragment_stats());
            }
        }
        queues
    }

    pub fn lifecycle_state(&self) -> EngineLifecycleState {
        self.lifecycle.load()
    }

    pub fn is_running(&self) -> bool {
        self.lifecycle.is_running()
    }

    /// Pipeline threads currently alive
    ///
    /// `config().thread_count()` while running, SCRAM or not, and 0 once `stop()` has
    /// returned.
    pub fn live_workers(&self) -> usize {
        self.live_workers.load(Ordering::Acquire)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl Drop for TelemetryEngine {
    fn drop(&mut self) {
        self.stop();
    }
}
