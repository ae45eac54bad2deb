// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Pipeline wiring and ordered shutdown
//!
//! ```text
//! producers ─submit─▶ [intake] ─▶ ingestion × N ─try_send─▶ [processing] ─▶ processing × M
//!                                                                              │
//!                        HeatAccumulator + pebble counter ◀────── add ─────────┤
//!                                   │                                          │
//!                                   ▼                         [fragments] ◀────┘
//!                            StateAggregator ◀──────────────────────┘
//!                                   │ trigger
//!                                   ▼
//!                             ScramController ──broadcast──▶ SCRAM listener, contexts
//! ```
//!
//! Shutdown closes conduits strictly upstream to downstream. A queue is closed by dropping
//! its last sender, and that happens only after every thread that could send on it has
//! been joined.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam::channel::{self, Receiver, Sender};
use crossbeam::select;
use pebblebed_physics::PebbleTelemetry;
use pebblebed_state_manager::{HeatAccumulator, LatestStateSlot, ScramController};
use tracing::{debug, error, info};

use crate::aggregator::StateAggregator;
use crate::channels::{create_bounded, ChannelStats, QueueName};
use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::ingestion::{run_ingestion_worker, IntakeQueue};
use crate::processing::{run_processing_worker, HeatFragment};
use crate::stats::PipelineStats;
use crate::worker::{join_all, spawn_worker};

/// State shared by every pipeline thread of one engine; survives stop/start
#[derive(Debug, Default)]
pub(crate) struct PipelineShared {
    pub(crate) heat: HeatAccumulator,
    pub(crate) pebble_count: AtomicU64,
    pub(crate) latest: LatestStateSlot,
    pub(crate) scram: ScramController,
    pub(crate) stats: PipelineStats,
    /// Set once the SCRAM listener has reported the trip
    scram_reported: AtomicBool,
}

impl PipelineShared {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

/// Threads and downstream senders of one running session
///
/// The intake sender is not held here; it lives in the [`IntakeQueue`] handed back by
/// [`Pipeline::launch`], and the engine drops that before calling [`Pipeline::shutdown`].
#[derive(Default)]
pub(crate) struct Pipeline {
    processing_tx: Option<Sender<PebbleTelemetry>>,
    fragment_tx: Option<Sender<HeatFragment>>,
    aggregator_stop: Option<Sender<()>>,
    listener_stop: Option<Sender<()>>,
    ingestion: Vec<JoinHandle<()>>,
    processing: Vec<JoinHandle<()>>,
    aggregator: Option<JoinHandle<()>>,
    listener: Option<JoinHandle<()>>,
}

impl Pipeline {
    /// Create every queue and spawn every thread
    ///
    /// On a spawn failure the threads already running are shut down in order before the
    /// error is returned.
    pub(crate) fn launch(
        config: &EngineConfig,
        shared: &Arc<PipelineShared>,
        live: &Arc<AtomicUsize>,
    ) -> EngineResult<(Self, IntakeQueue<PebbleTelemetry>)> {
        let (intake, intake_rx) = IntakeQueue::bounded(config.buffer_size);
        let (processing_tx, processing_rx) = create_bounded(config.buffer_size);
        let (fragment_tx, fragment_rx) = create_bounded(config.buffer_size);

        let mut pipeline = Pipeline {
            processing_tx: Some(processing_tx.clone()),
            fragment_tx: Some(fragment_tx.clone()),
            ..Pipeline::default()
        };

        // The clones passed here are dropped when spawning returns, success or not
        let spawned = pipeline.spawn_threads(
            config,
            shared,
            live,
            (intake_rx, processing_rx, fragment_rx),
            (processing_tx, fragment_tx),
        );
        if let Err(e) = spawned {
            error!("[ENGINE] Startup failed, unwinding partially started pipeline: {}", e);
            drop(intake);
            pipeline.shutdown();
            return Err(e);
        }

        Ok((pipeline, intake))
    }

    /// Spawned downstream first so no stage ever waits on a consumer that does not exist yet
    fn spawn_threads(
        &mut self,
        config: &EngineConfig,
        shared: &Arc<PipelineShared>,
        live: &Arc<AtomicUsize>,
        (intake_rx, processing_rx, fragment_rx): (
            Receiver<PebbleTelemetry>,
            Receiver<PebbleTelemetry>,
            Receiver<HeatFragment>,
        ),
        (processing_tx, fragment_tx): (Sender<PebbleTelemetry>, Sender<HeatFragment>),
    ) -> EngineResult<()> {
        let (listener_stop_tx, listener_stop_rx) = channel::bounded::<()>(0);
        self.listener_stop = Some(listener_stop_tx);
        let listener_shared = Arc::clone(shared);
        self.listener = Some(spawn_worker(
            "pebblebed-scram-listener".to_string(),
            live,
            move || run_scram_listener(&listener_shared, listener_stop_rx),
        )?);

        let (aggregator_stop_tx, aggregator_stop_rx) = channel::bounded::<()>(0);
        self.aggregator_stop = Some(aggregator_stop_tx);
        let aggregator = StateAggregator::new(
            Arc::clone(shared),
            fragment_rx,
            Arc::clone(&config.coolant),
            config.max_coolant_temp,
            config.aggregation_interval,
        );
        self.aggregator = Some(spawn_worker(
            "pebblebed-aggregator".to_string(),
            live,
            move || aggregator.run(aggregator_stop_rx),
        )?);

        for worker_id in 0..config.processing_workers {
            let rx = processing_rx.clone();
            let fragment_tx = fragment_tx.clone();
            let worker_shared = Arc::clone(shared);
            let policy = config.timestamp_policy;
            self.processing.push(spawn_worker(
                format!("pebblebed-process-{}", worker_id),
                live,
                move || run_processing_worker(worker_id, rx, fragment_tx, &worker_shared, policy),
            )?);
        }

        for worker_id in 0..config.ingestion_workers {
            let rx = intake_rx.clone();
            let processing_tx = processing_tx.clone();
            let worker_shared = Arc::clone(shared);
            self.ingestion.push(spawn_worker(
                format!("pebblebed-ingest-{}", worker_id),
                live,
                move || run_ingestion_worker(worker_id, rx, processing_tx, &worker_shared.stats),
            )?);
        }

        debug!(
            "[ENGINE] Spawned {} ingestion, {} processing, aggregator and SCRAM listener threads",
            self.ingestion.len(),
            self.processing.len()
        );
        Ok(())
    }

    /// Ordered shutdown; the intake queue must already be closed
    ///
    /// 1. join ingestion workers (they drain intake and exit)
    /// 2. close processing, join processing workers
    /// 3. close fragments, stop the aggregator (final tick), join it
    /// 4. stop and join the SCRAM listener
    pub(crate) fn shutdown(&mut self) {
        join_all("ingestion", std::mem::take(&mut self.ingestion));

        drop(self.processing_tx.take());
        join_all("processing", std::mem::take(&mut self.processing));

        drop(self.fragment_tx.take());
        drop(self.aggregator_stop.take());
        join_all("aggregator", self.aggregator.take().into_iter().collect());

        drop(self.listener_stop.take());
        join_all("SCRAM listener", self.listener.take().into_iter().collect());
    }

    pub(crate) fn processing_stats(&self) -> Option<ChannelStats> {
        self.processing_tx
            .as_ref()
            .map(|tx| ChannelStats::from_sender(QueueName::Processing, tx))
    }

    pub(crate) fn fragment_stats(&self) -> Option<ChannelStats> {
        self.fragment_tx
            .as_ref()
            .map(|tx| ChannelStats::from_sender(QueueName::Fragments, tx))
    }
}

/// Report the SCRAM trip once per engine, then stay up until shutdown
///
/// The listener lives exactly as long as the pipeline, including sessions started after
/// a SCRAM, so it is always counted by `live_workers`.
fn run_scram_listener(shared: &PipelineShared, shutdown: Receiver<()>) {
    let context = shared.scram.context();
    select! {
        recv(context.done()) -> _ => {
            if shared.scram_reported.swap(true, Ordering::AcqRel) {
                debug!("[SCRAM] Engine restarted after SCRAM; already reported");
            } else {
                match shared.scram.signal() {
                    Some(signal) => error!(
                        "[SCRAM] 🚨 REACTOR SCRAM at {:?}: {}",
                        signal.timestamp, signal.reason
                    ),
                    None => error!("[SCRAM] 🚨 REACTOR SCRAM (no signal recorded)"),
                }
            }
            // Disconnects on shutdown
            let _ = shutdown.recv();
        }
        recv(shutdown) -> _ => {
            info!("[SCRAM] Listener stopped without a SCRAM");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pebblebed_physics::Isotope;
    use std::time::Duration;

    fn small_config() -> EngineConfig {
        EngineConfig::new(1000.0, 2, 2, 64).with_aggregation_interval(Duration::from_millis(5))
    }

    #[test]
    fn test_launch_and_shutdown_accounts_for_every_thread() {
        let shared = Arc::new(PipelineShared::new());
        let live = Arc::new(AtomicUsize::new(0));
        let config = small_config();

        let (mut pipeline, intake) = Pipeline::launch(&config, &shared, &live).unwrap();
        assert_eq!(live.load(Ordering::Acquire), config.thread_count());
        assert_eq!(pipeline.processing_stats().unwrap().capacity, 64);
        assert_eq!(pipeline.fragment_stats().unwrap().capacity, 64);

        for id in 0..10 {
            let pebble = PebbleTelemetry::sampled_now(
                id,
                vec![Isotope::new(Duration::from_secs(60), 1.0, 1.0)],
            );
            assert!(intake.submit(pebble, &shared.stats));
        }

        drop(intake);
        pipeline.shutdown();

        assert_eq!(live.load(Ordering::Acquire), 0);
        assert_eq!(shared.pebble_count.load(Ordering::Acquire), 10);
        assert_eq!(shared.latest.latest().unwrap().pebble_count, 10);
        assert!(pipeline.processing_stats().is_none());
    }

    #[test]
    fn test_listener_reports_once_and_waits_for_shutdown() {
        let shared = Arc::new(PipelineShared::new());
        let (stop_tx, stop_rx) = channel::bounded::<()>(0);
        let listener_shared = Arc::clone(&shared);
        let handle = std::thread::spawn(move || run_scram_listener(&listener_shared, stop_rx));

        assert!(shared.scram.trigger("test trip"));
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while !shared.scram_reported.load(Ordering::Acquire) {
            assert!(std::time::Instant::now() < deadline, "SCRAM never reported");
            std::thread::sleep(Duration::from_millis(1));
        }
        assert!(!handle.is_finished());

        drop(stop_tx);
        handle.join().unwrap();
    }

    #[test]
    fn test_listener_stays_up_after_restart_following_scram() {
        let shared = Arc::new(PipelineShared::new());
        let live = Arc::new(AtomicUsize::new(0));
        let config = small_config();
        assert!(shared.scram.trigger("earlier session"));

        let (mut first, intake) = Pipeline::launch(&config, &shared, &live).unwrap();
        drop(intake);
        first.shutdown();
        assert!(shared.scram_reported.load(Ordering::Acquire));

        let (mut second, intake) = Pipeline::launch(&config, &shared, &live).unwrap();
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(live.load(Ordering::Acquire), config.thread_count());

        drop(intake);
        second.shutdown();
        assert_eq!(live.load(Ordering::Acquire), 0);
    }
}
