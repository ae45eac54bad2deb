// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # SCRAM latch and broadcast
//!
//! `NotTriggered → Triggered` happens exactly once per controller. The transition is a
//! CAS on an `AtomicBool`; only the winning caller records the signal and performs the
//! broadcast, every other caller is a no-op.
//!
//! The broadcast is a crossbeam channel on which nothing is ever sent. The controller
//! owns the only `Sender`; the winner drops it, which disconnects every `Receiver` clone
//! handed out through [`ScramContext`]. Listeners can therefore poll, block, block with a
//! timeout, or `select!` on the SCRAM alongside their own channels.

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

/// Terminal SCRAM record (never un-set once `triggered` is true)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScramSignal {
    pub triggered: bool,
    pub reason: String,
    pub timestamp: SystemTime,
}

/// Exactly-once SCRAM trigger
#[derive(Debug)]
pub struct ScramController {
    triggered: AtomicBool,
    signal: Mutex<Option<ScramSignal>>,
    /// Dropped by the winning trigger; its absence *is* the broadcast
    broadcast_tx: Mutex<Option<Sender<()>>>,
    broadcast_rx: Receiver<()>,
    broadcasts: AtomicU64,
    redundant_triggers: AtomicU64,
}

impl ScramController {
    pub fn new() -> Self {
        let (broadcast_tx, broadcast_rx) = channel::bounded(0);
        Self {
            triggered: AtomicBool::new(false),
            signal: Mutex::new(None),
            broadcast_tx: Mutex::new(Some(broadcast_tx)),
            broadcast_rx,
            broadcasts: AtomicU64::new(0),
            redundant_triggers: AtomicU64::new(0),
        }
    }

    /// Request a SCRAM. Returns `true` only for the single caller that performed it.
    pub fn trigger(&self, reason: impl Into<String>) -> bool {
        if self
            .triggered
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            self.redundant_triggers.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        let reason = reason.into();
        warn!("[SCRAM] Latched: {}", reason);
        *self.signal.lock() = Some(ScramSignal {
            triggered: true,
            reason,
            timestamp: SystemTime::now(),
        });

        // Signal is recorded before listeners are released
        let sender = self.broadcast_tx.lock().take();
        drop(sender);
        self.broadcasts.fetch_add(1, Ordering::AcqRel);
        debug!("[SCRAM] Broadcast released");
        true
    }

    /// Point-in-time check of the latch
    #[inline]
    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::Acquire)
    }

    /// Handle that observers can poll or wait on
    pub fn context(&self) -> ScramContext {
        ScramContext {
            done: self.broadcast_rx.clone(),
        }
    }

    /// The recorded signal, `None` until the broadcast winner has written it
    pub fn signal(&self) -> Option<ScramSignal> {
        self.signal.lock().clone()
    }

    /// How many broadcasts were performed (0 or 1)
    pub fn broadcast_count(&self) -> u64 {
        self.broadcasts.load(Ordering::Acquire)
    }

    /// Triggers that arrived after the latch was already set
    pub fn redundant_triggers(&self) -> u64 {
        self.redundant_triggers.load(Ordering::Relaxed)
    }
}

impl Default for ScramController {
    fn default() -> Self {
        Self::new()
    }
}

/// Cancellation handle that becomes "done" exactly once, at SCRAM
#[derive(Debug, Clone)]
pub struct ScramContext {
    done: Receiver<()>,
}

impl ScramContext {
    /// Non-blocking check
    pub fn is_cancelled(&self) -> bool {
        matches!(self.done.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Block until SCRAM
    pub fn wait(&self) {
        // Nothing is ever sent, so recv only returns once the sender is gone
        let _ = self.done.recv();
    }

    /// Block until SCRAM or `timeout`; `true` if SCRAM happened
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        !matches!(
            self.done.recv_timeout(timeout),
            Err(RecvTimeoutError::Timeout)
        )
    }

    /// Raw receiver for use in `crossbeam::select!`; it disconnects at SCRAM
    pub fn done(&self) -> &Receiver<()> {
        &self.done
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::{Arc, Barrier};
    use std::thread;

    #[test]
    fn test_initially_not_triggered() {
        let scram = ScramController::new();
        assert!(!scram.is_triggered());
        assert!(!scram.context().is_cancelled());
        assert!(scram.signal().is_none());
        assert!(!scram.context().wait_timeout(Duration::from_millis(5)));
    }

    #[test]
    fn test_trigger_latches_with_reason() {
        let scram = ScramController::new();
        assert!(scram.trigger("coolant 1200 > 1000"));
        assert!(scram.is_triggered());

        let signal = scram.signal().unwrap();
        assert!(signal.triggered);
        assert_eq!(signal.reason, "coolant 1200 > 1000");

        // Later triggers neither win nor overwrite the reason
        assert!(!scram.trigger("second"));
        assert_eq!(scram.signal().unwrap().reason, "coolant 1200 > 1000");
        assert_eq!(scram.redundant_triggers(), 1);
        assert!(scram.is_triggered());
    }

    #[test]
    fn test_context_created_after_trigger_is_cancelled() {
        let scram = ScramController::new();
        scram.trigger("x");
        let ctx = scram.context();
        assert!(ctx.is_cancelled());
        ctx.wait();
        assert!(ctx.wait_timeout(Duration::from_millis(1)));
    }

    #[test]
    fn test_exactly_once_under_concurrent_triggers() {
        const TRIGGERS: usize = 64;
        const LISTENERS: usize = 8;

        let scram = Arc::new(ScramController::new());
        let wakeups = Arc::new(AtomicUsize::new(0));

        let listeners: Vec<_> = (0..LISTENERS)
            .map(|_| {
                let ctx = scram.context();
                let wakeups = Arc::clone(&wakeups);
                thread::spawn(move || {
                    ctx.wait();
                    wakeups.fetch_add(1, Ordering::SeqCst);
                })
            })
            .collect();

        let barrier = Arc::new(Barrier::new(TRIGGERS));
        let winners = Arc::new(AtomicUsize::new(0));
        let triggers: Vec<_> = (0..TRIGGERS)
            .map(|_| {
                let scram = Arc::clone(&scram);
                let barrier = Arc::clone(&barrier);
                let winners = Arc::clone(&winners);
                thread::spawn(move || {
                    barrier.wait();
                    if scram.trigger("x") {
                        winners.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in triggers {
            handle.join().unwrap();
        }
        for handle in listeners {
            handle.join().unwrap();
        }

        assert_eq!(winners.load(Ordering::SeqCst), 1);
        assert_eq!(scram.broadcast_count(), 1);
        assert_eq!(scram.redundant_triggers(), (TRIGGERS - 1) as u64);
        // Each listener woke exactly once, from the single broadcast
        assert_eq!(wakeups.load(Ordering::SeqCst), LISTENERS);
        assert!(scram.is_triggered());

        scram.trigger("after");
        assert!(scram.is_triggered());
        assert_eq!(scram.broadcast_count(), 1);
    }

    #[test]
    fn test_select_on_done_receiver() {
        let scram = ScramController::new();
        let ctx = scram.context();
        let (_work_tx, work_rx) = channel::unbounded::<u32>();

        scram.trigger("select");
        crossbeam::select! {
            recv(ctx.done()) -> msg => assert!(msg.is_err()),
            recv(work_rx) -> _ => panic!("work channel should be idle"),
        }
    }
}
