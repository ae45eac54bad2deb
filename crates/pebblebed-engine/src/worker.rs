// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Named pipeline threads with a live-thread count
//!
//! Pipeline threads never watch a shutdown flag. Each one runs until its input queue is
//! closed and drained, so stopping a stage means dropping its senders and joining.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, error};

use crate::error::{EngineError, EngineResult};

/// Decrements the live count when the owning thread exits (normally or by panic)
struct LiveToken {
    live: Arc<AtomicUsize>,
}

impl LiveToken {
    fn acquire(live: &Arc<AtomicUsize>) -> Self {
        live.fetch_add(1, Ordering::AcqRel);
        Self {
            live: Arc::clone(live),
        }
    }
}

impl Drop for LiveToken {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Spawn a named thread that is counted in `live` for as long as `body` runs
pub(crate) fn spawn_worker<F>(
    name: String,
    live: &Arc<AtomicUsize>,
    body: F,
) -> EngineResult<JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    // Counted before spawn so `live_workers()` is accurate as soon as `start()` returns.
    // If spawning fails the closure, and with it the token, is dropped again.
    let token = LiveToken::acquire(live);
    thread::Builder::new()
        .name(name.clone())
        .spawn(move || {
            let _token = token;
            body();
        })
        .map_err(|source| EngineError::ThreadSpawn { name, source })
}

/// Join every handle of one stage, logging panics instead of propagating them
pub(crate) fn join_all(stage: &str, handles: Vec<JoinHandle<()>>) {
    let count = handles.len();
    for handle in handles {
        let name = handle.thread().name().unwrap_or("<unnamed>").to_string();
        if handle.join().is_err() {
            error!("[ENGINE] {} thread '{}' panicked during shutdown", stage, name);
        }
    }
    debug!("[ENGINE] Joined {} {} thread(s)", count, stage);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::channel;

    #[test]
    fn test_live_count_follows_thread() {
        let live = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = channel::bounded::<u32>(4);

        let handle = spawn_worker("test-worker".to_string(), &live, move || {
            for _ in rx.iter() {}
        })
        .unwrap();
        assert_eq!(live.load(Ordering::Acquire), 1);
        assert_eq!(handle.thread().name(), Some("test-worker"));

        tx.send(1).unwrap();
        drop(tx);
        join_all("test", vec![handle]);
        assert_eq!(live.load(Ordering::Acquire), 0);
    }

    #[test]
    fn test_panicking_worker_is_joined_and_uncounted() {
        let live = Arc::new(AtomicUsize::new(0));
        let handle = spawn_worker("test-panic".to_string(), &live, || {
            panic!("boom");
        })
        .unwrap();

        join_all("test", vec![handle]);
        assert_eq!(live.load(Ordering::Acquire), 0);
    }
}
