// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Lock-free running total of reactor decay heat
//!
//! The total is an `f64` kept as its bit pattern in an `AtomicU64`. Writers run a
//! compare-and-swap loop: load bits, decode, add, encode, CAS; on failure another writer
//! got there first and the loop retries from the value it observed. Readers do a single
//! atomic load, so they only ever see a total some `add` actually committed.

use atomic_polyfill::{AtomicU64, Ordering};

/// Concurrently writable decay-heat total
///
/// Cache-line aligned so the hot CAS word does not share a line with neighbouring fields.
#[derive(Debug)]
#[repr(C, align(64))]
pub struct HeatAccumulator {
    bits: AtomicU64,
    cas_retries: AtomicU64,
}

impl HeatAccumulator {
    pub fn new() -> Self {
        Self::with_initial(0.0)
    }

    pub fn with_initial(total: f64) -> Self {
        Self {
            bits: AtomicU64::new(total.to_bits()),
            cas_retries: AtomicU64::new(0),
        }
    }

    /// Atomically add `delta` to the total. Never fails, never loses a contribution.
    #[inline]
    pub fn add(&self, delta: f64) {
        let mut current = self.bits.load(Ordering::Acquire);
        loop {
            let next = (f64::from_bits(current) + delta).to_bits();
            match self
                .bits
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return,
                Err(observed) => {
                    self.cas_retries.fetch_add(1, Ordering::Relaxed);
                    current = observed;
                }
            }
        }
    }

    /// Current committed total (single atomic load)
    #[inline]
    pub fn total(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }

    /// Number of CAS attempts lost to a racing writer (contention gauge)
    pub fn cas_retries(&self) -> u64 {
        self.cas_retries.load(Ordering::Relaxed)
    }
}

impl Default for HeatAccumulator {
    fn default() -> Self {
        Self::new()
    }
}
