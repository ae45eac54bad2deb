// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Engine lifecycle state with lock-free atomic operations

use atomic_polyfill::{AtomicU8, Ordering};

/// Engine lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EngineLifecycleState {
    Stopped = 0,
    Starting = 1,
    Running = 2,
    Stopping = 3,
}

impl EngineLifecycleState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => EngineLifecycleState::Starting,
            2 => EngineLifecycleState::Running,
            3 => EngineLifecycleState::Stopping,
            _ => EngineLifecycleState::Stopped,
        }
    }
}

/// Lifecycle state stored in a single byte
///
/// Callers are expected to serialise lifecycle changes themselves; `transition` only
/// refuses a step taken from an unexpected state.
#[derive(Debug)]
pub struct AtomicLifecycleState {
    state: AtomicU8,
}

impl AtomicLifecycleState {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(EngineLifecycleState::Stopped as u8),
        }
    }

    pub fn load(&self) -> EngineLifecycleState {
        EngineLifecycleState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn store(&self, state: EngineLifecycleState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Move `from` → `to` only if the current state is still `from`.
    ///
    /// Returns the state observed when the transition was refused.
    pub fn transition(
        &self,
        from: EngineLifecycleState,
        to: EngineLifecycleState,
    ) -> Result<(), EngineLifecycleState> {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(EngineLifecycleState::from_u8)
    }

    pub fn is_running(&self) -> bool {
        self.load() == EngineLifecycleState::Running
    }
}

impl Default for AtomicLifecycleState {
    fn default() -> Self {
        Self::new()
    }
}
