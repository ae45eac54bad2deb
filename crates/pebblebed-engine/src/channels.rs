// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Bounded pipeline queues
//!
//! Every queue between stages is a bounded crossbeam channel sized by `buffer_size`.
//! Closing a queue means dropping its last `Sender`; receivers then drain what is left
//! and see `Disconnected`.

use crossbeam::channel::{bounded, Receiver, Sender};

/// Create a bounded queue with the given capacity
///
/// Producers use `try_send` only; the caller decides what to shed when it is full.
pub fn create_bounded<T>(capacity: usize) -> (Sender<T>, Receiver<T>) {
    bounded(capacity)
}

/// Pipeline queue identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueName {
    /// Producers to ingestion workers
    Intake,
    /// Ingestion workers to processing workers
    Processing,
    /// Processing workers to the aggregator
    Fragments,
}

/// Point-in-time occupancy of one pipeline queue
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelStats {
    pub queue: QueueName,
    pub capacity: usize,
    pub len: usize,
    pub is_full: bool,
}

impl ChannelStats {
    pub fn from_sender<T>(queue: QueueName, sender: &Sender<T>) -> Self {
        Self {
            queue,
            capacity: sender.capacity().unwrap_or(0),
            len: sender.len(),
            is_full: sender.is_full(),
        }
    }

    /// Fill level (0.0 to 1.0)
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            self.len as f64 / self.capacity as f64
        }
    }
}
