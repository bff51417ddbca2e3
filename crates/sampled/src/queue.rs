// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bounded intake queue between producers and the flush worker.
//!
//! Producers only ever attempt a zero-wait insert. When the queue is full the
//! sample is refused immediately: a full queue means the flush worker is
//! stalled or gone, and shedding load beats blocking the application.

use crate::sample::QueueItem;
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TrySendError};
use std::time::Duration;

/// Bounded multi-producer FIFO of [`QueueItem`]s.
///
/// Cloning yields another handle to the same queue. Every handle owns both
/// channel ends, so the queue never reports disconnection while one exists.
#[derive(Clone)]
pub struct IntakeQueue {
    sender: Sender<QueueItem>,
    receiver: Receiver<QueueItem>,
    capacity: usize,
}

impl IntakeQueue {
    /// Create a queue holding at most `capacity` items.
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = channel::bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Insert without waiting.
    ///
    /// Returns `false` when the queue is full; the item is dropped.
    pub fn enqueue(&self, item: QueueItem) -> bool {
        match self.sender.try_send(item) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Wait up to `timeout` for the next item.
    pub fn dequeue(&self, timeout: Duration) -> Option<QueueItem> {
        match self.receiver.recv_timeout(timeout) {
            Ok(item) => Some(item),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Take every item currently queued without waiting.
    pub fn drain(&self) -> impl Iterator<Item = QueueItem> + '_ {
        self.receiver.try_iter()
    }

    /// Number of items currently queued.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Check if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Maximum number of queued items.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
