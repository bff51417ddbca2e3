// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Pending batch accumulator.
//!
//! Accumulates queue items and reports when a flush is due, either because
//! the batch is full or because the flush interval has elapsed.

use crate::sample::QueueItem;
use std::time::{Duration, Instant};

/// Items accumulated since the last flush.
///
/// A flush is due when either:
/// - the batch holds at least `flush_size` items (size trigger)
/// - `flush_interval` has elapsed since the last flush (time trigger)
///
/// An empty batch is never due.
pub struct PendingBatch {
    items: Vec<QueueItem>,
    flush_size: usize,
    flush_interval: Duration,
    last_flush: Instant,
}

impl PendingBatch {
    /// Create an empty batch; the flush clock starts now.
    pub fn new(flush_size: usize, flush_interval: Duration) -> Self {
        Self {
            items: Vec::with_capacity(flush_size),
            flush_size,
            flush_interval,
            last_flush: Instant::now(),
        }
    }

    /// Append an item.
    pub fn push(&mut self, item: QueueItem) {
        self.items.push(item);
    }

    /// Size trigger.
    pub fn is_full(&self) -> bool {
        self.items.len() >= self.flush_size
    }

    /// Time trigger.
    pub fn interval_elapsed(&self) -> bool {
        self.last_flush.elapsed() >= self.flush_interval
    }

    /// Check if either trigger fires for a non-empty batch.
    pub fn should_flush(&self) -> bool {
        !self.items.is_empty() && (self.is_full() || self.interval_elapsed())
    }

    /// Swap out the accumulated items and restart the flush clock.
    pub fn take(&mut self) -> Vec<QueueItem> {
        self.last_flush = Instant::now();
        std::mem::replace(&mut self.items, Vec::with_capacity(self.flush_size))
    }

    /// Number of pending items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Size trigger threshold.
    pub fn flush_size(&self) -> usize {
        self.flush_size
    }
}
