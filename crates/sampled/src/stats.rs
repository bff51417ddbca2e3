// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Buffer counters for operator visibility.
//!
//! Sample loss is silent towards producers; these counters are the only
//! place it shows up.

use std::sync::atomic::{AtomicU64, Ordering};

/// Sample buffer counters, shared between producers and the flush worker.
#[derive(Debug)]
pub struct BufferStats {
    /// Samples accepted into the intake queue.
    pub samples_enqueued: AtomicU64,
    /// Samples refused because the intake queue was full.
    pub samples_dropped: AtomicU64,
    /// Samples refused because of an invalid dataset name or a stopped buffer.
    pub samples_rejected: AtomicU64,
    /// Samples left out of a batch because they failed to encode.
    pub encode_failures: AtomicU64,
    /// Batches written to the collector.
    pub batches_sent: AtomicU64,
    /// Samples contained in written batches.
    pub samples_sent: AtomicU64,
    /// Batches discarded after every transport attempt failed.
    pub batches_failed: AtomicU64,
    /// Samples contained in discarded batches.
    pub samples_lost: AtomicU64,
}

impl BufferStats {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self {
            samples_enqueued: AtomicU64::new(0),
            samples_dropped: AtomicU64::new(0),
            samples_rejected: AtomicU64::new(0),
            encode_failures: AtomicU64::new(0),
            batches_sent: AtomicU64::new(0),
            samples_sent: AtomicU64::new(0),
            batches_failed: AtomicU64::new(0),
            samples_lost: AtomicU64::new(0),
        }
    }

    pub(crate) fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    /// Get snapshot of counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            samples_enqueued: self.samples_enqueued.load(Ordering::Relaxed),
            samples_dropped: self.samples_dropped.load(Ordering::Relaxed),
            samples_rejected: self.samples_rejected.load(Ordering::Relaxed),
            encode_failures: self.encode_failures.load(Ordering::Relaxed),
            batches_sent: self.batches_sent.load(Ordering::Relaxed),
            samples_sent: self.samples_sent.load(Ordering::Relaxed),
            batches_failed: self.batches_failed.load(Ordering::Relaxed),
            samples_lost: self.samples_lost.load(Ordering::Relaxed),
        }
    }
}

impl Default for BufferStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of [`BufferStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub samples_enqueued: u64,
    pub samples_dropped: u64,
    pub samples_rejected: u64,
    pub encode_failures: u64,
    pub batches_sent: u64,
    pub samples_sent: u64,
    pub batches_failed: u64,
    pub samples_lost: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_snapshot() {
        let stats = BufferStats::new();
        BufferStats::add(&stats.samples_enqueued, 10);
        BufferStats::add(&stats.batches_sent, 1);
        BufferStats::add(&stats.samples_sent, 10);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.samples_enqueued, 10);
        assert_eq!(snapshot.batches_sent, 1);
        assert_eq!(snapshot.samples_sent, 10);
        assert_eq!(snapshot.samples_dropped, 0);
        assert_eq!(snapshot.samples_lost, 0);
    }
}
