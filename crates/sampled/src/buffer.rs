// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The sample buffer service.
//!
//! [`SampleBuffer`] owns the intake queue and the flush worker. Producers
//! call [`SampleBuffer::add_sample`] from any thread; the call never blocks
//! and never reports failure.

use crate::config::BufferConfig;
use crate::flusher::FlushWorker;
use crate::queue::IntakeQueue;
use crate::sample::{is_valid_dataset, QueueItem, Sample};
use crate::stats::{BufferStats, StatsSnapshot};
use crate::transport::{TcpTransport, Transport};
use crossbeam::channel::{self, Sender};
use parking_lot::Mutex;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Non-blocking, best-effort sample buffer with a background flush worker.
///
/// Dropping the buffer stops the worker after it flushed whatever was
/// still queued (see [`shutdown`](Self::shutdown)).
pub struct SampleBuffer {
    config: BufferConfig,
    queue: IntakeQueue,
    stats: Arc<BufferStats>,
    shutdown_tx: Sender<()>,
    worker: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl SampleBuffer {
    /// Create a buffer sending to the collector named in `config` over TCP.
    ///
    /// # Errors
    /// Fails if the configuration is invalid or the worker thread cannot be
    /// spawned.
    pub fn new(config: BufferConfig) -> io::Result<Self> {
        let transport = TcpTransport::new(&config);
        Self::with_transport(config, Box::new(transport))
    }

    /// Create a buffer configured from `SAMPLED_*` environment variables.
    pub fn from_env() -> io::Result<Self> {
        Self::new(BufferConfig::from_env())
    }

    /// Create a buffer over an arbitrary transport.
    pub fn with_transport(config: BufferConfig, transport: Box<dyn Transport>) -> io::Result<Self> {
        config
            .validate()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        let queue = IntakeQueue::new(config.queue_capacity);
        let stats = Arc::new(BufferStats::new());
        let (shutdown_tx, shutdown_rx) = channel::bounded(1);

        let worker = FlushWorker::new(
            &config,
            queue.clone(),
            transport,
            Arc::clone(&stats),
            shutdown_rx,
        )
        .spawn()?;

        tracing::debug!(
            collector = %config.collector_addr(),
            flush_size = config.flush_size,
            flush_interval_ms = config.flush_interval.as_millis() as u64,
            "sample buffer created"
        );

        Ok(Self {
            config,
            queue,
            stats,
            shutdown_tx,
            worker: Mutex::new(Some(worker)),
            closed: AtomicBool::new(false),
        })
    }

    /// Record a sample under `dataset`.
    ///
    /// The timestamp is taken now. The sample is silently dropped if the
    /// queue is full, the dataset name is invalid, or the buffer was shut
    /// down.
    pub fn add_sample(&self, dataset: &str, sample: Sample) {
        let _ = self.try_add_sample(dataset, sample);
    }

    /// Like [`add_sample`](Self::add_sample), but report whether the sample
    /// was queued.
    pub fn try_add_sample(&self, dataset: &str, sample: Sample) -> bool {
        if self.closed.load(Ordering::Acquire) {
            BufferStats::add(&self.stats.samples_rejected, 1);
            return false;
        }
        if !is_valid_dataset(dataset) {
            tracing::debug!(dataset, "rejecting sample with invalid dataset name");
            BufferStats::add(&self.stats.samples_rejected, 1);
            return false;
        }

        if self.queue.enqueue(QueueItem::now(dataset, sample)) {
            BufferStats::add(&self.stats.samples_enqueued, 1);
            true
        } else {
            BufferStats::add(&self.stats.samples_dropped, 1);
            false
        }
    }

    /// Get buffer counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Number of samples waiting in the intake queue.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Get the configuration.
    pub fn config(&self) -> &BufferConfig {
        &self.config
    }

    /// Check if the flush worker is still accepting samples.
    pub fn is_running(&self) -> bool {
        !self.closed.load(Ordering::Acquire)
    }

    /// Stop accepting samples, flush what is queued, and join the worker.
    ///
    /// Queued samples get the normal transport attempts until one batch is
    /// given up on; the rest is dropped, so a dead collector costs at most
    /// one retry cycle. Concurrent callers all return once the worker has
    /// stopped. Calling it again afterwards is a no-op.
    ///
    /// # Errors
    /// Returns an error if the worker thread panicked.
    pub fn shutdown(&self) -> io::Result<()> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            let _ = self.shutdown_tx.try_send(());
        }

        // Held across the join so later callers wait for the drain too.
        let mut worker = self.worker.lock();
        if let Some(handle) = worker.take() {
            handle
                .join()
                .map_err(|_| io::Error::other("sample flush worker panicked"))?;
        }
        Ok(())
    }
}

impl Drop for SampleBuffer {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}
