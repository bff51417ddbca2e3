// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Background flush worker.
//!
//! One dedicated thread drains the intake queue into a pending batch and
//! flushes it when the size or time trigger fires. Flushing runs on the same
//! thread, so at most one batch is ever in flight and batches leave in
//! order. A slow flush delays draining; the intake queue absorbs the delay
//! and sheds samples if it fills.

use crate::batch::PendingBatch;
use crate::codec;
use crate::config::BufferConfig;
use crate::queue::IntakeQueue;
use crate::sample::QueueItem;
use crate::stats::BufferStats;
use crate::transport::Transport;
use crossbeam::channel::{Receiver, TryRecvError};
use std::io;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Name of the flush worker thread.
pub const WORKER_THREAD_NAME: &str = "sampled-flush";

/// Flush worker state, owned by the worker thread.
pub(crate) struct FlushWorker {
    queue: IntakeQueue,
    pending: PendingBatch,
    transport: Box<dyn Transport>,
    stats: Arc<BufferStats>,
    shutdown: Receiver<()>,
    dequeue_timeout: Duration,
    /// `samples_dropped` value at the last overflow report.
    reported_drops: u64,
}

impl FlushWorker {
    pub(crate) fn new(
        config: &BufferConfig,
        queue: IntakeQueue,
        transport: Box<dyn Transport>,
        stats: Arc<BufferStats>,
        shutdown: Receiver<()>,
    ) -> Self {
        Self {
            queue,
            pending: PendingBatch::new(config.flush_size, config.flush_interval),
            transport,
            stats,
            shutdown,
            dequeue_timeout: config.dequeue_timeout,
            reported_drops: 0,
        }
    }

    /// Spawn the worker thread.
    pub(crate) fn spawn(self) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || self.run())
    }

    /// Run until the shutdown channel fires or disconnects, then drain.
    fn run(mut self) {
        tracing::info!(
            flush_size = self.pending.flush_size(),
            queue_capacity = self.queue.capacity(),
            "sample flush worker started"
        );

        loop {
            match self.shutdown.try_recv() {
                Err(TryRecvError::Empty) => {}
                Ok(()) | Err(TryRecvError::Disconnected) => break,
            }
            self.step();
        }

        self.drain();
        self.transport.close();

        let stats = self.stats.snapshot();
        tracing::info!(
            batches_sent = stats.batches_sent,
            samples_sent = stats.samples_sent,
            samples_lost = stats.samples_lost,
            samples_dropped = stats.samples_dropped,
            "sample flush worker stopped"
        );
    }

    /// One loop iteration: take at most one item, then flush if due.
    fn step(&mut self) {
        if let Some(item) = self.queue.dequeue(self.dequeue_timeout) {
            self.pending.push(item);
        }

        if self.pending.should_flush() {
            let batch = self.pending.take();
            let _ = self.flush(batch);
        }
    }

    /// Flush everything still pending or queued, in `flush_size` chunks.
    ///
    /// Stops sending after the first batch the transport gives up on; the
    /// rest is counted as lost so shutdown costs at most one retry cycle.
    fn drain(&mut self) {
        let flush_size = self.pending.flush_size();
        let mut items = self.pending.take();
        items.extend(self.queue.drain());

        let mut rest = items.into_iter();
        loop {
            let chunk: Vec<QueueItem> = rest.by_ref().take(flush_size).collect();
            if chunk.is_empty() {
                break;
            }
            if !self.flush(chunk) {
                let abandoned = rest.len() as u64;
                if abandoned > 0 {
                    BufferStats::add(&self.stats.samples_lost, abandoned);
                    tracing::warn!(abandoned, "collector unreachable, abandoning queued samples");
                }
                break;
            }
        }
    }

    /// Encode and send one batch. Failures are logged and counted, never raised.
    ///
    /// Returns `false` if the transport gave up on the batch.
    fn flush(&mut self, items: Vec<QueueItem>) -> bool {
        self.report_overflow();

        let encoded = codec::encode_batch(&items);
        if encoded.skipped > 0 {
            BufferStats::add(&self.stats.encode_failures, encoded.skipped as u64);
        }
        if encoded.is_empty() {
            return true;
        }

        let records = encoded.records as u64;
        match self.transport.send(&encoded.payload) {
            Ok(()) => {
                BufferStats::add(&self.stats.batches_sent, 1);
                BufferStats::add(&self.stats.samples_sent, records);
                tracing::trace!(records, bytes = encoded.payload.len(), "batch flushed");
                true
            }
            Err(err) => {
                BufferStats::add(&self.stats.batches_failed, 1);
                BufferStats::add(&self.stats.samples_lost, records);
                tracing::warn!(records, error = %err, "discarding batch");
                false
            }
        }
    }

    /// Warn once per flush if producers hit a full queue since the last one.
    fn report_overflow(&mut self) {
        let dropped = self.stats.samples_dropped.load(Ordering::Relaxed);
        if dropped > self.reported_drops {
            tracing::warn!(
                dropped = dropped - self.reported_drops,
                capacity = self.queue.capacity(),
                "intake queue full, samples dropped"
            );
            self.reported_drops = dropped;
        }
    }
}
