// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! sampled client buffer
//!
//! Records timestamped samples from application threads and forwards them in
//! batches to a sampled collector over TCP, without ever blocking the caller.
//!
//! # Overview
//!
//! ```text
//! add_sample() --> IntakeQueue --> FlushWorker --> codec --> TcpTransport --> collector
//!  (any thread)     (bounded)      (one thread)   (JSON\r)   (retry/reconnect)
//! ```
//!
//! - Producers never wait: a full queue drops the sample.
//! - The worker flushes when `flush_size` samples are pending or
//!   `flush_interval` has passed since the last flush.
//! - A batch gets three transport attempts one second apart, then it is
//!   discarded. Delivery is best-effort.
//!
//! # Usage
//!
//! ```rust,no_run
//! use sampled::{BufferConfig, Sample, SampleBuffer};
//!
//! let buffer = SampleBuffer::new(BufferConfig::from_env())?;
//! buffer.add_sample(
//!     "fleet_basic_stats",
//!     Sample::new()
//!         .with("hostname", sampled::host::hostname())
//!         .with("load_avg_1", 0.42)
//!         .with("tags", vec!["a", "b"]),
//! );
//! buffer.shutdown()?;
//! # Ok::<(), std::io::Error>(())
//! ```
//!
//! Or through the process-wide default buffer, created on first use from the
//! environment:
//!
//! ```rust,no_run
//! sampled::add_sample("fleet_basic_stats", sampled::Sample::new().with("procs", 12i64));
//! ```

pub mod batch;
pub mod buffer;
pub mod codec;
pub mod config;
pub mod error;
mod flusher;
pub mod host;
pub mod queue;
pub mod sample;
pub mod stats;
pub mod transport;

pub use buffer::SampleBuffer;
pub use config::BufferConfig;
pub use error::{CodecError, ConfigError, TransportError};
pub use flusher::WORKER_THREAD_NAME;
pub use sample::{FieldValue, QueueItem, Sample};
pub use stats::StatsSnapshot;
pub use transport::{TcpTransport, Transport};

use std::sync::OnceLock;

static DEFAULT_BUFFER: OnceLock<Option<SampleBuffer>> = OnceLock::new();

/// Get the process-wide buffer, creating it from the environment on first use.
///
/// Returns `None` if it could not be created (invalid configuration or the
/// worker thread failed to spawn); that failure is logged once and every
/// later sample is dropped.
pub fn default_buffer() -> Option<&'static SampleBuffer> {
    DEFAULT_BUFFER
        .get_or_init(|| match SampleBuffer::from_env() {
            Ok(buffer) => Some(buffer),
            Err(err) => {
                tracing::warn!(error = %err, "sample buffer unavailable, samples will be dropped");
                None
            }
        })
        .as_ref()
}

/// Record a sample on the process-wide buffer.
pub fn add_sample(dataset: &str, sample: Sample) {
    if let Some(buffer) = default_buffer() {
        buffer.add_sample(dataset, sample);
    }
}

/// Flush and stop the process-wide buffer, if it was ever created.
pub fn shutdown() -> std::io::Result<()> {
    match DEFAULT_BUFFER.get() {
        Some(Some(buffer)) => buffer.shutdown(),
        _ => Ok(()),
    }
}
