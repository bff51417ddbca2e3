// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for configuration, record encoding and the collector transport.
//!
//! None of these ever reach a caller of `add_sample`: the flush worker logs
//! and counts them. They surface only from the lower-level building blocks
//! (codec, transport, config validation) for callers that use those directly.

use std::io;
use thiserror::Error;

/// Invalid buffer configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A numeric setting that must be positive was zero.
    #[error("{0} must be > 0")]
    Zero(&'static str),

    /// The collector host name was empty.
    #[error("collector host must not be empty")]
    EmptyHost,

    /// The flush size can never be reached because the queue is smaller.
    #[error("flush_size {flush_size} exceeds queue_capacity {queue_capacity}")]
    FlushSizeExceedsCapacity {
        /// Configured size trigger.
        flush_size: usize,
        /// Configured intake queue bound.
        queue_capacity: usize,
    },
}

/// Record encoding and payload decoding errors.
#[derive(Debug, Error)]
pub enum CodecError {
    /// JSON serialization or parsing failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A float field held NaN or an infinity, which JSON cannot carry.
    #[error("field '{field}' holds a non-finite number")]
    NonFiniteNumber {
        /// Name of the offending field.
        field: String,
    },
}

/// Collector transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// `host:port` did not resolve to any socket address.
    #[error("could not resolve collector address {addr}: {source}")]
    Resolve {
        /// The `host:port` string that was looked up.
        addr: String,
        /// Underlying resolver error.
        #[source]
        source: io::Error,
    },

    /// Opening the connection failed.
    #[error("connect to {addr} failed: {source}")]
    Connect {
        /// The `host:port` string that was dialled.
        addr: String,
        /// Last connect error seen across resolved addresses.
        #[source]
        source: io::Error,
    },

    /// Writing the payload failed on an open connection.
    #[error("write failed: {0}")]
    Write(#[source] io::Error),

    /// Every attempt failed; the payload was discarded.
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted {
        /// Number of attempts made.
        attempts: u32,
        /// The error from the final attempt.
        last: Box<TransportError>,
    },
}
