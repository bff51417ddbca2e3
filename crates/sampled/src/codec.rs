// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Batch wire format.
//!
//! Every queue item becomes one compact JSON record, followed by the
//! delimiter byte:
//!
//! ```text
//! {"timestamp":1700000000000,"dataset":"fleet","sample":{"load":0.5}}\r
//! {"timestamp":1700000000001,"dataset":"fleet","sample":{"load":0.7}}\r
//! ```
//!
//! The delimiter terminates each record rather than separating them, so
//! consecutive payloads written to the same connection stay framed. The
//! collector splits the stream on the delimiter; there is no length prefix
//! and no acknowledgement.

use crate::error::CodecError;
use crate::sample::QueueItem;

/// Record terminator (carriage return).
pub const DELIMITER: u8 = b'\r';

/// Replacement for any delimiter byte found inside an encoded record.
const DELIMITER_REPLACEMENT: u8 = b' ';

/// One flush worth of encoded records.
#[derive(Debug, Default)]
pub struct EncodedBatch {
    /// Wire payload.
    pub payload: Vec<u8>,
    /// Number of records in `payload`.
    pub records: usize,
    /// Number of items excluded because they failed to encode.
    pub skipped: usize,
}

impl EncodedBatch {
    /// Check if nothing made it into the payload.
    pub fn is_empty(&self) -> bool {
        self.records == 0
    }
}

/// Encode a single item as a self-contained record, without the delimiter.
///
/// # Errors
/// Returns [`CodecError::NonFiniteNumber`] when a float field is NaN or
/// infinite, or [`CodecError::Json`] if serialization fails.
pub fn encode_record(item: &QueueItem) -> Result<Vec<u8>, CodecError> {
    if let Some((field, _)) = item.sample.iter().find(|(_, v)| v.is_non_finite()) {
        return Err(CodecError::NonFiniteNumber {
            field: field.to_string(),
        });
    }

    let mut record = serde_json::to_vec(item)?;
    sanitize(&mut record);
    Ok(record)
}

/// Encode a batch into a single payload.
///
/// Items that fail to encode are left out and counted in
/// [`EncodedBatch::skipped`]; the remaining items keep their order.
pub fn encode_batch(items: &[QueueItem]) -> EncodedBatch {
    let mut batch = EncodedBatch::default();

    for item in items {
        match encode_record(item) {
            Ok(record) => {
                batch.payload.extend_from_slice(&record);
                batch.payload.push(DELIMITER);
                batch.records += 1;
            }
            Err(err) => {
                tracing::warn!(
                    dataset = %item.dataset,
                    timestamp = item.timestamp,
                    error = %err,
                    "dropping sample that failed to encode"
                );
                batch.skipped += 1;
            }
        }
    }

    batch
}

/// Split a payload back into items.
///
/// Empty segments (including the one after the final delimiter) are ignored.
///
/// # Errors
/// Returns [`CodecError::Json`] if any record is not a valid item.
pub fn decode_payload(payload: &[u8]) -> Result<Vec<QueueItem>, CodecError> {
    payload
        .split(|b| *b == DELIMITER)
        .filter(|record| !record.is_empty())
        .map(|record| serde_json::from_slice(record).map_err(CodecError::from))
        .collect()
}

/// Replace stray delimiter bytes so a record can never break framing.
///
/// Compact JSON escapes control characters inside strings, so this only
/// matters if the encoder ever changes.
fn sanitize(record: &mut [u8]) {
    for b in record.iter_mut().filter(|b| **b == DELIMITER) {
        *b = DELIMITER_REPLACEMENT;
    }
}
