// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sample record model.
//!
//! A [`Sample`] maps field names to [`FieldValue`]s. A [`QueueItem`] wraps a
//! sample with its dataset name and the wall-clock time it was observed.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A value stored in a sample field.
///
/// Serialized untagged: strings as JSON strings, numbers as JSON numbers and
/// label sets as arrays of strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Free-form label.
    String(String),
    /// Integer measure.
    Integer(i64),
    /// Floating point measure.
    Float(f64),
    /// Ordered set of labels.
    LabelSet(Vec<String>),
}

impl FieldValue {
    /// Returns true for measures that JSON cannot represent (NaN, +/-inf).
    pub fn is_non_finite(&self) -> bool {
        matches!(self, FieldValue::Float(v) if !v.is_finite())
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::String(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::String(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Integer(i64::from(v))
    }
}

impl From<u32> for FieldValue {
    fn from(v: u32) -> Self {
        FieldValue::Integer(i64::from(v))
    }
}

impl From<u64> for FieldValue {
    /// Values above `i64::MAX` degrade to a float measure.
    fn from(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(i) => FieldValue::Integer(i),
            Err(_) => FieldValue::Float(v as f64),
        }
    }
}

impl From<usize> for FieldValue {
    fn from(v: usize) -> Self {
        FieldValue::from(v as u64)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<f32> for FieldValue {
    fn from(v: f32) -> Self {
        FieldValue::Float(f64::from(v))
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(v: Vec<String>) -> Self {
        FieldValue::LabelSet(v)
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(v: Vec<&str>) -> Self {
        FieldValue::LabelSet(v.into_iter().map(String::from).collect())
    }
}

/// A structured observation: unique field names mapped to values.
///
/// Fields are kept sorted by name; insertion order carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sample {
    fields: BTreeMap<String, FieldValue>,
}

impl Sample {
    /// Create an empty sample.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set a field, replacing any previous value under that name.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Set a field, returning the value it replaced.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Option<FieldValue> {
        self.fields.insert(name.into(), value.into())
    }

    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Iterate over fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the sample has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Sample
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// The unit stored in the intake queue and encoded on the wire.
///
/// Field order matches the wire record: `timestamp`, `dataset`, `sample`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueItem {
    /// Milliseconds since the Unix epoch at which the sample was recorded.
    pub timestamp: i64,
    /// Logical stream name.
    pub dataset: String,
    /// The recorded fields.
    pub sample: Sample,
}

impl QueueItem {
    /// Stamp a sample with the current wall-clock time.
    pub fn now(dataset: impl Into<String>, sample: Sample) -> Self {
        Self {
            timestamp: now_millis(),
            dataset: dataset.into(),
            sample,
        }
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Check a dataset name against what the collector accepts: one or more
/// ASCII letters, digits or underscores.
pub fn is_valid_dataset(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_')
}
