// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test/bench code readability over pedantic
#![allow(clippy::cast_possible_truncation)] // Test data fits comfortably in target types
#![allow(clippy::cast_possible_wrap)] // Test indices never approach i64::MAX

//! Flush trigger and delivery-order integration tests
//!
//! Runs a real buffer against a loopback collector and checks what arrives
//! on the wire.

mod common;

use common::{loopback_config, wait_stats, FakeCollector};
use sampled::{FieldValue, Sample, SampleBuffer};
use std::collections::HashMap;
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn test_size_trigger_flushes_full_batch() {
    let collector = FakeCollector::start();
    let config = loopback_config(collector.port())
        .with_flush_size(100)
        .with_flush_interval(Duration::from_millis(1000));
    let created = Instant::now();
    let buffer = SampleBuffer::new(config).expect("buffer");

    for i in 0..100i64 {
        assert!(buffer.try_add_sample("size_trigger", Sample::new().with("n", i)));
    }

    let stats = wait_stats(&buffer, Duration::from_millis(900), |s| s.samples_sent == 100);
    assert!(
        created.elapsed() < Duration::from_millis(1000),
        "size trigger should fire before the interval"
    );
    assert_eq!(stats.batches_sent, 1, "expected exactly one flush, got {:?}", stats);
    assert_eq!(stats.samples_sent, 100);

    let items = collector.wait_for(100, Duration::from_secs(2));
    assert_eq!(items.len(), 100);
    buffer.shutdown().expect("shutdown");
}

#[test]
fn test_time_trigger_flushes_partial_batch() {
    let collector = FakeCollector::start();
    let config = loopback_config(collector.port())
        .with_flush_size(100)
        .with_flush_interval(Duration::from_millis(200));
    let buffer = SampleBuffer::new(config).expect("buffer");

    buffer.add_sample("time_trigger", Sample::new().with("value", 1i64));

    thread::sleep(Duration::from_millis(100));
    assert_eq!(buffer.stats().batches_sent, 0, "flushed before the interval");

    let stats = wait_stats(&buffer, Duration::from_secs(2), |s| s.batches_sent == 1);
    assert_eq!(stats.batches_sent, 1);
    assert_eq!(stats.samples_sent, 1);

    let items = collector.wait_for(1, Duration::from_secs(2));
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].dataset, "time_trigger");
    assert_eq!(items[0].sample.get("value"), Some(&FieldValue::Integer(1)));
    buffer.shutdown().expect("shutdown");
}

#[test]
fn test_idle_buffer_sends_nothing() {
    let collector = FakeCollector::start();
    let config = loopback_config(collector.port()).with_flush_interval(Duration::from_millis(50));
    let buffer = SampleBuffer::new(config).expect("buffer");

    thread::sleep(Duration::from_millis(300));
    buffer.shutdown().expect("shutdown");

    assert_eq!(buffer.stats().batches_sent, 0);
    assert!(collector.items().is_empty());
    assert_eq!(collector.connections(), 0, "idle buffer should never connect");
}

#[test]
fn test_every_sample_delivered_once_in_order() {
    let collector = FakeCollector::start();
    let config = loopback_config(collector.port())
        .with_flush_size(100)
        .with_flush_interval(Duration::from_millis(100));
    let buffer = SampleBuffer::new(config).expect("buffer");

    for i in 0..250i64 {
        let dataset = if i % 2 == 0 { "even_rows" } else { "odd_rows" };
        assert!(buffer.try_add_sample(dataset, Sample::new().with("seq", i)));
    }
    buffer.shutdown().expect("shutdown");

    let items = collector.wait_for(250, Duration::from_secs(2));
    assert_eq!(items.len(), 250);

    let seqs: Vec<i64> = items
        .iter()
        .map(|item| match item.sample.get("seq") {
            Some(FieldValue::Integer(n)) => *n,
            other => panic!("unexpected seq field {:?}", other),
        })
        .collect();
    assert_eq!(seqs, (0..250).collect::<Vec<_>>());

    for item in &items {
        let seq = match item.sample.get("seq") {
            Some(FieldValue::Integer(n)) => *n,
            _ => unreachable!(),
        };
        let expected = if seq % 2 == 0 { "even_rows" } else { "odd_rows" };
        assert_eq!(item.dataset, expected);
    }

    let timestamps: Vec<i64> = items.iter().map(|i| i.timestamp).collect();
    assert!(timestamps.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_concurrent_producers_keep_their_own_order() {
    let collector = FakeCollector::start();
    let config = loopback_config(collector.port())
        .with_flush_size(50)
        .with_flush_interval(Duration::from_millis(100))
        .with_queue_capacity(1000);
    let buffer = SampleBuffer::new(config).expect("buffer");

    thread::scope(|s| {
        for producer in 0..4i64 {
            let buffer = &buffer;
            s.spawn(move || {
                for seq in 0..100i64 {
                    buffer.add_sample(
                        "producers",
                        Sample::new().with("producer", producer).with("seq", seq),
                    );
                }
            });
        }
    });
    buffer.shutdown().expect("shutdown");

    let items = collector.wait_for(400, Duration::from_secs(2));
    assert_eq!(items.len(), 400);

    let mut last_seen: HashMap<i64, i64> = HashMap::new();
    for item in &items {
        let (Some(FieldValue::Integer(p)), Some(FieldValue::Integer(seq))) =
            (item.sample.get("producer"), item.sample.get("seq"))
        else {
            panic!("malformed sample {:?}", item.sample);
        };
        if let Some(prev) = last_seen.insert(*p, *seq) {
            assert!(prev < *seq, "producer {} out of order: {} then {}", p, prev, seq);
        }
    }
    assert_eq!(last_seen.len(), 4);
}

#[test]
fn test_special_characters_survive_the_wire() {
    let collector = FakeCollector::start();
    let config = loopback_config(collector.port()).with_flush_interval(Duration::from_millis(50));
    let buffer = SampleBuffer::new(config).expect("buffer");

    buffer.add_sample(
        "wire_text",
        Sample::new()
            .with("quote", "say \"hi\"")
            .with("newline", "a\nb")
            .with("labels", vec!["x", "y", "z"])
            .with("ratio", 0.5),
    );
    buffer.shutdown().expect("shutdown");

    let items = collector.wait_for(1, Duration::from_secs(2));
    assert_eq!(items.len(), 1);
    let sample = &items[0].sample;
    assert_eq!(sample.get("quote"), Some(&FieldValue::from("say \"hi\"")));
    assert_eq!(sample.get("newline"), Some(&FieldValue::from("a\nb")));
    assert_eq!(sample.get("labels"), Some(&FieldValue::from(vec!["x", "y", "z"])));
    assert_eq!(sample.get("ratio"), Some(&FieldValue::Float(0.5)));
}
