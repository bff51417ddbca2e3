// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Loopback collector for integration tests.
//!
//! Accepts any number of connections, splits each stream on the record
//! delimiter and keeps the records in arrival order. Dropping the collector
//! closes the listener and every accepted connection.

#![allow(dead_code)]

use sampled::codec::{decode_payload, DELIMITER};
use sampled::{BufferConfig, QueueItem, SampleBuffer, StatsSnapshot};
use std::io::{self, ErrorKind, Read};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

pub struct FakeCollector {
    port: u16,
    records: Arc<Mutex<Vec<Vec<u8>>>>,
    connections: Arc<AtomicUsize>,
    stop: Arc<AtomicBool>,
    accept_thread: Option<JoinHandle<()>>,
}

impl FakeCollector {
    /// Listen on an ephemeral loopback port.
    pub fn start() -> Self {
        Self::start_on(0).expect("bind loopback collector")
    }

    /// Listen on a specific loopback port.
    pub fn start_on(port: u16) -> io::Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", port))?;
        listener.set_nonblocking(true)?;
        let port = listener.local_addr()?.port();

        let records = Arc::new(Mutex::new(Vec::new()));
        let connections = Arc::new(AtomicUsize::new(0));
        let stop = Arc::new(AtomicBool::new(false));

        let accept_thread = {
            let records = Arc::clone(&records);
            let connections = Arc::clone(&connections);
            let stop = Arc::clone(&stop);
            thread::spawn(move || accept_loop(listener, records, connections, stop))
        };

        Ok(Self {
            port,
            records,
            connections,
            stop,
            accept_thread: Some(accept_thread),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Connections accepted so far.
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Decoded records received so far.
    pub fn items(&self) -> Vec<QueueItem> {
        let records = self.records.lock().unwrap();
        records
            .iter()
            .flat_map(|r| decode_payload(r).expect("collector received a malformed record"))
            .collect()
    }

    /// Wait until at least `count` records arrived or `timeout` passed.
    pub fn wait_for(&self, count: usize, timeout: Duration) -> Vec<QueueItem> {
        let deadline = Instant::now() + timeout;
        loop {
            let items = self.items();
            if items.len() >= count || Instant::now() >= deadline {
                return items;
            }
            thread::sleep(Duration::from_millis(5));
        }
    }
}

impl Drop for FakeCollector {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.accept_thread.take() {
            let _ = handle.join();
        }
    }
}

fn accept_loop(
    listener: TcpListener,
    records: Arc<Mutex<Vec<Vec<u8>>>>,
    connections: Arc<AtomicUsize>,
    stop: Arc<AtomicBool>,
) {
    let mut readers = Vec::new();
    while !stop.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, _)) => {
                connections.fetch_add(1, Ordering::SeqCst);
                let records = Arc::clone(&records);
                let stop = Arc::clone(&stop);
                readers.push(thread::spawn(move || read_records(stream, records, stop)));
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                thread::sleep(Duration::from_millis(2));
            }
            Err(_) => break,
        }
    }
    // Listener and every accepted stream are closed once this returns.
    for reader in readers {
        let _ = reader.join();
    }
}

fn read_records(
    mut stream: TcpStream,
    records: Arc<Mutex<Vec<Vec<u8>>>>,
    stop: Arc<AtomicBool>,
) {
    let _ = stream.set_nonblocking(false);
    let _ = stream.set_read_timeout(Some(Duration::from_millis(10)));
    let mut pending = Vec::new();
    let mut chunk = [0u8; 4096];

    while !stop.load(Ordering::SeqCst) {
        match stream.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                pending.extend_from_slice(&chunk[..n]);
                while let Some(pos) = pending.iter().position(|b| *b == DELIMITER) {
                    let record: Vec<u8> = pending.drain(..=pos).collect();
                    records.lock().unwrap().push(record);
                }
            }
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
            Err(_) => break,
        }
    }
}

/// A loopback port with nothing listening on it.
pub fn unused_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    listener.local_addr().expect("local addr").port()
}

/// Buffer config pointed at a loopback port with short retry pauses.
pub fn loopback_config(port: u16) -> BufferConfig {
    BufferConfig::default()
        .with_collector("127.0.0.1", port)
        .with_retry(3, Duration::from_millis(100))
        .with_connect_timeout(Duration::from_millis(500))
        .with_write_timeout(Duration::from_millis(500))
}

/// Poll buffer stats until `done` holds or `timeout` passes.
pub fn wait_stats<F>(buffer: &SampleBuffer, timeout: Duration, done: F) -> StatsSnapshot
where
    F: Fn(&StatsSnapshot) -> bool,
{
    let deadline = Instant::now() + timeout;
    loop {
        let stats = buffer.stats();
        if done(&stats) || Instant::now() >= deadline {
            return stats;
        }
        thread::sleep(Duration::from_millis(5));
    }
}
