// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Collector transport.
//!
//! [`TcpTransport`] keeps one outbound connection to the collector and
//! reuses it across flushes. Any I/O error closes and discards the
//! connection; the next attempt dials a fresh one. A payload gets a bounded
//! number of attempts with a fixed pause between them and is discarded when
//! they run out.
//!
//! Framing is per connection, so a record cut short by a failed write stays
//! on the discarded connection and never merges with the resent payload.

use crate::config::BufferConfig;
use crate::error::TransportError;
use std::io::{self, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::thread;
use std::time::Duration;

/// Sends encoded batches to the collector.
///
/// Implementations are driven exclusively by the flush worker thread.
pub trait Transport: Send {
    /// Deliver one payload, retrying as the implementation sees fit.
    fn send(&mut self, payload: &[u8]) -> Result<(), TransportError>;

    /// Check if a connection is currently open.
    fn is_connected(&self) -> bool;

    /// Drop the current connection, if any.
    fn close(&mut self);
}

/// Connection state.
enum ConnState {
    /// No connection; the next send dials one.
    Disconnected,
    /// Open connection, reused across sends.
    Connected { stream: TcpStream },
}

/// Transport counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransportStats {
    /// Times a connection was dialled.
    pub connect_attempts: u64,
    /// Times a connection was established.
    pub connections_opened: u64,
    /// Failed attempts (connect or write).
    pub failures: u64,
    /// Reused connections found closed by the collector before a write.
    pub stale_connections: u64,
}

/// TCP transport with reconnect-on-failure and bounded retry.
pub struct TcpTransport {
    addr: String,
    max_attempts: u32,
    retry_backoff: Duration,
    connect_timeout: Duration,
    write_timeout: Duration,
    state: ConnState,
    stats: TransportStats,
}

impl TcpTransport {
    /// Create a transport for the collector named in `config`.
    ///
    /// No connection is made until the first send.
    pub fn new(config: &BufferConfig) -> Self {
        Self {
            addr: config.collector_addr(),
            max_attempts: config.max_attempts.max(1),
            retry_backoff: config.retry_backoff,
            connect_timeout: config.connect_timeout,
            write_timeout: config.write_timeout,
            state: ConnState::Disconnected,
            stats: TransportStats::default(),
        }
    }

    /// Collector address as `host:port`.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Get transport counters.
    pub fn stats(&self) -> TransportStats {
        self.stats
    }

    /// Dial the collector, trying every resolved address in turn.
    fn open(&mut self) -> Result<TcpStream, TransportError> {
        self.stats.connect_attempts += 1;

        let addrs = self
            .addr
            .to_socket_addrs()
            .map_err(|source| TransportError::Resolve {
                addr: self.addr.clone(),
                source,
            })?;

        let mut last_err = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.connect_timeout) {
                Ok(stream) => {
                    stream.set_nodelay(true).ok();
                    stream.set_write_timeout(Some(self.write_timeout)).ok();
                    self.stats.connections_opened += 1;
                    tracing::debug!(collector = %self.addr, peer = %addr, "connected to collector");
                    return Ok(stream);
                }
                Err(e) => last_err = Some(e),
            }
        }

        Err(TransportError::Connect {
            addr: self.addr.clone(),
            source: last_err.unwrap_or_else(|| {
                io::Error::new(io::ErrorKind::AddrNotAvailable, "no addresses resolved")
            }),
        })
    }

    /// One attempt: connect if needed, then write the whole payload.
    fn attempt(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        if let ConnState::Connected { stream } = &self.state {
            if !peer_is_open(stream) {
                self.stats.stale_connections += 1;
                tracing::debug!(
                    collector = %self.addr,
                    "collector closed the connection, redialing"
                );
                self.close();
            }
        }

        if matches!(self.state, ConnState::Disconnected) {
            let stream = self.open()?;
            self.state = ConnState::Connected { stream };
        }

        if let ConnState::Connected { stream } = &mut self.state {
            stream
                .write_all(payload)
                .and_then(|()| stream.flush())
                .map_err(TransportError::Write)?;
        }
        Ok(())
    }
}

/// Check an idle connection for a close from the collector.
///
/// A write into a half-closed socket still succeeds locally and the data is
/// lost, so a reused stream is peeked first. EOF or any error other than
/// `WouldBlock` means the collector is gone.
fn peer_is_open(stream: &TcpStream) -> bool {
    if stream.set_nonblocking(true).is_err() {
        return false;
    }
    let mut byte = [0u8; 1];
    let open = match stream.peek(&mut byte) {
        Ok(0) => false,
        Ok(_) => true,
        Err(e) => e.kind() == io::ErrorKind::WouldBlock,
    };
    open && stream.set_nonblocking(false).is_ok()
}

impl Transport for TcpTransport {
    fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        let mut attempt = 1;
        loop {
            match self.attempt(payload) {
                Ok(()) => return Ok(()),
                Err(err) => {
                    self.stats.failures += 1;
                    self.close();
                    tracing::debug!(
                        collector = %self.addr,
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %err,
                        "collector send failed"
                    );

                    if attempt >= self.max_attempts {
                        return Err(TransportError::Exhausted {
                            attempts: attempt,
                            last: Box::new(err),
                        });
                    }
                    thread::sleep(self.retry_backoff);
                    attempt += 1;
                }
            }
        }
    }

    fn is_connected(&self) -> bool {
        matches!(self.state, ConnState::Connected { .. })
    }

    fn close(&mut self) {
        self.state = ConnState::Disconnected;
    }
}
