// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sample buffer configuration.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SAMPLED_BUFFER_FLUSH_SIZE` | 100 | Flush once this many samples are pending |
//! | `SAMPLED_BUFFER_FLUSH_INTERVAL_MS` | 1000 | Flush once this much time passed since the last flush |
//! | `SAMPLED_DAEMON_HOST` | localhost | Collector host |
//! | `SAMPLED_DAEMON_PORT` | 7675 | Collector port |
//! | `SAMPLED_QUEUE_CAPACITY` | 1000 | Intake queue bound |
//!
//! Unparseable or zero values fall back to the default.

use crate::error::ConfigError;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Environment variable: size trigger.
pub const ENV_FLUSH_SIZE: &str = "SAMPLED_BUFFER_FLUSH_SIZE";
/// Environment variable: time trigger in milliseconds.
pub const ENV_FLUSH_INTERVAL_MS: &str = "SAMPLED_BUFFER_FLUSH_INTERVAL_MS";
/// Environment variable: collector host.
pub const ENV_DAEMON_HOST: &str = "SAMPLED_DAEMON_HOST";
/// Environment variable: collector port.
pub const ENV_DAEMON_PORT: &str = "SAMPLED_DAEMON_PORT";
/// Environment variable: intake queue capacity.
pub const ENV_QUEUE_CAPACITY: &str = "SAMPLED_QUEUE_CAPACITY";

/// Default size trigger.
pub const DEFAULT_FLUSH_SIZE: usize = 100;
/// Default time trigger.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(1000);
/// Default collector host.
pub const DEFAULT_DAEMON_HOST: &str = "localhost";
/// Default collector port.
pub const DEFAULT_DAEMON_PORT: u16 = 7675;
/// Default intake queue bound.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

/// Configuration for a [`SampleBuffer`](crate::SampleBuffer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferConfig {
    /// Flush once this many samples are pending.
    pub flush_size: usize,

    /// Flush once this much time has passed since the last flush.
    pub flush_interval: Duration,

    /// Collector host name or address.
    pub host: String,

    /// Collector TCP port.
    pub port: u16,

    /// Maximum number of samples waiting in the intake queue.
    pub queue_capacity: usize,

    /// How long the flush worker waits for a sample per loop iteration.
    pub dequeue_timeout: Duration,

    /// Transport attempts per batch (first try included).
    pub max_attempts: u32,

    /// Pause between transport attempts.
    pub retry_backoff: Duration,

    /// Connection establishment timeout.
    pub connect_timeout: Duration,

    /// Socket write timeout.
    pub write_timeout: Duration,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            flush_size: DEFAULT_FLUSH_SIZE,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            host: DEFAULT_DAEMON_HOST.to_string(),
            port: DEFAULT_DAEMON_PORT,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            dequeue_timeout: Duration::from_millis(50),
            max_attempts: 3,
            retry_backoff: Duration::from_secs(1),
            connect_timeout: Duration::from_secs(5),
            write_timeout: Duration::from_secs(5),
        }
    }
}

impl BufferConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// `from_env` delegates here; tests pass a map instead of mutating the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let flush_size =
            parse_positive(&lookup, ENV_FLUSH_SIZE).unwrap_or(defaults.flush_size);

        let flush_interval = parse_positive::<u64, _>(&lookup, ENV_FLUSH_INTERVAL_MS)
            .map(Duration::from_millis)
            .unwrap_or(defaults.flush_interval);

        let host = lookup(ENV_DAEMON_HOST)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.host);

        let port = parse_positive(&lookup, ENV_DAEMON_PORT).unwrap_or(defaults.port);

        let queue_capacity =
            parse_positive(&lookup, ENV_QUEUE_CAPACITY).unwrap_or(defaults.queue_capacity);

        Self {
            flush_size,
            flush_interval,
            host,
            port,
            queue_capacity,
            ..defaults
        }
    }

    /// Builder: set the size trigger.
    pub fn with_flush_size(mut self, size: usize) -> Self {
        self.flush_size = size;
        self
    }

    /// Builder: set the time trigger.
    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }

    /// Builder: set the collector address.
    pub fn with_collector(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = host.into();
        self.port = port;
        self
    }

    /// Builder: set the intake queue bound.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Builder: set the per-iteration dequeue wait.
    pub fn with_dequeue_timeout(mut self, timeout: Duration) -> Self {
        self.dequeue_timeout = timeout;
        self
    }

    /// Builder: set retry attempts and the pause between them.
    pub fn with_retry(mut self, max_attempts: u32, backoff: Duration) -> Self {
        self.max_attempts = max_attempts;
        self.retry_backoff = backoff;
        self
    }

    /// Builder: set connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Builder: set write timeout.
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// `host:port` string used for address resolution.
    pub fn collector_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.flush_size == 0 {
            return Err(ConfigError::Zero("flush_size"));
        }
        if self.flush_interval.is_zero() {
            return Err(ConfigError::Zero("flush_interval"));
        }
        if self.host.trim().is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        if self.port == 0 {
            return Err(ConfigError::Zero("port"));
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::Zero("queue_capacity"));
        }
        if self.dequeue_timeout.is_zero() {
            return Err(ConfigError::Zero("dequeue_timeout"));
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::Zero("max_attempts"));
        }
        if self.connect_timeout.is_zero() {
            return Err(ConfigError::Zero("connect_timeout"));
        }
        if self.write_timeout.is_zero() {
            return Err(ConfigError::Zero("write_timeout"));
        }
        if self.flush_size > self.queue_capacity {
            return Err(ConfigError::FlushSizeExceedsCapacity {
                flush_size: self.flush_size,
                queue_capacity: self.queue_capacity,
            });
        }
        Ok(())
    }
}

/// Parse a strictly positive number from `key`, warning on garbage.
fn parse_positive<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr + PartialEq + Default,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<T>() {
        Ok(v) if v != T::default() => Some(v),
        _ => {
            tracing::warn!(variable = key, value = raw, "ignoring invalid setting");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = BufferConfig::default();
        assert_eq!(config.flush_size, 100);
        assert_eq!(config.flush_interval, Duration::from_millis(1000));
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 7675);
        assert_eq!(config.queue_capacity, 1000);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.retry_backoff, Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup_reads_all_variables() {
        let config = BufferConfig::from_lookup(lookup_from(&[
            (ENV_FLUSH_SIZE, "10"),
            (ENV_FLUSH_INTERVAL_MS, "250"),
            (ENV_DAEMON_HOST, "collector.internal"),
            (ENV_DAEMON_PORT, "9000"),
            (ENV_QUEUE_CAPACITY, "50"),
        ]));

        assert_eq!(config.flush_size, 10);
        assert_eq!(config.flush_interval, Duration::from_millis(250));
        assert_eq!(config.host, "collector.internal");
        assert_eq!(config.port, 9000);
        assert_eq!(config.queue_capacity, 50);
        assert_eq!(config.collector_addr(), "collector.internal:9000");
    }

    #[test]
    fn test_from_lookup_falls_back_on_invalid_values() {
        let config = BufferConfig::from_lookup(lookup_from(&[
            (ENV_FLUSH_SIZE, "lots"),
            (ENV_FLUSH_INTERVAL_MS, "0"),
            (ENV_DAEMON_HOST, "  "),
            (ENV_DAEMON_PORT, "70000"),
            (ENV_QUEUE_CAPACITY, "-1"),
        ]));

        assert_eq!(config, BufferConfig::default());
    }

    #[test]
    fn test_from_lookup_empty_environment_is_default() {
        let config = BufferConfig::from_lookup(|_| None);
        assert_eq!(config, BufferConfig::default());
    }

    #[test]
    fn test_builder_methods() {
        let config = BufferConfig::default()
            .with_flush_size(5)
            .with_flush_interval(Duration::from_millis(200))
            .with_collector("127.0.0.1", 7000)
            .with_queue_capacity(20)
            .with_dequeue_timeout(Duration::from_millis(5))
            .with_retry(2, Duration::from_millis(10))
            .with_connect_timeout(Duration::from_millis(100))
            .with_write_timeout(Duration::from_millis(100));

        assert_eq!(config.flush_size, 5);
        assert_eq!(config.collector_addr(), "127.0.0.1:7000");
        assert_eq!(config.max_attempts, 2);
        assert_eq!(config.retry_backoff, Duration::from_millis(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert_eq!(
            BufferConfig::default().with_flush_size(0).validate(),
            Err(ConfigError::Zero("flush_size"))
        );
        assert_eq!(
            BufferConfig::default().with_collector("", 7675).validate(),
            Err(ConfigError::EmptyHost)
        );
        assert_eq!(
            BufferConfig::default()
                .with_retry(0, Duration::from_secs(1))
                .validate(),
            Err(ConfigError::Zero("max_attempts"))
        );
        assert_eq!(
            BufferConfig::default()
                .with_flush_size(10)
                .with_queue_capacity(5)
                .validate(),
            Err(ConfigError::FlushSizeExceedsCapacity {
                flush_size: 10,
                queue_capacity: 5
            })
        );
    }
}
