// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! sampled-emit - send samples to a sampled collector
//!
//! # Usage
//!
//! ```bash
//! # One sample, then flush and exit
//! sampled-emit send deploys service=api build=1234 duration=12.5 tags=[blue,canary]
//!
//! # Host statistics every 100 ms until Ctrl+C
//! sampled-emit stats
//!
//! # Ten host samples to a remote collector
//! sampled-emit --host collector.local --port 7675 stats --count 10
//! ```

mod stats;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use sampled::{BufferConfig, FieldValue, Sample, SampleBuffer};
use stats::HostSampler;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "sampled-emit")]
#[command(author = "naskel.com")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Emit samples and host statistics to a sampled collector")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Collector host (default: SAMPLED_DAEMON_HOST or localhost)
    #[arg(long, global = true)]
    host: Option<String>,

    /// Collector port (default: SAMPLED_DAEMON_PORT or 7675)
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Samples per batch (default: SAMPLED_BUFFER_FLUSH_SIZE or 100)
    #[arg(long, global = true)]
    flush_size: Option<usize>,

    /// Maximum time between flushes in ms (default: SAMPLED_BUFFER_FLUSH_INTERVAL_MS or 1000)
    #[arg(long, global = true)]
    flush_interval_ms: Option<u64>,

    /// Verbose mode (show buffer internals)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Send one sample built from key=value fields
    Send {
        /// Dataset name ([A-Za-z0-9_]+)
        dataset: String,

        /// Fields as key=value; values are integers, floats, [a,b] label sets or strings
        #[arg(required = true)]
        fields: Vec<String>,
    },

    /// Periodically send host statistics
    Stats {
        /// Dataset name
        #[arg(short, long, default_value = "fleet_basic_stats")]
        dataset: String,

        /// Sampling period in ms
        #[arg(short, long, default_value = "100")]
        interval_ms: u64,

        /// Stop after this many samples (default: until Ctrl+C)
        #[arg(short = 'n', long)]
        count: Option<u64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("sampled=debug,sampled_emit=debug")
    } else {
        EnvFilter::new("sampled=info,sampled_emit=info")
    };
    fmt().with_env_filter(filter).with_target(false).init();

    let config = build_config(&cli);
    let buffer = SampleBuffer::new(config).context("Failed to create sample buffer")?;

    let result = match &cli.command {
        Command::Send { dataset, fields } => run_send(&buffer, dataset, fields),
        Command::Stats {
            dataset,
            interval_ms,
            count,
        } => run_stats(&buffer, dataset, Duration::from_millis(*interval_ms), *count),
    };

    buffer.shutdown().context("Sample buffer shutdown failed")?;

    let stats = buffer.stats();
    tracing::info!(
        samples_sent = stats.samples_sent,
        samples_lost = stats.samples_lost,
        samples_dropped = stats.samples_dropped,
        "sampled-emit done"
    );

    result
}

/// Environment first, command-line flags on top.
fn build_config(cli: &Cli) -> BufferConfig {
    let mut config = BufferConfig::from_env();
    if cli.host.is_some() || cli.port.is_some() {
        let host = cli.host.clone().unwrap_or_else(|| config.host.clone());
        let port = cli.port.unwrap_or(config.port);
        config = config.with_collector(host, port);
    }
    if let Some(size) = cli.flush_size {
        config = config.with_flush_size(size);
    }
    if let Some(ms) = cli.flush_interval_ms {
        config = config.with_flush_interval(Duration::from_millis(ms));
    }
    config
}

fn run_send(buffer: &SampleBuffer, dataset: &str, fields: &[String]) -> Result<()> {
    let sample = fields
        .iter()
        .map(|f| parse_field(f))
        .collect::<Result<Sample>>()?;

    if !buffer.try_add_sample(dataset, sample) {
        bail!("Sample rejected (dataset names must match [A-Za-z0-9_]+)");
    }
    tracing::debug!(dataset, fields = fields.len(), "sample queued");
    Ok(())
}

fn run_stats(
    buffer: &SampleBuffer,
    dataset: &str,
    interval: Duration,
    count: Option<u64>,
) -> Result<()> {
    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(Arc::clone(&running));

    tracing::info!(
        dataset,
        interval_ms = interval.as_millis() as u64,
        collector = %buffer.config().collector_addr(),
        "Sampling host statistics"
    );

    let mut sampler = HostSampler::new();
    let mut taken = 0u64;
    while running.load(Ordering::SeqCst) && count.map_or(true, |n| taken < n) {
        let sample = sampler.sample();
        if !buffer.try_add_sample(dataset, sample) {
            tracing::debug!("sample dropped");
        }
        taken += 1;
        std::thread::sleep(interval);
    }

    tracing::info!(samples = taken, "Sampling stopped");
    Ok(())
}

/// Parse `key=value`.
fn parse_field(arg: &str) -> Result<(String, FieldValue)> {
    let Some((key, value)) = arg.split_once('=') else {
        bail!("Invalid field '{}': expected key=value", arg);
    };
    if key.is_empty() {
        bail!("Invalid field '{}': empty key", arg);
    }
    Ok((key.to_string(), parse_value(value)))
}

/// Integer, then finite float, then `[a,b,c]` label set, else string.
fn parse_value(raw: &str) -> FieldValue {
    if let Ok(n) = raw.parse::<i64>() {
        return FieldValue::Integer(n);
    }
    if let Ok(f) = raw.parse::<f64>() {
        if f.is_finite() {
            return FieldValue::Float(f);
        }
    }
    if let Some(inner) = raw.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
        let labels = inner
            .split(',')
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>();
        return FieldValue::LabelSet(labels);
    }
    FieldValue::String(raw.to_string())
}

/// Setup Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) {
    let _ = ctrlc::set_handler(move || {
        tracing::info!("Received Ctrl+C, shutting down...");
        running.store(false, Ordering::SeqCst);
    });
}
