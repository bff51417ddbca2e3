// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Host statistics for the `fleet_basic_stats` dataset.
//!
//! Load average, process count and memory totals come from `sysinfo`. The
//! per-state CPU breakdown and the buffers/cached/shared/active/inactive
//! memory figures are Linux procfs details `sysinfo` does not expose; they
//! are read from `/proc` when present and reported as zero otherwise.

use sampled::{host, Sample};
use std::fs;
use std::path::PathBuf;
use sysinfo::{ProcessesToUpdate, System};

/// Cumulative CPU jiffies from the aggregate `cpu` line of `/proc/stat`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTimes {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

impl CpuTimes {
    fn total(&self) -> u64 {
        self.user
            + self.nice
            + self.system
            + self.idle
            + self.iowait
            + self.irq
            + self.softirq
            + self.steal
    }
}

/// CPU time share per state, in percent of the elapsed interval.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CpuPercent {
    pub user: f64,
    pub nice: f64,
    pub system: f64,
    pub idle: f64,
    pub iowait: f64,
    pub irq: f64,
    pub softirq: f64,
}

impl CpuPercent {
    /// Percentages between two readings. All zero if no time passed.
    pub fn between(prev: &CpuTimes, now: &CpuTimes) -> Self {
        let total = now.total().saturating_sub(prev.total());
        if total == 0 {
            return Self::default();
        }
        let pct = |a: u64, b: u64| a.saturating_sub(b) as f64 * 100.0 / total as f64;
        Self {
            user: pct(now.user, prev.user),
            nice: pct(now.nice, prev.nice),
            system: pct(now.system, prev.system),
            idle: pct(now.idle, prev.idle),
            iowait: pct(now.iowait, prev.iowait),
            irq: pct(now.irq, prev.irq),
            softirq: pct(now.softirq, prev.softirq),
        }
    }

    /// Split an overall busy percentage into user and idle time.
    pub fn from_usage(usage: f32) -> Self {
        let usage = f64::from(usage);
        let busy = if usage.is_finite() {
            usage.clamp(0.0, 100.0)
        } else {
            0.0
        };
        Self {
            user: busy,
            idle: 100.0 - busy,
            ..Self::default()
        }
    }
}

/// Memory figures in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemInfo {
    pub total: u64,
    pub free: u64,
    pub available: u64,
    pub used: u64,
    pub buffers: u64,
    pub cached: u64,
    pub shared: u64,
    pub active: u64,
    pub inactive: u64,
}

/// Parse the aggregate `cpu` line of `/proc/stat`.
pub fn parse_cpu_times(stat: &str) -> Option<CpuTimes> {
    let line = stat.lines().find(|l| l.starts_with("cpu "))?;
    let mut fields = line
        .split_whitespace()
        .skip(1)
        .map(|f| f.parse::<u64>().unwrap_or(0));
    let mut next = || fields.next().unwrap_or(0);

    Some(CpuTimes {
        user: next(),
        nice: next(),
        system: next(),
        idle: next(),
        iowait: next(),
        irq: next(),
        softirq: next(),
        steal: next(),
    })
}

/// Fill the procfs-only memory figures from `/proc/meminfo` (kB values).
pub fn apply_meminfo(meminfo: &str, info: &mut MemInfo) {
    for line in meminfo.lines() {
        let Some((key, rest)) = line.split_once(':') else {
            continue;
        };
        let bytes = rest
            .split_whitespace()
            .next()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0)
            .saturating_mul(1024);
        match key {
            "Buffers" => info.buffers = bytes,
            "Cached" => info.cached = bytes,
            "Shmem" => info.shared = bytes,
            "Active" => info.active = bytes,
            "Inactive" => info.inactive = bytes,
            _ => {}
        }
    }
}

/// Reads host statistics; keeps state between calls for CPU percentages.
pub struct HostSampler {
    system: System,
    proc_root: PathBuf,
    last_cpu: Option<CpuTimes>,
}

impl HostSampler {
    pub fn new() -> Self {
        Self::with_proc_root("/proc")
    }

    pub fn with_proc_root(proc_root: impl Into<PathBuf>) -> Self {
        Self {
            system: System::new(),
            proc_root: proc_root.into(),
            last_cpu: None,
        }
    }

    /// CPU percentages since the last call.
    ///
    /// Uses the procfs breakdown when available (the first call reports
    /// averages since boot), otherwise the overall usage from `sysinfo`.
    pub fn cpu_percent(&mut self) -> CpuPercent {
        let stat = fs::read_to_string(self.proc_root.join("stat")).ok();
        match stat.as_deref().and_then(parse_cpu_times) {
            Some(now) => {
                let prev = self.last_cpu.replace(now).unwrap_or_default();
                CpuPercent::between(&prev, &now)
            }
            None => {
                self.system.refresh_cpu_usage();
                CpuPercent::from_usage(self.system.global_cpu_usage())
            }
        }
    }

    pub fn memory(&mut self) -> MemInfo {
        self.system.refresh_memory();
        let mut info = MemInfo {
            total: self.system.total_memory(),
            free: self.system.free_memory(),
            available: self.system.available_memory(),
            used: self.system.used_memory(),
            ..MemInfo::default()
        };
        if let Ok(meminfo) = fs::read_to_string(self.proc_root.join("meminfo")) {
            apply_meminfo(&meminfo, &mut info);
        }
        info
    }

    pub fn process_count(&mut self) -> usize {
        self.system.refresh_processes(ProcessesToUpdate::All, true);
        self.system.processes().len()
    }

    /// Take one `fleet_basic_stats` sample.
    pub fn sample(&mut self) -> Sample {
        let cpu = self.cpu_percent();
        let mem = self.memory();
        let procs = self.process_count();
        let load = System::load_average();

        Sample::new()
            .with("hostname", host::hostname())
            .with("kernel", host::kernel_version())
            .with("sys_name", host::os_name())
            .with("procs_running", procs)
            .with("load_avg_1", load.one)
            .with("load_avg_5", load.five)
            .with("load_avg_15", load.fifteen)
            .with("cpu_idle", cpu.idle)
            .with("cpu_iowait", cpu.iowait)
            .with("cpu_irq", cpu.irq)
            .with("cpu_nice", cpu.nice)
            .with("cpu_softirq", cpu.softirq)
            .with("cpu_system", cpu.system)
            .with("cpu_user", cpu.user)
            .with("mem_active", mem.active)
            .with("mem_available", mem.available)
            .with("mem_buffers", mem.buffers)
            .with("mem_cached", mem.cached)
            .with("mem_free", mem.free)
            .with("mem_inactive", mem.inactive)
            .with("mem_shared", mem.shared)
            .with("mem_total", mem.total)
            .with("mem_used", mem.used)
    }
}

impl Default for HostSampler {
    fn default() -> Self {
        Self::new()
    }
}
