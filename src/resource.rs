//! Process resource sampling against simulated constrained-device ceilings.
//!
//! The monitor reads current process memory and CPU utilization through a
//! shared `sysinfo::System`. Sampling must never be the reason a crypto call
//! fails: any failed OS query yields a sample with `None` markers instead of
//! an error. Limit checks are pure comparisons; violations are advisory and
//! never abort the measured operation.

#![forbid(unsafe_code)]

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sysinfo::{ProcessesToUpdate, System};

use crate::backend::PqcError;
use crate::config::ResourceLimits;

/// One resource observation. Immutable after capture.
///
/// `None` means the underlying OS query was unavailable; unknown readings
/// cannot violate a limit.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ResourceSample {
    pub memory_mb: Option<f64>,
    pub cpu_percent: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

/// Outcome of comparing a sample against the configured ceilings.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ComplianceResult {
    pub within_memory: bool,
    pub within_cpu: bool,
}

impl ComplianceResult {
    pub fn is_compliant(&self) -> bool {
        self.within_memory && self.within_cpu
    }

    /// Advisory error for a non-compliant sample, for logging and the usage
    /// record. Never returned to the caller of a crypto operation.
    pub fn advisory(&self, sample: &ResourceSample, limits: &ResourceLimits) -> Option<PqcError> {
        if self.is_compliant() {
            return None;
        }
        let mut parts = Vec::new();
        if !self.within_memory {
            if let Some(mem) = sample.memory_mb {
                parts.push(format!("memory {:.2}MB > {}MB", mem, limits.max_memory_mb));
            }
        }
        if !self.within_cpu {
            if let Some(cpu) = sample.cpu_percent {
                parts.push(format!("cpu {:.2}% > {}%", cpu, limits.max_cpu_percent));
            }
        }
        Some(PqcError::ResourceLimitExceeded(parts.join(", ")))
    }
}

/// Host facts reported alongside metrics, mirroring what the demo surfaces.
#[derive(Clone, Debug, Serialize)]
pub struct SystemInfo {
    pub os: Option<String>,
    pub cpu_count: usize,
    pub total_memory_gb: f64,
}

/// Samples process memory (MB) and global CPU utilization (%).
///
/// Holds no operation state; the interior mutex only guards sysinfo's refresh
/// bookkeeping, so one monitor is safe to share across concurrent operations.
pub struct ResourceMonitor {
    system: Mutex<System>,
}

impl ResourceMonitor {
    pub fn new() -> Self {
        let mut system = System::new_all();
        system.refresh_all();
        Self { system: Mutex::new(system) }
    }

    /// Read current usage. Infallible by contract: a failed query produces
    /// `None` markers, never an error.
    ///
    /// CPU is the utilization since the previous refresh: the monitor never
    /// sleeps between readings (a blocking interval would distort the very
    /// timings being measured), so the first sample in a process may read 0%.
    pub fn snapshot(&self) -> ResourceSample {
        let timestamp = Utc::now();
        let mut memory_mb = None;
        let mut cpu_percent = None;

        if let Ok(mut system) = self.system.lock() {
            system.refresh_cpu_all();
            cpu_percent = Some(round2(system.global_cpu_usage() as f64));

            if let Ok(pid) = sysinfo::get_current_pid() {
                system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
                if let Some(process) = system.process(pid) {
                    memory_mb = Some(round2(process.memory() as f64 / (1024.0 * 1024.0)));
                }
            }
        }

        ResourceSample { memory_mb, cpu_percent, timestamp }
    }

    /// Pure comparison of a sample against the ceilings. No I/O.
    pub fn check(&self, sample: &ResourceSample, limits: &ResourceLimits) -> ComplianceResult {
        ComplianceResult {
            within_memory: sample.memory_mb.map_or(true, |m| m <= limits.max_memory_mb),
            within_cpu: sample.cpu_percent.map_or(true, |c| c <= limits.max_cpu_percent),
        }
    }

    pub fn system_info(&self) -> SystemInfo {
        match self.system.lock() {
            Ok(mut system) => {
                system.refresh_memory();
                SystemInfo {
                    os: System::name(),
                    cpu_count: system.cpus().len(),
                    total_memory_gb: round2(system.total_memory() as f64 / (1024.0 * 1024.0 * 1024.0)),
                }
            }
            Err(_) => SystemInfo { os: None, cpu_count: 0, total_memory_gb: 0.0 },
        }
    }
}

impl Default for ResourceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
