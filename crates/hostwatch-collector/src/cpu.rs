use crate::{CollectError, Result};
use sysinfo::System;

pub struct CpuReader {
    system: System,
}

impl CpuReader {
    pub fn new() -> Self {
        let mut system = System::new();
        // Usage is computed between two refreshes; prime the first one.
        system.refresh_cpu_all();
        Self { system }
    }

    /// Global CPU usage in percent since the previous call.
    pub fn read(&mut self) -> Result<f64> {
        self.system.refresh_cpu_all();
        if self.system.cpus().is_empty() {
            return Err(CollectError::Unavailable {
                metric: "cpu",
                reason: "no CPUs reported".to_string(),
            });
        }
        let usage = self.system.global_cpu_usage() as f64;
        if !usage.is_finite() {
            return Err(CollectError::Unavailable {
                metric: "cpu",
                reason: format!("non-finite usage {usage}"),
            });
        }
        Ok(usage)
    }
}

impl Default for CpuReader {
    fn default() -> Self {
        Self::new()
    }
}
