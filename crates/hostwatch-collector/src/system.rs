use crate::cpu::CpuReader;
use crate::disk::DiskReader;
use crate::memory::MemoryReader;
use crate::network::NetworkReader;
use crate::{MetricSource, NetCounters, RawSample, Result};
use std::path::PathBuf;

/// [`MetricSource`] backed by `sysinfo`, reading the local host.
pub struct SystemSource {
    cpu: CpuReader,
    memory: MemoryReader,
    disk: DiskReader,
    network: NetworkReader,
}

impl SystemSource {
    /// `disk_path` selects the filesystem whose usage is reported.
    pub fn new(disk_path: impl Into<PathBuf>) -> Self {
        Self {
            cpu: CpuReader::new(),
            memory: MemoryReader::new(),
            disk: DiskReader::new(disk_path),
            network: NetworkReader::new(),
        }
    }
}

impl MetricSource for SystemSource {
    fn name(&self) -> &str {
        "sysinfo"
    }

    fn sample(&mut self) -> RawSample {
        RawSample {
            cpu: self.cpu.read(),
            mem: self.memory.read(),
            disk: self.disk.read(),
            net: self.network.read(),
        }
    }

    fn net_counters(&mut self) -> Result<NetCounters> {
        self.network.read()
    }
}

/// Name of the local host, or `"unknown"` when the platform does not report one.
pub fn host_name() -> String {
    sysinfo::System::host_name().unwrap_or_else(|| "unknown".to_string())
}
