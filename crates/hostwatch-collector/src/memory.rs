use crate::{CollectError, Result};
use sysinfo::System;

pub struct MemoryReader {
    system: System,
}

impl MemoryReader {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }

    /// Memory in use as a percentage of total, where "in use" means
    /// `total - available` (page cache that can be reclaimed counts as free).
    pub fn read(&mut self) -> Result<f64> {
        self.system.refresh_memory();
        let total = self.system.total_memory();
        let available = self.system.available_memory();
        used_percent(total, available)
    }
}

impl Default for MemoryReader {
    fn default() -> Self {
        Self::new()
    }
}

fn used_percent(total: u64, available: u64) -> Result<f64> {
    if total == 0 {
        return Err(CollectError::Unavailable {
            metric: "mem",
            reason: "total memory reported as zero".to_string(),
        });
    }
    let used = total.saturating_sub(available);
    Ok(used as f64 / total as f64 * 100.0)
}
