use crate::{CollectError, Result};
use std::path::{Path, PathBuf};
use sysinfo::Disks;

/// Reads usage of the filesystem that holds `path` (`/` by default).
pub struct DiskReader {
    disks: Disks,
    path: PathBuf,
}

impl DiskReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            disks: Disks::new_with_refreshed_list(),
            path: path.into(),
        }
    }

    pub fn read(&mut self) -> Result<f64> {
        self.disks.refresh();

        let mounts = self
            .disks
            .iter()
            .map(|d| (d.mount_point(), d.total_space(), d.available_space()));
        let (_, total, available) = best_mount(&self.path, mounts)
            .ok_or_else(|| CollectError::MountNotFound(self.path.display().to_string()))?;

        if total == 0 {
            return Err(CollectError::Unavailable {
                metric: "disk",
                reason: format!("filesystem for '{}' reports zero size", self.path.display()),
            });
        }
        let used = total.saturating_sub(available);
        Ok(used as f64 / total as f64 * 100.0)
    }
}

/// Picks the mount with the longest mount point that contains `path`.
fn best_mount<'a>(
    path: &Path,
    mounts: impl Iterator<Item = (&'a Path, u64, u64)>,
) -> Option<(&'a Path, u64, u64)> {
    mounts
        .filter(|(mount, _, _)| path.starts_with(mount))
        .max_by_key(|(mount, _, _)| mount.as_os_str().len())
}
