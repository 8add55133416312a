//! Disk usage sampling
//!
//! Sampling is a two-step strategy. The enhanced facility looks the path up in the
//! mounted disks known to `sysinfo` and reports usage the way `df` does, excluding
//! blocks reserved for root from the percentage. When it cannot place the path on
//! one of those disks it reports [`Probe::Unavailable`] and the sampler falls
//! through to the baseline `statvfs` query provided by `fs2`. Only a failure of the
//! baseline query is an error.

use std::cell::OnceCell;
use std::path::{Path, PathBuf};

use sysinfo::Disks;
use tracing::{debug, instrument, trace};

use crate::UsageSample;
use crate::util::percent_of;

#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    #[error("cannot read disk usage of {}: {source}", path.display())]
    PathUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Outcome of the enhanced facility.
#[derive(Debug, Clone, PartialEq)]
pub enum Probe {
    Measured(UsageSample),
    Unavailable(String),
}

/// Source of usage samples for a path.
pub trait UsageSampler {
    fn sample(&self, path: &str) -> Result<UsageSample, SampleError>;
}

/// Resolves the enhanced probe, falling through to `baseline` when it was unavailable.
pub fn resolve<F>(path: &Path, probe: Probe, baseline: F) -> Result<UsageSample, SampleError>
where
    F: FnOnce(&Path) -> std::io::Result<UsageSample>,
{
    match probe {
        Probe::Measured(sample) => Ok(sample),
        Probe::Unavailable(reason) => {
            debug!(
                "{}: enhanced probe unavailable ({reason}), using statvfs",
                path.display()
            );
            baseline(path).map_err(|source| SampleError::PathUnreadable {
                path: path.to_path_buf(),
                source,
            })
        }
    }
}

/// Samples paths against the disks mounted on this machine. The mount table is
/// read once, on the first probe.
pub struct SystemSampler {
    disks: OnceCell<Disks>,
}

impl SystemSampler {
    pub fn new() -> Self {
        Self {
            disks: OnceCell::new(),
        }
    }

    /// Looks `path` up among the mounted disks. The deepest mount point containing
    /// the path is only accepted when it is the filesystem the path lives on, since
    /// `sysinfo` does not list pseudo filesystems such as tmpfs or cgroup mounts.
    pub fn probe(&self, path: &Path) -> Probe {
        let canonical = match path.canonicalize() {
            Ok(canonical) => canonical,
            Err(e) => return Probe::Unavailable(e.to_string()),
        };

        let disk = self
            .disks
            .get_or_init(Disks::new_with_refreshed_list)
            .list()
            .iter()
            .filter(|disk| canonical.starts_with(disk.mount_point()))
            .max_by_key(|disk| disk.mount_point().components().count());

        let Some(disk) = disk else {
            return Probe::Unavailable(format!("no mounted disk contains {}", canonical.display()));
        };
        let mount_point = disk.mount_point();

        match same_filesystem(&canonical, mount_point) {
            Ok(true) => {}
            Ok(false) => {
                return Probe::Unavailable(format!(
                    "{} is not on the disk mounted at {}",
                    canonical.display(),
                    mount_point.display()
                ));
            }
            Err(e) => return Probe::Unavailable(e.to_string()),
        }

        let total = disk.total_space();
        if total == 0 {
            return Probe::Unavailable(format!("{} reports no capacity", mount_point.display()));
        }
        // sysinfo only reports the space available to unprivileged users, the
        // space in use is counted against the filesystem's own free blocks
        let unreserved = match fs2::free_space(&canonical) {
            Ok(unreserved) => unreserved,
            Err(e) => return Probe::Unavailable(e.to_string()),
        };
        let free = disk.available_space();
        let used = total.saturating_sub(unreserved);

        trace!(
            "{}: resolved to mount point {}",
            path.display(),
            mount_point.display()
        );

        Probe::Measured(UsageSample {
            total,
            used,
            free,
            percent: percent_of(used, used.saturating_add(free), 1),
        })
    }
}

#[cfg(unix)]
fn same_filesystem(path: &Path, mount_point: &Path) -> std::io::Result<bool> {
    use std::os::unix::fs::MetadataExt;

    Ok(std::fs::metadata(path)?.dev() == std::fs::metadata(mount_point)?.dev())
}

#[cfg(not(unix))]
fn same_filesystem(_path: &Path, _mount_point: &Path) -> std::io::Result<bool> {
    Ok(true)
}

impl Default for SystemSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl UsageSampler for SystemSampler {
    #[instrument(skip(self))]
    fn sample(&self, path: &str) -> Result<UsageSample, SampleError> {
        let path = Path::new(path);
        resolve(path, self.probe(path), statvfs_usage)
    }
}

/// Baseline query: total capacity, space available to unprivileged users, and the
/// space consumed as seen by the filesystem.
pub fn statvfs_usage(path: &Path) -> std::io::Result<UsageSample> {
    let total = fs2::total_space(path)?;
    let free = fs2::available_space(path)?;
    let used = total.saturating_sub(fs2::free_space(path)?);
    Ok(UsageSample::from_capacity(total, used, free))
}
