//! Source readers for CPU and memory limits
//!
//! Each reader attempts exactly one data source and returns `None` when that
//! source is missing, unreadable or malformed. Readers for the unified
//! (cgroup v2) and legacy (cgroup v1) hierarchies, procfs and native host
//! queries live in the submodules; the resolver chains them in priority order.

mod cgroup_v1;
mod cgroup_v2;
mod env;
mod host;

pub use cgroup_v1::{
    detect_cgroup_version, CgroupV1Cpu, CgroupV1Memory, CPU_CONTROLLER_VARIANTS,
    MEMORY_CONTROLLER_VARIANTS,
};
pub use cgroup_v2::{CgroupV2Cpu, CgroupV2Memory};
pub use env::EnvOverride;
pub use host::{parse_loadavg, parse_meminfo, vm_memory, HostCpuCount, HostMemorySource};

#[cfg(target_os = "linux")]
pub use host::LinuxHost;
#[cfg(target_os = "macos")]
pub use host::MachHost;

use crate::models::{CpuLimit, CpuQuota, HostMemory, Limit, MemoryLimit};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::trace;

/// Upper bound for single-value cgroup files (`cpu.max`, `memory.max`, ...)
pub(crate) const VALUE_READ_LIMIT: u64 = 64;

/// Upper bound for multi-line text sources (`/proc/meminfo`, `cpu.stat`)
pub(crate) const TEXT_READ_LIMIT: u64 = 16 * 1024;

/// A single tier of the CPU limit chain
pub trait CpuSource: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Limit in cores, `None` when this source has nothing to say
    fn cpu_limit(&self) -> Option<CpuLimit>;

    /// Raw CFS quota, for sources backed by a cgroup
    fn cpu_quota(&self) -> Option<Limit<CpuQuota>> {
        None
    }

    /// Cumulative CPU time consumed, in microseconds
    fn cpu_usage_micros(&self) -> Option<u64> {
        None
    }
}

/// Whether a memory source describes a cgroup or the whole host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Cgroup,
    Host,
}

/// A single tier of the memory chain
///
/// A source reports its limit and the usage from the same hierarchy, so the
/// resolver can pair them.
pub trait MemorySource: Send + Sync {
    fn name(&self) -> &'static str;

    fn kind(&self) -> SourceKind;

    fn memory_limit(&self) -> Option<MemoryLimit>;

    fn memory_used(&self) -> Option<u64>;
}

/// Native host queries (core count, load average, VM statistics)
pub trait HostProbe: Send + Sync {
    fn logical_cpus(&self) -> Option<u32>;

    /// 1-minute load average
    fn load_average(&self) -> Option<f64>;

    fn memory(&self) -> Option<HostMemory>;
}

/// Read at most `limit` bytes from `path`
///
/// Missing files, read errors and empty content all come back as `None`.
pub(crate) fn read_bounded(path: &Path, limit: u64) -> Option<String> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            trace!(path = %path.display(), error = %e, "Source not readable");
            return None;
        }
    };

    let mut content = String::new();
    if let Err(e) = file.take(limit).read_to_string(&mut content) {
        trace!(path = %path.display(), error = %e, "Source read failed");
        return None;
    }

    if content.trim().is_empty() {
        trace!(path = %path.display(), "Source is empty");
        return None;
    }

    Some(content)
}

/// Read a single signed integer value file
pub(crate) fn read_i64(path: &Path) -> Option<i64> {
    read_bounded(path, VALUE_READ_LIMIT)?.trim().parse().ok()
}

/// Read a single unsigned integer value file
pub(crate) fn read_u64(path: &Path) -> Option<u64> {
    read_bounded(path, VALUE_READ_LIMIT)?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_bounded_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        assert!(read_bounded(&temp_dir.path().join("absent"), VALUE_READ_LIMIT).is_none());
    }

    #[test]
    fn test_read_bounded_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("memory.max");
        std::fs::write(&path, "").unwrap();
        assert!(read_bounded(&path, VALUE_READ_LIMIT).is_none());
    }

    #[test]
    fn test_read_bounded_truncates() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("big");
        std::fs::write(&path, "7".repeat(1000)).unwrap();

        let content = read_bounded(&path, VALUE_READ_LIMIT).unwrap();
        assert_eq!(content.len(), VALUE_READ_LIMIT as usize);
    }

    #[test]
    fn test_read_u64_rejects_garbage() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("memory.current");
        std::fs::write(&path, "lots\n").unwrap();
        assert!(read_u64(&path).is_none());

        std::fs::write(&path, "4096\n").unwrap();
        assert_eq!(read_u64(&path), Some(4096));
    }
}
