//! Host-wide readers
//!
//! The last tier of every chain. On Linux the host figures come from procfs
//! and `sysconf`; on macOS from `sysconf`, `getloadavg` and the Mach VM
//! statistics. gVisor virtualizes `/proc/meminfo` to the sandbox limit, so
//! the procfs path stays meaningful there.

use super::{CpuSource, HostProbe, MemorySource, SourceKind};
use crate::models::{CpuLimit, HostMemory, Limit, MemoryLimit};
use std::sync::Arc;

/// Parse `/proc/meminfo` contents
///
/// Used memory is `MemTotal - MemFree - Buffers - Cached`. Missing keys count
/// as zero, except `MemTotal`, without which there is nothing to report.
pub fn parse_meminfo(content: &str) -> Option<HostMemory> {
    let mut total_kb = 0u64;
    let mut free_kb = 0u64;
    let mut buffers_kb = 0u64;
    let mut cached_kb = 0u64;

    for line in content.lines() {
        let Some((key, rest)) = line.split_once(':') else {
            continue;
        };
        let value = rest
            .split_whitespace()
            .next()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);

        match key.trim() {
            "MemTotal" => total_kb = value,
            "MemFree" => free_kb = value,
            "Buffers" => buffers_kb = value,
            "Cached" => cached_kb = value,
            _ => {}
        }
    }

    if total_kb == 0 {
        return None;
    }

    let used_kb = total_kb
        .saturating_sub(free_kb)
        .saturating_sub(buffers_kb)
        .saturating_sub(cached_kb);

    Some(HostMemory {
        total_bytes: total_kb.saturating_mul(1024),
        used_bytes: used_kb.saturating_mul(1024),
    })
}

/// Parse `/proc/loadavg` contents, returning the 1-minute average
pub fn parse_loadavg(content: &str) -> Option<f64> {
    // format: "0.52 0.58 0.59 1/512 12345"
    let one_min: f64 = content.split_whitespace().next()?.parse().ok()?;
    (one_min.is_finite() && one_min >= 0.0).then_some(one_min)
}

/// Memory figures from VM page counters
///
/// used = (active + inactive + wired) * page size, total = used + free pages.
pub fn vm_memory(
    page_size: u64,
    free: u64,
    active: u64,
    inactive: u64,
    wired: u64,
) -> Option<HostMemory> {
    let used_bytes = active
        .saturating_add(inactive)
        .saturating_add(wired)
        .saturating_mul(page_size);
    let total_bytes = used_bytes.saturating_add(free.saturating_mul(page_size));

    (total_bytes > 0).then_some(HostMemory {
        total_bytes,
        used_bytes,
    })
}

/// Host logical core count as the final CPU tier
pub struct HostCpuCount {
    host: Arc<dyn HostProbe>,
}

impl HostCpuCount {
    pub fn new(host: Arc<dyn HostProbe>) -> Self {
        Self { host }
    }
}

impl CpuSource for HostCpuCount {
    fn name(&self) -> &'static str {
        "host"
    }

    fn cpu_limit(&self) -> Option<CpuLimit> {
        self.host
            .logical_cpus()
            .filter(|cpus| *cpus > 0)
            .map(|cpus| Limit::Bounded(f64::from(cpus)))
    }
}

/// Host memory totals as the final memory tier
pub struct HostMemorySource {
    host: Arc<dyn HostProbe>,
}

impl HostMemorySource {
    pub fn new(host: Arc<dyn HostProbe>) -> Self {
        Self { host }
    }
}

impl MemorySource for HostMemorySource {
    fn name(&self) -> &'static str {
        "host"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Host
    }

    fn memory_limit(&self) -> Option<MemoryLimit> {
        self.host
            .memory()
            .map(|m| m.total_bytes)
            .filter(|total| *total > 0)
            .map(Limit::Bounded)
    }

    fn memory_used(&self) -> Option<u64> {
        self.host.memory().map(|m| m.used_bytes)
    }
}

#[cfg(any(target_os = "linux", target_os = "macos"))]
fn sysconf_positive(name: libc::c_int) -> Option<u64> {
    // SAFETY: sysconf takes no pointers and has no preconditions
    let value = unsafe { libc::sysconf(name) };
    (value > 0).then_some(value as u64)
}

#[cfg(target_os = "linux")]
mod linux {
    use super::{parse_loadavg, parse_meminfo, sysconf_positive};
    use crate::models::HostMemory;
    use crate::source::{read_bounded, HostProbe, TEXT_READ_LIMIT, VALUE_READ_LIMIT};
    use std::path::PathBuf;

    /// Host queries backed by procfs and sysconf
    pub struct LinuxHost {
        proc_root: PathBuf,
    }

    impl LinuxHost {
        pub fn new(proc_root: impl Into<PathBuf>) -> Self {
            Self {
                proc_root: proc_root.into(),
            }
        }
    }

    impl HostProbe for LinuxHost {
        fn logical_cpus(&self) -> Option<u32> {
            sysconf_positive(libc::_SC_NPROCESSORS_ONLN).and_then(|n| u32::try_from(n).ok())
        }

        fn load_average(&self) -> Option<f64> {
            let content = read_bounded(&self.proc_root.join("loadavg"), VALUE_READ_LIMIT)?;
            parse_loadavg(&content)
        }

        fn memory(&self) -> Option<HostMemory> {
            let content = read_bounded(&self.proc_root.join("meminfo"), TEXT_READ_LIMIT)?;
            parse_meminfo(&content)
        }
    }
}

#[cfg(target_os = "linux")]
pub use linux::LinuxHost;

#[cfg(target_os = "macos")]
mod mach {
    use super::{sysconf_positive, vm_memory};
    use crate::models::HostMemory;
    use crate::source::HostProbe;
    use std::mem;

    /// Host queries backed by sysconf, getloadavg and Mach VM statistics
    #[derive(Default)]
    pub struct MachHost;

    impl MachHost {
        pub fn new() -> Self {
            Self
        }

        #[allow(deprecated)]
        fn vm_statistics() -> Option<libc::vm_statistics64> {
            // SAFETY: vm_statistics64 is plain old data
            let mut stats: libc::vm_statistics64 = unsafe { mem::zeroed() };
            let mut count = (mem::size_of::<libc::vm_statistics64>()
                / mem::size_of::<libc::c_int>())
                as libc::mach_msg_type_number_t;

            // SAFETY: stats and count outlive the call and count matches the
            // buffer size in natural_t units
            let ret = unsafe {
                libc::host_statistics64(
                    libc::mach_host_self(),
                    libc::HOST_VM_INFO64,
                    &mut stats as *mut libc::vm_statistics64 as libc::host_info64_t,
                    &mut count,
                )
            };

            (ret == libc::KERN_SUCCESS).then_some(stats)
        }
    }

    impl HostProbe for MachHost {
        fn logical_cpus(&self) -> Option<u32> {
            sysconf_positive(libc::_SC_NPROCESSORS_ONLN).and_then(|n| u32::try_from(n).ok())
        }

        fn load_average(&self) -> Option<f64> {
            let mut loads = [0f64; 1];
            // SAFETY: the buffer holds exactly the one sample requested
            let samples = unsafe { libc::getloadavg(loads.as_mut_ptr(), 1) };
            (samples >= 1).then_some(loads[0])
        }

        fn memory(&self) -> Option<HostMemory> {
            let page_size = sysconf_positive(libc::_SC_PAGESIZE)?;
            let stats = Self::vm_statistics()?;
            vm_memory(
                page_size,
                u64::from(stats.free_count),
                u64::from(stats.active_count),
                u64::from(stats.inactive_count),
                u64::from(stats.wire_count),
            )
        }
    }
}

#[cfg(target_os = "macos")]
pub use mach::MachHost;
