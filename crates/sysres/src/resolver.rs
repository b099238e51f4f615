//! Ordered fallback resolution of CPU and memory limits
//!
//! The resolver owns two chains of sources, most specific first. The first
//! source reporting a bounded positive value wins. A source reporting "no
//! limit" does not stop the walk, since a coarser tier (ultimately the host)
//! still describes a real ceiling. Nothing is cached between calls.

use crate::config::SysresConfig;
use crate::error::{Result, SysresError};
use crate::models::{CgroupVersion, CpuLimit, CpuQuota, Limit, MemoryLimit};
use crate::source::{
    detect_cgroup_version, CgroupV1Cpu, CgroupV1Memory, CgroupV2Cpu, CgroupV2Memory, CpuSource,
    EnvOverride, HostCpuCount, HostMemorySource, HostProbe, MemorySource, SourceKind,
};
use std::fmt::Debug;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, trace};

/// Result of walking one chain
#[derive(Debug, Clone, Copy, PartialEq)]
enum Outcome<T> {
    /// Value of the first bounded source
    Bounded(T),
    /// No bounded source, but at least one reported "no limit"
    Unbounded,
    /// No source responded at all
    Absent,
}

impl<T> Outcome<T> {
    fn into_limit(self, what: &'static str) -> Result<Limit<T>> {
        match self {
            Outcome::Bounded(value) => Ok(Limit::Bounded(value)),
            Outcome::Unbounded => Ok(Limit::Unbounded),
            Outcome::Absent => Err(SysresError::Unavailable(what)),
        }
    }
}

fn walk<S: ?Sized, T: Copy + Debug>(
    what: &'static str,
    sources: &[Box<S>],
    name: impl Fn(&S) -> &'static str,
    read: impl Fn(&S) -> Option<Limit<T>>,
) -> Outcome<T> {
    let mut saw_unbounded = false;

    for source in sources {
        let source = &**source;
        match read(source) {
            Some(Limit::Bounded(value)) => {
                debug!(what, tier = name(source), value = ?value, "Resolved limit");
                return Outcome::Bounded(value);
            }
            Some(Limit::Unbounded) => {
                trace!(what, tier = name(source), "No limit at this tier");
                saw_unbounded = true;
            }
            None => {
                trace!(what, tier = name(source), "Source absent");
            }
        }
    }

    if saw_unbounded {
        Outcome::Unbounded
    } else {
        Outcome::Absent
    }
}

fn usable_cores(limit: &CpuLimit) -> bool {
    match limit {
        Limit::Bounded(cores) => cores.is_finite() && *cores > 0.0,
        Limit::Unbounded => true,
    }
}

fn usable_bytes(limit: &MemoryLimit) -> bool {
    match limit {
        Limit::Bounded(bytes) => *bytes > 0,
        Limit::Unbounded => true,
    }
}

/// CPU and memory resolver over ordered source chains
pub struct Resolver {
    platform: &'static str,
    cgroup_root: Option<PathBuf>,
    cpu_sources: Vec<Box<dyn CpuSource>>,
    memory_sources: Vec<Box<dyn MemorySource>>,
    host: Arc<dyn HostProbe>,
}

impl Resolver {
    /// Create a resolver with empty chains
    ///
    /// `host` still backs the load average and the ratio denominator
    /// fallback; add it to the chains explicitly with [`HostCpuCount`] and
    /// [`HostMemorySource`].
    pub fn new(platform: &'static str, host: Arc<dyn HostProbe>) -> Self {
        Self {
            platform,
            cgroup_root: None,
            cpu_sources: Vec::new(),
            memory_sources: Vec::new(),
            host,
        }
    }

    /// Append a CPU tier (lowest priority so far)
    pub fn with_cpu_source(mut self, source: impl CpuSource + 'static) -> Self {
        self.cpu_sources.push(Box::new(source));
        self
    }

    /// Append a memory tier (lowest priority so far)
    pub fn with_memory_source(mut self, source: impl MemorySource + 'static) -> Self {
        self.memory_sources.push(Box::new(source));
        self
    }

    /// Record the cgroup mount used for version detection
    pub fn with_cgroup_root(mut self, cgroup_root: impl Into<PathBuf>) -> Self {
        self.cgroup_root = Some(cgroup_root.into());
        self
    }

    /// The cgroup-aware reader set:
    /// env override, cgroup v2, cgroup v1 variants, then host.
    pub fn cgroup_aware(
        platform: &'static str,
        config: &SysresConfig,
        host: Arc<dyn HostProbe>,
    ) -> Self {
        let root = &config.cgroup_root;
        Self::new(platform, host.clone())
            .with_cgroup_root(root)
            .with_cpu_source(EnvOverride::new(&config.cpu_override_var))
            .with_cpu_source(CgroupV2Cpu::new(root))
            .with_cpu_source(CgroupV1Cpu::new(root))
            .with_cpu_source(HostCpuCount::new(host.clone()))
            .with_memory_source(CgroupV2Memory::new(root))
            .with_memory_source(CgroupV1Memory::new(root))
            .with_memory_source(HostMemorySource::new(host))
    }

    /// The host-only reader set for systems without cgroups
    pub fn host_only(
        platform: &'static str,
        config: &SysresConfig,
        host: Arc<dyn HostProbe>,
    ) -> Self {
        Self::new(platform, host.clone())
            .with_cpu_source(EnvOverride::new(&config.cpu_override_var))
            .with_cpu_source(HostCpuCount::new(host.clone()))
            .with_memory_source(HostMemorySource::new(host))
    }

    /// Linux: cgroups plus procfs
    #[cfg(target_os = "linux")]
    pub fn linux(config: &SysresConfig) -> Self {
        let host = Arc::new(crate::source::LinuxHost::new(&config.proc_root));
        Self::cgroup_aware("linux", config, host)
    }

    /// macOS: host values only
    #[cfg(target_os = "macos")]
    pub fn macos(config: &SysresConfig) -> Self {
        Self::host_only("macos", config, Arc::new(crate::source::MachHost::new()))
    }

    pub fn platform(&self) -> &'static str {
        self.platform
    }

    fn cpu_outcome(&self) -> Outcome<f64> {
        walk(
            "cpu_limit",
            &self.cpu_sources,
            |s| s.name(),
            |s| s.cpu_limit().filter(usable_cores),
        )
    }

    fn memory_outcome(&self) -> Outcome<u64> {
        walk(
            "memory_limit",
            &self.memory_sources,
            |s| s.name(),
            |s| s.memory_limit().filter(usable_bytes),
        )
    }

    /// First cgroup tier with a bounded memory limit
    fn container_source(&self) -> Option<&dyn MemorySource> {
        self.memory_sources
            .iter()
            .map(|s| &**s)
            .filter(|s| s.kind() == SourceKind::Cgroup)
            .find(|s| matches!(s.memory_limit(), Some(Limit::Bounded(bytes)) if bytes > 0))
    }

    /// Effective CPU ceiling in cores
    pub fn resolve_cpu_limit(&self) -> Result<CpuLimit> {
        self.cpu_outcome().into_limit("cpu limit")
    }

    /// 1-minute load average per available core
    ///
    /// Falls back to the host core count when the limit is unbounded or
    /// unavailable. `None` when there is no load average or no denominator.
    pub fn resolve_cpu_usage_ratio(&self) -> Option<f64> {
        let Some(load) = self.host.load_average() else {
            trace!("Load average unavailable");
            return None;
        };

        let cores = match self.cpu_outcome() {
            Outcome::Bounded(value) => Some(value),
            Outcome::Unbounded | Outcome::Absent => self
                .host
                .logical_cpus()
                .filter(|cpus| *cpus > 0)
                .map(f64::from),
        }?;

        Some(load / cores)
    }

    /// Effective memory ceiling in bytes
    pub fn resolve_memory_limit(&self) -> Result<MemoryLimit> {
        self.memory_outcome().into_limit("memory limit")
    }

    /// Memory in use, from the container's own accounting when it has a
    /// limit, otherwise from the host
    pub fn resolve_memory_used(&self) -> Result<u64> {
        if let Some(source) = self.container_source() {
            match source.memory_used() {
                Some(used) => {
                    debug!(tier = source.name(), used, "Resolved memory usage");
                    return Ok(used);
                }
                None => trace!(tier = source.name(), "Container usage unreadable"),
            }
        }

        self.memory_sources
            .iter()
            .filter(|s| s.kind() == SourceKind::Host)
            .find_map(|s| s.memory_used())
            .ok_or(SysresError::Unavailable("memory usage"))
    }

    /// used / limit, `None` when the limit is not a positive number
    pub fn resolve_memory_usage_ratio(&self) -> Option<f64> {
        let limit = self.resolve_memory_limit().ok()?.bounded()?;
        let used = self.resolve_memory_used().ok()?;
        Some(used as f64 / limit as f64)
    }

    /// Whether a cgroup memory limit is in force
    pub fn is_container_environment(&self) -> bool {
        self.container_source().is_some()
    }

    /// Raw CFS quota from the first cgroup tier that has one
    pub fn cgroup_cpu_quota(&self) -> Option<Limit<CpuQuota>> {
        self.cpu_sources.iter().find_map(|s| s.cpu_quota())
    }

    /// Cumulative CPU time consumed by the cgroup, in microseconds
    pub fn cpu_usage_micros(&self) -> Option<u64> {
        self.cpu_sources.iter().find_map(|s| s.cpu_usage_micros())
    }

    pub fn cgroup_version(&self) -> CgroupVersion {
        self.cgroup_root
            .as_deref()
            .map(detect_cgroup_version)
            .unwrap_or(CgroupVersion::Unknown)
    }
}
