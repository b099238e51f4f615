//! Platform selection
//!
//! Every platform is served through the [`ResourceMonitor`] trait. The
//! variant is chosen once from `target_os`: the cgroup-aware resolver on
//! Linux, the host-only resolver on macOS, and [`Unsupported`] everywhere
//! else, which refuses every call instead of guessing.

use crate::config::SysresConfig;
use crate::error::{Result, SysresError};
use crate::models::{CgroupVersion, CpuLimit, CpuQuota, Limit, MemoryLimit, Snapshot};
use crate::resolver::Resolver;
use std::sync::{Arc, OnceLock};

/// Capability set shared by all platform variants
pub trait ResourceMonitor: Send + Sync {
    /// Platform name reported in snapshots
    fn platform(&self) -> &'static str;

    fn cpu_limit_cores(&self) -> Result<CpuLimit>;

    /// Load average per effective core; `None` when unknown
    fn cpu_usage_ratio(&self) -> Result<Option<f64>>;

    fn memory_limit_bytes(&self) -> Result<MemoryLimit>;

    fn memory_used_bytes(&self) -> Result<u64>;

    /// used / limit; `None` when unknown
    fn memory_usage_ratio(&self) -> Result<Option<f64>>;

    fn is_container_environment(&self) -> Result<bool>;

    fn cgroup_version(&self) -> Result<CgroupVersion>;

    /// Raw cgroup CFS quota, without env override or host fallback
    fn cgroup_cpu_quota(&self) -> Result<Option<Limit<CpuQuota>>>;

    /// Cumulative cgroup CPU time in microseconds
    fn cpu_usage_micros(&self) -> Result<Option<u64>>;

    /// Take every reading in one pass
    ///
    /// Readings that are unavailable are left empty; an unsupported
    /// platform fails the whole snapshot.
    fn snapshot(&self) -> Result<Snapshot> {
        Ok(Snapshot {
            platform: self.platform().to_string(),
            sampled_at: chrono::Utc::now().timestamp(),
            cgroup_version: self.cgroup_version()?,
            is_container: self.is_container_environment()?,
            cpu_limit_cores: optional(self.cpu_limit_cores())?,
            cpu_usage_ratio: self.cpu_usage_ratio()?,
            memory_limit_bytes: optional(self.memory_limit_bytes())?,
            memory_used_bytes: optional(self.memory_used_bytes())?,
            memory_usage_ratio: self.memory_usage_ratio()?,
        })
    }
}

/// Turn "unavailable" into `None`, keeping other errors
fn optional<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(SysresError::Unavailable(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

impl ResourceMonitor for Resolver {
    fn platform(&self) -> &'static str {
        Resolver::platform(self)
    }

    fn cpu_limit_cores(&self) -> Result<CpuLimit> {
        self.resolve_cpu_limit()
    }

    fn cpu_usage_ratio(&self) -> Result<Option<f64>> {
        Ok(self.resolve_cpu_usage_ratio())
    }

    fn memory_limit_bytes(&self) -> Result<MemoryLimit> {
        self.resolve_memory_limit()
    }

    fn memory_used_bytes(&self) -> Result<u64> {
        self.resolve_memory_used()
    }

    fn memory_usage_ratio(&self) -> Result<Option<f64>> {
        Ok(self.resolve_memory_usage_ratio())
    }

    fn is_container_environment(&self) -> Result<bool> {
        Ok(Resolver::is_container_environment(self))
    }

    fn cgroup_version(&self) -> Result<CgroupVersion> {
        Ok(Resolver::cgroup_version(self))
    }

    fn cgroup_cpu_quota(&self) -> Result<Option<Limit<CpuQuota>>> {
        Ok(Resolver::cgroup_cpu_quota(self))
    }

    fn cpu_usage_micros(&self) -> Result<Option<u64>> {
        Ok(Resolver::cpu_usage_micros(self))
    }
}

/// Monitor for a platform without a reader set
#[derive(Debug, Clone, Copy)]
pub struct Unsupported {
    os: &'static str,
}

impl Unsupported {
    pub fn new(os: &'static str) -> Self {
        Self { os }
    }

    fn refuse<T>(&self) -> Result<T> {
        Err(SysresError::UnsupportedPlatform(self.os))
    }
}

impl ResourceMonitor for Unsupported {
    fn platform(&self) -> &'static str {
        self.os
    }

    fn cpu_limit_cores(&self) -> Result<CpuLimit> {
        self.refuse()
    }

    fn cpu_usage_ratio(&self) -> Result<Option<f64>> {
        self.refuse()
    }

    fn memory_limit_bytes(&self) -> Result<MemoryLimit> {
        self.refuse()
    }

    fn memory_used_bytes(&self) -> Result<u64> {
        self.refuse()
    }

    fn memory_usage_ratio(&self) -> Result<Option<f64>> {
        self.refuse()
    }

    fn is_container_environment(&self) -> Result<bool> {
        self.refuse()
    }

    fn cgroup_version(&self) -> Result<CgroupVersion> {
        self.refuse()
    }

    fn cgroup_cpu_quota(&self) -> Result<Option<Limit<CpuQuota>>> {
        self.refuse()
    }

    fn cpu_usage_micros(&self) -> Result<Option<u64>> {
        self.refuse()
    }
}

/// Create the monitor for the platform this crate was built for
pub fn create_monitor(config: &SysresConfig) -> Arc<dyn ResourceMonitor> {
    let monitor = platform_monitor(config);
    tracing::debug!(platform = monitor.platform(), "Selected resource monitor");
    monitor
}

#[cfg(target_os = "linux")]
fn platform_monitor(config: &SysresConfig) -> Arc<dyn ResourceMonitor> {
    Arc::new(Resolver::linux(config))
}

#[cfg(target_os = "macos")]
fn platform_monitor(config: &SysresConfig) -> Arc<dyn ResourceMonitor> {
    Arc::new(Resolver::macos(config))
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
fn platform_monitor(_config: &SysresConfig) -> Arc<dyn ResourceMonitor> {
    Arc::new(Unsupported::new(std::env::consts::OS))
}

static DEFAULT_MONITOR: OnceLock<Arc<dyn ResourceMonitor>> = OnceLock::new();

/// Process-wide monitor with the default configuration
///
/// Only the choice of variant is kept; every reading is taken fresh.
pub fn default_monitor() -> &'static dyn ResourceMonitor {
    DEFAULT_MONITOR
        .get_or_init(|| create_monitor(&SysresConfig::default()))
        .as_ref()
}
