//! Container-aware CPU and memory introspection
//!
//! This crate reports the effective CPU and memory ceiling of the current
//! process and how much of it is in use:
//! - cgroup v2 (unified hierarchy) and cgroup v1 (legacy hierarchy) limits
//! - host-wide fallbacks from procfs, sysconf and Mach VM statistics
//! - an environment override for sandboxes that hide cgroups (gVisor)
//!
//! Every call re-reads its sources; nothing is cached. The free functions
//! below use the monitor selected for the current platform.

pub mod config;
pub mod error;
pub mod models;
pub mod platform;
pub mod resolver;
pub mod source;


pub use config::{SysresConfig, CPU_OVERRIDE_VAR};
pub use error::{Result, SysresError};
pub use models::*;
pub use platform::{create_monitor, default_monitor, ResourceMonitor, Unsupported};
pub use resolver::Resolver;

/// Effective CPU ceiling in cores
pub fn cpu_limit_cores() -> Result<CpuLimit> {
    default_monitor().cpu_limit_cores()
}

/// 1-minute load average divided by the effective core count
pub fn cpu_usage_ratio() -> Result<Option<f64>> {
    default_monitor().cpu_usage_ratio()
}

/// Effective memory ceiling in bytes
pub fn memory_limit_bytes() -> Result<MemoryLimit> {
    default_monitor().memory_limit_bytes()
}

/// Memory in use, in bytes
pub fn memory_used_bytes() -> Result<u64> {
    default_monitor().memory_used_bytes()
}

/// Memory in use relative to the ceiling
pub fn memory_usage_ratio() -> Result<Option<f64>> {
    default_monitor().memory_usage_ratio()
}

/// Whether a cgroup memory limit applies to this process
pub fn is_container_environment() -> Result<bool> {
    default_monitor().is_container_environment()
}

/// All readings at once
pub fn snapshot() -> Result<Snapshot> {
    default_monitor().snapshot()
}
