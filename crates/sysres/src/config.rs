//! Resolver configuration

use std::path::PathBuf;

/// Environment variable that overrides CPU limit detection
pub const CPU_OVERRIDE_VAR: &str = "SYSRES_CPU_CORES";

/// Where the resolvers look for their sources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SysresConfig {
    /// Mount point of the cgroup filesystem
    pub cgroup_root: PathBuf,

    /// Mount point of procfs
    pub proc_root: PathBuf,

    /// Name of the CPU override variable
    pub cpu_override_var: String,
}

impl Default for SysresConfig {
    fn default() -> Self {
        Self {
            cgroup_root: PathBuf::from("/sys/fs/cgroup"),
            proc_root: PathBuf::from("/proc"),
            cpu_override_var: CPU_OVERRIDE_VAR.to_string(),
        }
    }
}

impl SysresConfig {
    /// Point both mounts somewhere else (test fixtures, chroots)
    pub fn with_roots(cgroup_root: impl Into<PathBuf>, proc_root: impl Into<PathBuf>) -> Self {
        Self {
            cgroup_root: cgroup_root.into(),
            proc_root: proc_root.into(),
            ..Self::default()
        }
    }

    pub fn with_cpu_override_var(mut self, name: impl Into<String>) -> Self {
        self.cpu_override_var = name.into();
        self
    }
}
