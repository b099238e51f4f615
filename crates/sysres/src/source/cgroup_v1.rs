//! cgroup v1 readers (fallback)
//!
//! Reads limits from the legacy split hierarchy, where every controller has
//! its own mount:
//! - cpu controller: cpu.cfs_quota_us / cpu.cfs_period_us
//! - cpuacct controller: cpuacct.usage
//! - memory controller: memory.limit_in_bytes / memory.usage_in_bytes
//!
//! The cpu and cpuacct controllers are often co-mounted, and the directory
//! name depends on how the distribution merged them. Variants are tried in
//! list order and the first one that yields a usable pair wins.

use super::{read_bounded, read_i64, read_u64, CpuSource, MemorySource, SourceKind};
use super::VALUE_READ_LIMIT;
use crate::models::{CgroupVersion, CpuLimit, CpuQuota, Limit, MemoryLimit};
use std::path::{Path, PathBuf};
use tracing::trace;

/// Directory names under which the cpu controller may be mounted.
///
/// The order is the lookup order. When several variants exist with
/// different values, the first listed wins; nothing guarantees that is the
/// authoritative one.
pub const CPU_CONTROLLER_VARIANTS: &[&str] = &["cpu", "cpu,cpuacct", "cpuacct,cpu"];

/// Directory names under which cpuacct may be mounted
const CPUACCT_CONTROLLER_VARIANTS: &[&str] = &["cpuacct", "cpu,cpuacct", "cpuacct,cpu"];

/// Directory names under which the memory controller may be mounted
pub const MEMORY_CONTROLLER_VARIANTS: &[&str] = &["memory"];

/// The kernel reports "no limit" as PAGE_COUNTER_MAX scaled by the page
/// size, which lands just under 2^63. Anything this large is not a real
/// ceiling.
const UNLIMITED_THRESHOLD_BYTES: u64 = 1 << 60;

/// CPU limit from the CFS quota/period pair
pub struct CgroupV1Cpu {
    cgroup_root: PathBuf,
    variants: Vec<String>,
}

impl CgroupV1Cpu {
    pub fn new(cgroup_root: impl Into<PathBuf>) -> Self {
        Self::with_variants(cgroup_root, CPU_CONTROLLER_VARIANTS)
    }

    /// Create a reader with a custom variant list
    pub fn with_variants(cgroup_root: impl Into<PathBuf>, variants: &[&str]) -> Self {
        Self {
            cgroup_root: cgroup_root.into(),
            variants: variants.iter().map(|v| v.to_string()).collect(),
        }
    }

    /// Interpret a quota/period pair
    ///
    /// `quota == -1` is unbounded; a non-positive period is malformed.
    pub fn parse_cfs(quota_us: i64, period_us: i64) -> Option<Limit<CpuQuota>> {
        if period_us <= 0 {
            return None;
        }
        if quota_us == -1 {
            return Some(Limit::Unbounded);
        }
        CpuQuota::new(quota_us, period_us).map(Limit::Bounded)
    }

    fn read_pair(dir: &Path) -> Option<(i64, i64)> {
        let quota = read_i64(&dir.join("cpu.cfs_quota_us"))?;
        let period = read_i64(&dir.join("cpu.cfs_period_us"))?;
        Some((quota, period))
    }
}

impl CpuSource for CgroupV1Cpu {
    fn name(&self) -> &'static str {
        "cgroup_v1"
    }

    fn cpu_limit(&self) -> Option<CpuLimit> {
        self.cpu_quota().map(|quota| quota.map(|q| q.cores()))
    }

    fn cpu_quota(&self) -> Option<Limit<CpuQuota>> {
        self.variants.iter().find_map(|variant| {
            let (quota, period) = Self::read_pair(&self.cgroup_root.join(variant))?;
            trace!(variant = %variant, quota, period, "Read CFS quota");
            Self::parse_cfs(quota, period)
        })
    }

    fn cpu_usage_micros(&self) -> Option<u64> {
        CPUACCT_CONTROLLER_VARIANTS.iter().find_map(|variant| {
            let nanos = read_u64(&self.cgroup_root.join(variant).join("cpuacct.usage"))?;
            Some(nanos / 1000).filter(|micros| *micros > 0)
        })
    }
}

/// Memory limit and usage from the memory controller
pub struct CgroupV1Memory {
    cgroup_root: PathBuf,
    variants: Vec<String>,
}

impl CgroupV1Memory {
    pub fn new(cgroup_root: impl Into<PathBuf>) -> Self {
        Self {
            cgroup_root: cgroup_root.into(),
            variants: MEMORY_CONTROLLER_VARIANTS
                .iter()
                .map(|v| v.to_string())
                .collect(),
        }
    }

    /// Parse `memory.limit_in_bytes` contents
    pub fn parse_limit_in_bytes(content: &str) -> Option<MemoryLimit> {
        let content = content.trim();
        if content == "-1" {
            return Some(Limit::Unbounded);
        }

        match content.parse::<u64>().ok()? {
            0 => None,
            bytes if bytes >= UNLIMITED_THRESHOLD_BYTES => Some(Limit::Unbounded),
            bytes => Some(Limit::Bounded(bytes)),
        }
    }
}

impl MemorySource for CgroupV1Memory {
    fn name(&self) -> &'static str {
        "cgroup_v1"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Cgroup
    }

    fn memory_limit(&self) -> Option<MemoryLimit> {
        self.variants.iter().find_map(|variant| {
            let path = self.cgroup_root.join(variant).join("memory.limit_in_bytes");
            let content = read_bounded(&path, VALUE_READ_LIMIT)?;
            Self::parse_limit_in_bytes(&content)
        })
    }

    fn memory_used(&self) -> Option<u64> {
        self.variants.iter().find_map(|variant| {
            read_u64(&self.cgroup_root.join(variant).join("memory.usage_in_bytes"))
        })
    }
}

/// Detect which cgroup version is mounted at `cgroup_root`
pub fn detect_cgroup_version(cgroup_root: &Path) -> CgroupVersion {
    // cgroup v2 exposes its controller list at the root
    if cgroup_root.join("cgroup.controllers").exists() {
        return CgroupVersion::V2;
    }

    let v1_dirs = MEMORY_CONTROLLER_VARIANTS
        .iter()
        .chain(CPU_CONTROLLER_VARIANTS)
        .chain(CPUACCT_CONTROLLER_VARIANTS);
    for dir in v1_dirs {
        if cgroup_root.join(dir).is_dir() {
            return CgroupVersion::V1;
        }
    }

    CgroupVersion::Unknown
}
