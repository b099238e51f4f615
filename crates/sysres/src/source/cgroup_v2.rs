//! cgroup v2 readers
//!
//! Reads limits from the unified cgroup v2 hierarchy:
//! - cpu.max for the CPU bandwidth quota ("quota period" or "max period")
//! - cpu.stat for cumulative CPU usage
//! - memory.max and memory.current for the memory limit and usage

use super::{read_bounded, read_u64, CpuSource, MemorySource, SourceKind};
use super::{TEXT_READ_LIMIT, VALUE_READ_LIMIT};
use crate::models::{CpuLimit, CpuQuota, Limit, MemoryLimit};
use std::path::PathBuf;

/// CPU limit from `cpu.max`
pub struct CgroupV2Cpu {
    cgroup_root: PathBuf,
}

impl CgroupV2Cpu {
    pub fn new(cgroup_root: impl Into<PathBuf>) -> Self {
        Self {
            cgroup_root: cgroup_root.into(),
        }
    }

    /// Parse `cpu.max` contents
    ///
    /// A `max` quota is unbounded. A non-positive period or quota makes the
    /// file unusable.
    pub fn parse_cpu_max(content: &str) -> Option<Limit<CpuQuota>> {
        let mut tokens = content.split_whitespace();
        let quota = tokens.next()?;
        if quota == "max" {
            return Some(Limit::Unbounded);
        }

        let quota: i64 = quota.parse().ok()?;
        let period: i64 = tokens.next()?.parse().ok()?;
        CpuQuota::new(quota, period).map(Limit::Bounded)
    }

    /// Parse `cpu.stat` contents, returning `usage_usec`
    pub fn parse_cpu_stat(content: &str) -> Option<u64> {
        content.lines().find_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            match parts.as_slice() {
                ["usage_usec", value, ..] => value.parse().ok(),
                _ => None,
            }
        })
    }
}

impl CpuSource for CgroupV2Cpu {
    fn name(&self) -> &'static str {
        "cgroup_v2"
    }

    fn cpu_limit(&self) -> Option<CpuLimit> {
        self.cpu_quota().map(|quota| quota.map(|q| q.cores()))
    }

    fn cpu_quota(&self) -> Option<Limit<CpuQuota>> {
        let content = read_bounded(&self.cgroup_root.join("cpu.max"), VALUE_READ_LIMIT)?;
        Self::parse_cpu_max(&content)
    }

    fn cpu_usage_micros(&self) -> Option<u64> {
        let content = read_bounded(&self.cgroup_root.join("cpu.stat"), TEXT_READ_LIMIT)?;
        Self::parse_cpu_stat(&content).filter(|usage| *usage > 0)
    }
}

/// Memory limit and usage from `memory.max` / `memory.current`
pub struct CgroupV2Memory {
    cgroup_root: PathBuf,
}

impl CgroupV2Memory {
    pub fn new(cgroup_root: impl Into<PathBuf>) -> Self {
        Self {
            cgroup_root: cgroup_root.into(),
        }
    }

    /// Parse `memory.max` contents: a byte count or `max`
    pub fn parse_memory_max(content: &str) -> Option<MemoryLimit> {
        let content = content.trim();
        if content == "max" {
            return Some(Limit::Unbounded);
        }

        match content.parse::<u64>().ok()? {
            0 => None,
            bytes => Some(Limit::Bounded(bytes)),
        }
    }
}

impl MemorySource for CgroupV2Memory {
    fn name(&self) -> &'static str {
        "cgroup_v2"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Cgroup
    }

    fn memory_limit(&self) -> Option<MemoryLimit> {
        let content = read_bounded(&self.cgroup_root.join("memory.max"), VALUE_READ_LIMIT)?;
        Self::parse_memory_max(&content)
    }

    fn memory_used(&self) -> Option<u64> {
        read_u64(&self.cgroup_root.join("memory.current"))
    }
}
