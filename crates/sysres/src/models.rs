//! Core data models for resource readings

use serde::{Deserialize, Serialize};

/// A resource ceiling: either a concrete positive value or explicitly no limit.
///
/// `Unbounded` is never encoded as a number; callers must match on it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Limit<T> {
    Bounded(T),
    Unbounded,
}

impl<T: Copy> Limit<T> {
    /// The bounded value, if any
    pub fn bounded(&self) -> Option<T> {
        match self {
            Limit::Bounded(value) => Some(*value),
            Limit::Unbounded => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Limit<U> {
        match self {
            Limit::Bounded(value) => Limit::Bounded(f(value)),
            Limit::Unbounded => Limit::Unbounded,
        }
    }
}

/// CPU ceiling in cores
pub type CpuLimit = Limit<f64>;

/// Memory ceiling in bytes
pub type MemoryLimit = Limit<u64>;

/// CFS bandwidth settings read from a cgroup, in microseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuQuota {
    pub quota_us: i64,
    pub period_us: i64,
}

impl CpuQuota {
    /// Build a quota, rejecting non-positive values
    pub fn new(quota_us: i64, period_us: i64) -> Option<Self> {
        if quota_us <= 0 || period_us <= 0 {
            return None;
        }
        Some(Self {
            quota_us,
            period_us,
        })
    }

    /// Cores available under this quota (quota / period)
    pub fn cores(&self) -> f64 {
        self.quota_us as f64 / self.period_us as f64
    }

    /// Milli-cores, truncated toward zero
    pub fn millicores(&self) -> i64 {
        self.quota_us.saturating_mul(1000) / self.period_us
    }
}

/// Host-wide memory figures in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostMemory {
    pub total_bytes: u64,
    pub used_bytes: u64,
}

/// Cgroup version detected on the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CgroupVersion {
    V1,
    V2,
    Unknown,
}

/// Every reading taken in one pass
///
/// Fields that could not be resolved are `None`; a `None` ratio means
/// "unknown", never zero usage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub platform: String,
    pub sampled_at: i64,
    pub cgroup_version: CgroupVersion,
    pub is_container: bool,
    pub cpu_limit_cores: Option<CpuLimit>,
    pub cpu_usage_ratio: Option<f64>,
    pub memory_limit_bytes: Option<MemoryLimit>,
    pub memory_used_bytes: Option<u64>,
    pub memory_usage_ratio: Option<f64>,
}
