//! Environment override for the CPU limit
//!
//! Sandboxes such as gVisor hide the cgroup filesystem, so operators can
//! state the CPU budget explicitly through an environment variable.

use super::CpuSource;
use crate::models::{CpuLimit, Limit};

type Lookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// CPU limit taken from an environment variable
pub struct EnvOverride {
    var: String,
    lookup: Lookup,
}

impl EnvOverride {
    /// Read `var` from the process environment at call time
    pub fn new(var: impl Into<String>) -> Self {
        Self::with_lookup(var, |name| std::env::var(name).ok())
    }

    /// Create an override with a custom variable lookup (for testing)
    pub fn with_lookup(
        var: impl Into<String>,
        lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            var: var.into(),
            lookup: Box::new(lookup),
        }
    }

    /// Parse an override value; zero, negative or non-numeric values are ignored
    pub fn parse_cores(raw: &str) -> Option<f64> {
        let cores: f64 = raw.trim().parse().ok()?;
        (cores.is_finite() && cores > 0.0).then_some(cores)
    }
}

impl CpuSource for EnvOverride {
    fn name(&self) -> &'static str {
        "env_override"
    }

    fn cpu_limit(&self) -> Option<CpuLimit> {
        let raw = (self.lookup)(&self.var)?;
        Self::parse_cores(&raw).map(Limit::Bounded)
    }
}
