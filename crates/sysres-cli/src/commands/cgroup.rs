//! Raw cgroup CPU accounting

use anyhow::{Context, Result};
use serde::Serialize;
use sysres::{CgroupVersion, CpuQuota, Limit, ResourceMonitor};

use super::show::format_cgroup_version;
use crate::output::{format_millicores, print_fields, unknown, FieldRow, OutputFormat};

#[derive(Debug, Serialize)]
struct CgroupReport {
    version: CgroupVersion,
    cpu_quota: Option<Limit<CpuQuota>>,
    cpu_millicores: Option<i64>,
    cpu_usage_micros: Option<u64>,
}

impl CgroupReport {
    fn collect(monitor: &dyn ResourceMonitor) -> Result<Self> {
        let version = monitor
            .cgroup_version()
            .context("Failed to detect cgroup version")?;
        let cpu_quota = monitor
            .cgroup_cpu_quota()
            .context("Failed to read cgroup CPU quota")?;
        let cpu_usage_micros = monitor
            .cpu_usage_micros()
            .context("Failed to read cgroup CPU usage")?;

        Ok(Self {
            version,
            cpu_millicores: cpu_quota.and_then(|q| q.bounded()).map(|q| q.millicores()),
            cpu_quota,
            cpu_usage_micros,
        })
    }

    fn rows(&self) -> Vec<FieldRow> {
        let quota = match self.cpu_quota {
            Some(Limit::Bounded(q)) => format!("{} / {} µs", q.quota_us, q.period_us),
            Some(Limit::Unbounded) => "max".to_string(),
            None => unknown(),
        };

        vec![
            FieldRow::new("Version", format_cgroup_version(self.version)),
            FieldRow::new("CPU quota", quota),
            FieldRow::new(
                "CPU cores",
                self.cpu_millicores
                    .map(format_millicores)
                    .unwrap_or_else(unknown),
            ),
            FieldRow::new(
                "CPU time",
                self.cpu_usage_micros
                    .map(|us| format!("{} µs", us))
                    .unwrap_or_else(unknown),
            ),
        ]
    }
}

/// Show cgroup version, CFS quota and cumulative CPU time
pub fn show_cgroup(monitor: &dyn ResourceMonitor, format: OutputFormat) -> Result<()> {
    let report = CgroupReport::collect(monitor)?;
    print_fields(&report, report.rows(), format)
}
