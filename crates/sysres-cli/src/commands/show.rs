//! One-shot snapshot of limits and usage

use anyhow::{Context, Result};
use sysres::{CgroupVersion, ResourceMonitor, Snapshot};

use crate::output::{
    color_ratio, format_bool, format_cpu_limit, format_memory_limit, format_optional_bytes,
    print_fields, print_warning, unknown, FieldRow, OutputFormat,
};

/// Show current limits and usage
pub fn show(monitor: &dyn ResourceMonitor, format: OutputFormat) -> Result<()> {
    let snapshot = monitor
        .snapshot()
        .context("Failed to read resource limits")?;

    if snapshot.cpu_limit_cores.is_none() && snapshot.memory_limit_bytes.is_none() {
        print_warning("No CPU or memory source responded");
    }

    print_fields(&snapshot, snapshot_rows(&snapshot), format)
}

pub fn format_timestamp(timestamp: i64) -> String {
    chrono::DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

pub fn format_cgroup_version(version: CgroupVersion) -> String {
    match version {
        CgroupVersion::V1 => "v1".to_string(),
        CgroupVersion::V2 => "v2".to_string(),
        CgroupVersion::Unknown => unknown(),
    }
}

fn snapshot_rows(snapshot: &Snapshot) -> Vec<FieldRow> {
    vec![
        FieldRow::new("Platform", snapshot.platform.clone()),
        FieldRow::new("Sampled at", format_timestamp(snapshot.sampled_at)),
        FieldRow::new("cgroup", format_cgroup_version(snapshot.cgroup_version)),
        FieldRow::new("Container", format_bool(snapshot.is_container)),
        FieldRow::new("CPU limit", format_cpu_limit(snapshot.cpu_limit_cores)),
        FieldRow::new("CPU usage", color_ratio(snapshot.cpu_usage_ratio)),
        FieldRow::new(
            "Memory limit",
            format_memory_limit(snapshot.memory_limit_bytes),
        ),
        FieldRow::new(
            "Memory used",
            format_optional_bytes(snapshot.memory_used_bytes),
        ),
        FieldRow::new("Memory usage", color_ratio(snapshot.memory_usage_ratio)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use sysres::Limit;

    #[test]
    fn test_snapshot_rows() {
        colored::control::set_override(false);
        let snapshot = Snapshot {
            platform: "linux".to_string(),
            sampled_at: 0,
            cgroup_version: CgroupVersion::V1,
            is_container: true,
            cpu_limit_cores: Some(Limit::Bounded(2.0)),
            cpu_usage_ratio: Some(0.25),
            memory_limit_bytes: Some(Limit::Unbounded),
            memory_used_bytes: None,
            memory_usage_ratio: None,
        };

        let rows = snapshot_rows(&snapshot);
        let value = |field: &str| {
            rows.iter()
                .find(|row| row.field == field)
                .map(|row| row.value.clone())
                .unwrap()
        };

        assert_eq!(value("Sampled at"), "1970-01-01 00:00:00 UTC");
        assert_eq!(value("cgroup"), "v1");
        assert_eq!(value("Container"), "yes");
        assert_eq!(value("CPU limit"), "2.00 cores");
        assert_eq!(value("CPU usage"), "25.0%");
        assert_eq!(value("Memory limit"), "unlimited");
        assert_eq!(value("Memory used"), "unknown");
    }
}
