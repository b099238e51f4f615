//! Periodic sampling

use anyhow::{bail, Context, Result};
use std::sync::Arc;
use std::time::Duration;
use sysres::{ResourceMonitor, Snapshot};
use tabled::{settings::Style, Table, Tabled};
use tracing::info;

use super::show::format_timestamp;
use crate::output::{color_ratio, format_optional_bytes, OutputFormat};

/// Row for the sample table
#[derive(Tabled)]
struct SampleRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "CPU")]
    cpu: String,
    #[tabled(rename = "Mem Used")]
    memory_used: String,
    #[tabled(rename = "Mem")]
    memory: String,
}

impl From<&Snapshot> for SampleRow {
    fn from(snapshot: &Snapshot) -> Self {
        Self {
            time: format_timestamp(snapshot.sampled_at),
            cpu: color_ratio(snapshot.cpu_usage_ratio),
            memory_used: format_optional_bytes(snapshot.memory_used_bytes),
            memory: color_ratio(snapshot.memory_usage_ratio),
        }
    }
}

/// Sample every `interval_secs` until Ctrl-C or `count` samples
pub async fn watch(
    monitor: Arc<dyn ResourceMonitor>,
    interval_secs: u64,
    count: Option<u64>,
    format: OutputFormat,
) -> Result<()> {
    if interval_secs == 0 {
        bail!("Watch interval must be at least one second");
    }

    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
    let mut taken = 0u64;

    info!(interval_secs, ?count, "Watching resource usage");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let snapshot = monitor
                    .snapshot()
                    .context("Failed to read resource limits")?;
                print_sample(&snapshot, format)?;

                taken += 1;
                if count.is_some_and(|n| taken >= n) {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!(samples = taken, "Interrupted");
                break;
            }
        }
    }

    Ok(())
}

fn print_sample(snapshot: &Snapshot, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string(snapshot)?);
        }
        OutputFormat::Table => {
            let table = Table::new([SampleRow::from(snapshot)])
                .with(Style::blank())
                .to_string();
            println!("{}", table);
        }
    }
    Ok(())
}
