//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use sysres::{CpuLimit, Limit, MemoryLimit};
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// One labelled reading
#[derive(Tabled)]
pub struct FieldRow {
    #[tabled(rename = "Field")]
    pub field: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

impl FieldRow {
    pub fn new(field: &str, value: String) -> Self {
        Self {
            field: field.to_string(),
            value,
        }
    }
}

/// Print a value as a two-column table or as JSON
pub fn print_fields<T: Serialize>(
    value: &T,
    rows: Vec<FieldRow>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Table => {
            let table = Table::new(rows).with(Style::rounded()).to_string();
            println!("{}", table);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
    }
    Ok(())
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message);
}

/// Format bytes as human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2}Gi", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2}Mi", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2}Ki", bytes as f64 / KB as f64)
    } else {
        format!("{}B", bytes)
    }
}

/// Format millicores as human-readable string
pub fn format_millicores(millicores: i64) -> String {
    if millicores >= 1000 {
        format!("{:.1}", millicores as f64 / 1000.0)
    } else {
        format!("{}m", millicores)
    }
}

pub fn format_cpu_limit(limit: Option<CpuLimit>) -> String {
    match limit {
        Some(Limit::Bounded(cores)) => format!("{:.2} cores", cores),
        Some(Limit::Unbounded) => "unlimited".cyan().to_string(),
        None => unknown(),
    }
}

pub fn format_memory_limit(limit: Option<MemoryLimit>) -> String {
    match limit {
        Some(Limit::Bounded(bytes)) => format_bytes(bytes),
        Some(Limit::Unbounded) => "unlimited".cyan().to_string(),
        None => unknown(),
    }
}

pub fn format_optional_bytes(bytes: Option<u64>) -> String {
    bytes.map(format_bytes).unwrap_or_else(unknown)
}

/// Color a usage ratio by how close it is to the ceiling
pub fn color_ratio(ratio: Option<f64>) -> String {
    let Some(ratio) = ratio else {
        return unknown();
    };

    let formatted = format!("{:.1}%", ratio * 100.0);
    if ratio >= 0.9 {
        formatted.red().to_string()
    } else if ratio >= 0.7 {
        formatted.yellow().to_string()
    } else {
        formatted.green().to_string()
    }
}

pub fn format_bool(value: bool) -> String {
    if value {
        "yes".green().to_string()
    } else {
        "no".to_string()
    }
}

pub fn unknown() -> String {
    "unknown".dimmed().to_string()
}
