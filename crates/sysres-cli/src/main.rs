//! sysres CLI
//!
//! Prints the CPU and memory ceilings that apply to this process, whether
//! they come from a cgroup or from the host, and how much of them is in use.

mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Container-aware resource limits
#[derive(Parser)]
#[command(name = "sysres")]
#[command(author, version, about = "Container-aware CPU and memory limits", long_about = None)]
pub struct Cli {
    /// cgroup filesystem mount point
    #[arg(long, global = true)]
    pub cgroup_root: Option<PathBuf>,

    /// procfs mount point
    #[arg(long, global = true)]
    pub proc_root: Option<PathBuf>,

    /// Config file (defaults to ~/.config/sysres/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short, global = true)]
    pub format: Option<output::OutputFormat>,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show current limits and usage
    Show,

    /// Sample limits and usage repeatedly
    Watch {
        /// Seconds between samples
        #[arg(long, short)]
        interval: Option<u64>,

        /// Stop after this many samples
        #[arg(long, short)]
        count: Option<u64>,
    },

    /// Show raw cgroup CPU accounting
    Cgroup,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "sysres=debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(fmt::layer().json().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = config::CliSettings::load(cli.config.as_deref())?;
    let monitor_config = settings.monitor_config(cli.cgroup_root, cli.proc_root);
    let format = match cli.format {
        Some(format) => format,
        None => settings.format()?,
    };

    tracing::debug!(
        cgroup_root = %monitor_config.cgroup_root.display(),
        proc_root = %monitor_config.proc_root.display(),
        "Resolved configuration"
    );

    let monitor = sysres::create_monitor(&monitor_config);

    match cli.command.unwrap_or(Commands::Show) {
        Commands::Show => {
            commands::show::show(monitor.as_ref(), format)?;
        }
        Commands::Watch { interval, count } => {
            let interval = interval.unwrap_or(settings.interval_secs);
            commands::watch::watch(monitor, interval, count, format).await?;
        }
        Commands::Cgroup => {
            commands::cgroup::show_cgroup(monitor.as_ref(), format)?;
        }
    }

    Ok(())
}
