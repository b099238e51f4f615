//! Configuration management for the CLI

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use sysres::SysresConfig;

use crate::output::OutputFormat;

/// CLI settings from the config file and `SYSRES_MONITOR_*` variables
#[derive(Debug, Clone, Deserialize)]
pub struct CliSettings {
    /// cgroup filesystem mount point
    pub cgroup_root: Option<PathBuf>,
    /// procfs mount point
    pub proc_root: Option<PathBuf>,
    /// Name of the CPU override variable
    pub cpu_override_var: Option<String>,
    /// Default output format ("table" or "json")
    pub format: Option<String>,
    /// Default watch interval in seconds
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

fn default_interval_secs() -> u64 {
    2
}

impl Default for CliSettings {
    fn default() -> Self {
        Self {
            cgroup_root: None,
            proc_root: None,
            cpu_override_var: None,
            format: None,
            interval_secs: default_interval_secs(),
        }
    }
}

impl CliSettings {
    /// Load settings, with environment variables taking precedence over the file
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        match path {
            Some(path) => {
                builder = builder.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                if let Some(default_path) = Self::config_path() {
                    builder = builder
                        .add_source(config::File::from(default_path).required(false));
                }
            }
        }

        let settings = builder
            .add_source(config::Environment::with_prefix("SYSRES_MONITOR"))
            .build()
            .context("Failed to read configuration")?;

        settings
            .try_deserialize()
            .context("Failed to parse configuration")
    }

    /// Get the default configuration file path
    fn config_path() -> Option<PathBuf> {
        dirs_next::config_dir().map(|dir| dir.join("sysres").join("config.toml"))
    }

    /// Resolver configuration, with command-line roots taking precedence
    pub fn monitor_config(
        &self,
        cgroup_root: Option<PathBuf>,
        proc_root: Option<PathBuf>,
    ) -> SysresConfig {
        let mut config = SysresConfig::default();

        if let Some(root) = cgroup_root.or_else(|| self.cgroup_root.clone()) {
            config.cgroup_root = root;
        }
        if let Some(root) = proc_root.or_else(|| self.proc_root.clone()) {
            config.proc_root = root;
        }
        if let Some(var) = &self.cpu_override_var {
            config.cpu_override_var = var.clone();
        }

        config
    }

    /// Default output format
    pub fn format(&self) -> Result<OutputFormat> {
        match self.format.as_deref().map(str::to_lowercase).as_deref() {
            None | Some("table") => Ok(OutputFormat::Table),
            Some("json") => Ok(OutputFormat::Json),
            Some(other) => bail!("Unknown output format in configuration: {}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            "cgroup_root = \"/mnt/cgroup\"\nformat = \"json\"\ninterval_secs = 5\n",
        )
        .unwrap();

        let settings = CliSettings::load(Some(&path)).unwrap();
        assert_eq!(settings.cgroup_root, Some(PathBuf::from("/mnt/cgroup")));
        assert_eq!(settings.interval_secs, 5);
        assert!(matches!(settings.format().unwrap(), OutputFormat::Json));
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("absent.toml");
        assert!(CliSettings::load(Some(&path)).is_err());
    }

    #[test]
    fn test_flags_override_settings() {
        let settings = CliSettings {
            cgroup_root: Some(PathBuf::from("/from/file")),
            proc_root: Some(PathBuf::from("/from/file/proc")),
            cpu_override_var: Some("MY_CORES".to_string()),
            ..Default::default()
        };

        let config = settings.monitor_config(Some(PathBuf::from("/from/flag")), None);
        assert_eq!(config.cgroup_root, PathBuf::from("/from/flag"));
        assert_eq!(config.proc_root, PathBuf::from("/from/file/proc"));
        assert_eq!(config.cpu_override_var, "MY_CORES");
    }

    #[test]
    fn test_defaults() {
        let config = CliSettings::default().monitor_config(None, None);
        assert_eq!(config, SysresConfig::default());
        assert!(matches!(
            CliSettings::default().format().unwrap(),
            OutputFormat::Table
        ));
    }

    #[test]
    fn test_unknown_format() {
        let settings = CliSettings {
            format: Some("yaml".to_string()),
            ..Default::default()
        };
        assert!(settings.format().is_err());
    }
}
