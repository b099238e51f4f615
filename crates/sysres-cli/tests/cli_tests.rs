//! CLI integration tests

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Run the binary with a clean environment and no user config file
fn sysres(config_home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sysres"))
        .args(args)
        .env_clear()
        .env("HOME", config_home)
        .env("XDG_CONFIG_HOME", config_home)
        .output()
        .expect("Failed to execute command")
}

/// Mock cgroup v2 and procfs trees
fn create_mock_roots(temp_dir: &TempDir) -> (String, String) {
    let cgroup_root = temp_dir.path().join("cgroup");
    let proc_root = temp_dir.path().join("proc");
    fs::create_dir_all(&cgroup_root).unwrap();
    fs::create_dir_all(&proc_root).unwrap();

    fs::write(cgroup_root.join("cgroup.controllers"), "cpu memory\n").unwrap();
    fs::write(cgroup_root.join("cpu.max"), "150000 100000\n").unwrap();
    fs::write(cgroup_root.join("cpu.stat"), "usage_usec 42000\nuser_usec 40000\n").unwrap();
    fs::write(cgroup_root.join("memory.max"), "1073741824\n").unwrap();
    fs::write(cgroup_root.join("memory.current"), "268435456\n").unwrap();

    fs::write(proc_root.join("loadavg"), "0.75 0.50 0.25 1/100 999\n").unwrap();
    fs::write(
        proc_root.join("meminfo"),
        "MemTotal: 8000000 kB\nMemFree: 4000000 kB\n",
    )
    .unwrap();

    (
        cgroup_root.to_string_lossy().into_owned(),
        proc_root.to_string_lossy().into_owned(),
    )
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let temp_dir = TempDir::new().unwrap();
    let output = sysres(temp_dir.path(), &["--help"]);

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("show"), "Should show show command");
    assert!(stdout.contains("watch"), "Should show watch command");
    assert!(stdout.contains("cgroup"), "Should show cgroup command");
    assert!(stdout.contains("--cgroup-root"), "Should show cgroup root option");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let temp_dir = TempDir::new().unwrap();
    let output = sysres(temp_dir.path(), &["--version"]);

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("sysres"), "Should show binary name");
}

/// Test watch subcommand help
#[test]
fn test_watch_help() {
    let temp_dir = TempDir::new().unwrap();
    let output = sysres(temp_dir.path(), &["watch", "--help"]);

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Watch help should succeed");
    assert!(stdout.contains("--interval"), "Should show interval option");
    assert!(stdout.contains("--count"), "Should show count option");
}

/// Test invalid format value
#[test]
fn test_invalid_format() {
    let temp_dir = TempDir::new().unwrap();
    let output = sysres(temp_dir.path(), &["--format", "yaml"]);

    assert!(!output.status.success(), "Invalid format should fail");
}

#[cfg(target_os = "linux")]
mod linux {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_show_json() {
        let temp_dir = TempDir::new().unwrap();
        let (cgroup_root, proc_root) = create_mock_roots(&temp_dir);

        let output = sysres(
            temp_dir.path(),
            &[
                "show",
                "--format",
                "json",
                "--cgroup-root",
                &cgroup_root,
                "--proc-root",
                &proc_root,
            ],
        );
        assert!(output.status.success(), "Show should succeed");

        let json: Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(json["platform"], "linux");
        assert_eq!(json["cgroup_version"], "v2");
        assert_eq!(json["is_container"], true);
        assert_eq!(json["cpu_limit_cores"]["kind"], "bounded");
        assert_eq!(json["cpu_limit_cores"]["value"], 1.5);
        assert_eq!(json["cpu_usage_ratio"], 0.5);
        assert_eq!(json["memory_limit_bytes"]["value"], 1073741824u64);
        assert_eq!(json["memory_used_bytes"], 268435456u64);
        assert_eq!(json["memory_usage_ratio"], 0.25);
    }

    #[test]
    fn test_show_is_default_command() {
        let temp_dir = TempDir::new().unwrap();
        let (cgroup_root, proc_root) = create_mock_roots(&temp_dir);

        let output = sysres(
            temp_dir.path(),
            &[
                "--cgroup-root",
                &cgroup_root,
                "--proc-root",
                &proc_root,
            ],
        );
        let stdout = String::from_utf8_lossy(&output.stdout);

        assert!(output.status.success(), "Default command should succeed");
        assert!(stdout.contains("CPU limit"), "Should show CPU limit row");
        assert!(stdout.contains("1.50 cores"), "Should show cgroup CPU limit");
    }

    #[test]
    fn test_cpu_override() {
        let temp_dir = TempDir::new().unwrap();
        let (cgroup_root, proc_root) = create_mock_roots(&temp_dir);

        let output = Command::new(env!("CARGO_BIN_EXE_sysres"))
            .args([
                "show",
                "--format",
                "json",
                "--cgroup-root",
                &cgroup_root,
                "--proc-root",
                &proc_root,
            ])
            .env_clear()
            .env("HOME", temp_dir.path())
            .env("XDG_CONFIG_HOME", temp_dir.path())
            .env("SYSRES_CPU_CORES", "3")
            .output()
            .expect("Failed to execute command");
        assert!(output.status.success());

        let json: Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(json["cpu_limit_cores"]["value"], 3.0);
        assert_eq!(json["cpu_usage_ratio"], 0.25);
    }

    #[test]
    fn test_format_flag_beats_bad_setting() {
        let temp_dir = TempDir::new().unwrap();
        let (cgroup_root, proc_root) = create_mock_roots(&temp_dir);
        let args = [
            "show",
            "--cgroup-root",
            cgroup_root.as_str(),
            "--proc-root",
            proc_root.as_str(),
        ];

        let run = |extra: &[&str]| {
            Command::new(env!("CARGO_BIN_EXE_sysres"))
                .args(args)
                .args(extra)
                .env_clear()
                .env("HOME", temp_dir.path())
                .env("XDG_CONFIG_HOME", temp_dir.path())
                .env("SYSRES_MONITOR_FORMAT", "yaml")
                .output()
                .expect("Failed to execute command")
        };

        let output = run(&[]);
        assert!(!output.status.success(), "Bad configured format should fail");

        let output = run(&["--format", "json"]);
        assert!(output.status.success(), "Explicit format should win");
        let json: Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(json["is_container"], true);
    }

    #[test]
    fn test_cgroup_json() {
        let temp_dir = TempDir::new().unwrap();
        let (cgroup_root, proc_root) = create_mock_roots(&temp_dir);

        let output = sysres(
            temp_dir.path(),
            &[
                "cgroup",
                "--format",
                "json",
                "--cgroup-root",
                &cgroup_root,
                "--proc-root",
                &proc_root,
            ],
        );
        assert!(output.status.success(), "Cgroup should succeed");

        let json: Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(json["version"], "v2");
        assert_eq!(json["cpu_quota"]["value"]["quota_us"], 150000);
        assert_eq!(json["cpu_millicores"], 1500);
        assert_eq!(json["cpu_usage_micros"], 42000);
    }

    #[test]
    fn test_watch_count() {
        let temp_dir = TempDir::new().unwrap();
        let (cgroup_root, proc_root) = create_mock_roots(&temp_dir);

        let output = sysres(
            temp_dir.path(),
            &[
                "watch",
                "--interval",
                "1",
                "--count",
                "2",
                "--format",
                "json",
                "--cgroup-root",
                &cgroup_root,
                "--proc-root",
                &proc_root,
            ],
        );
        assert!(output.status.success(), "Watch should succeed");

        let stdout = String::from_utf8_lossy(&output.stdout);
        let samples: Vec<Value> = stdout
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(samples.len(), 2);
        assert!(samples.iter().all(|s| s["is_container"] == true));
    }

    #[test]
    fn test_config_file_roots() {
        let temp_dir = TempDir::new().unwrap();
        let (cgroup_root, proc_root) = create_mock_roots(&temp_dir);

        let config_dir = temp_dir.path().join("sysres");
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(
            config_dir.join("config.toml"),
            format!(
                "cgroup_root = \"{}\"\nproc_root = \"{}\"\nformat = \"json\"\n",
                cgroup_root, proc_root
            ),
        )
        .unwrap();

        let output = sysres(temp_dir.path(), &["show"]);
        assert!(output.status.success(), "Show should succeed");

        let json: Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(json["memory_usage_ratio"], 0.25);
    }
}
