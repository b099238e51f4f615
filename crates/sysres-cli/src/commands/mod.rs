//! CLI subcommands

pub mod cgroup;
pub mod show;
pub mod watch;
