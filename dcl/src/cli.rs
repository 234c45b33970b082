//! Command-line surface of both binaries.

use crate::EXIT_FAILURE;
use clap::{Args, Parser};
use std::path::PathBuf;

/// Arguments shared by `disk-cpu-load` and `ssh-disk-cpu-load`.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadArgs {
    /// Maximum acceptable CPU load, as a percentage [default: 30]
    #[arg(long = "max-load", value_name = "LOAD")]
    pub max_load: Option<u32>,

    /// Amount of data to read from the disk, in mebibytes [default: 4096]
    #[arg(long, value_name = "MEBIBYTES")]
    pub xfer: Option<u64>,

    /// Produce more verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file [default: <config dir>/disk-cpu-load/config.toml]
    #[arg(long, value_name = "PATH", env = "DCL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Also write the result as JSON to this file
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Command used for the disk read [default: dd]
    #[arg(long, value_name = "PROGRAM", env = "DCL_DD_PROGRAM")]
    pub dd_program: Option<String>,

    /// Source of the aggregate CPU counters [default: /proc/stat]
    #[arg(long, value_name = "PATH", env = "DCL_STAT_PATH")]
    pub stat_path: Option<PathBuf>,

    /// Whole-disk device, with or without /dev/ (e.g. sda or /dev/sda) [default: /dev/sda]
    #[arg(value_name = "DEVICE-FILE")]
    pub device: Option<String>,
}

/// SSH probe arguments for `ssh-disk-cpu-load`.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct SshArgs {
    /// Host to probe
    #[arg(long = "ssh-host", value_name = "HOST", env = "DCL_SSH_HOST")]
    pub host: Option<String>,

    /// SSH port [default: 22]
    #[arg(long = "ssh-port", value_name = "PORT", env = "DCL_SSH_PORT")]
    pub port: Option<u16>,

    /// Remote user [default: $USER]
    #[arg(long = "ssh-user", value_name = "USER", env = "DCL_SSH_USER")]
    pub user: Option<String>,

    /// Private key for the key-based attempt; skipped when unset
    #[arg(long = "ssh-key", value_name = "PATH", env = "DCL_SSH_KEY")]
    pub identity_file: Option<String>,

    /// Give up connecting after this many seconds
    #[arg(
        long = "ssh-connect-timeout",
        value_name = "SECS",
        env = "DCL_SSH_CONNECT_TIMEOUT"
    )]
    pub connect_timeout_secs: Option<u64>,

    /// Run only the disk load test
    #[arg(long)]
    pub skip_ssh: bool,
}

/// `disk-cpu-load`
#[derive(Parser, Debug)]
#[command(name = "disk-cpu-load", version)]
#[command(about = "Test the CPU load imposed by a simple sequential disk read")]
pub struct DiskCpuLoadCli {
    #[command(flatten)]
    pub load: LoadArgs,
}

/// `ssh-disk-cpu-load`
#[derive(Parser, Debug)]
#[command(name = "ssh-disk-cpu-load", version)]
#[command(about = "Check SSH connectivity, then test the CPU load imposed by a sequential disk read")]
pub struct SshDiskCpuLoadCli {
    #[command(flatten)]
    pub load: LoadArgs,

    #[command(flatten)]
    pub ssh: SshArgs,
}

/// Parse the process arguments, exiting with [`EXIT_FAILURE`] on usage errors.
///
/// `--help` and `--version` still exit 0.
pub fn parse_or_exit<T: Parser>() -> T {
    match T::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() {
                i32::from(EXIT_FAILURE)
            } else {
                0
            };
            let _ = err.print();
            std::process::exit(code);
        }
    }
}

/// Usage line printed alongside an unknown-device message.
pub fn usage_line(program: &str) -> String {
    format!("Usage: {program} [ --max-load <load> ] [ --xfer <mebibytes> ] [ device-file ]")
}
