//! Resolution of CLI arguments and the configuration file into immutable settings.

use crate::cli::{LoadArgs, SshArgs};
use crate::ssh::SshTarget;
use dcl_common::{FileConfig, LoadSection, SshSection, defaults, expand_path};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const DEV_PREFIX: &str = "/dev/";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Unknown block device \"{}\"", .0.display())]
    DeviceNotFound(PathBuf),
}

/// Settings for one load test. Built once, read-only afterward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestConfig {
    pub device: PathBuf,
    pub verbose: bool,
    /// Threshold in percent; loads strictly above it fail.
    pub max_load: u32,
    pub xfer_mib: u64,
    pub dd_program: String,
    pub stat_path: PathBuf,
    pub report_path: Option<PathBuf>,
}

impl TestConfig {
    /// Merge CLI arguments over the file config and validate the device.
    pub fn resolve(args: &LoadArgs, file: &LoadSection) -> Result<Self, ResolveError> {
        let config = Self::resolve_unchecked(args, file);
        if !config.device.exists() || config.device.is_dir() {
            return Err(ResolveError::DeviceNotFound(config.device));
        }
        Ok(config)
    }

    /// Merge without touching the filesystem.
    pub fn resolve_unchecked(args: &LoadArgs, file: &LoadSection) -> Self {
        let raw_device = args
            .device
            .as_deref()
            .or(file.device.as_deref())
            .unwrap_or(defaults::DEVICE);

        let config = Self {
            device: normalize_device(raw_device),
            verbose: args.verbose,
            max_load: args.max_load.or(file.max_load).unwrap_or(defaults::MAX_LOAD),
            xfer_mib: args.xfer.or(file.xfer_mib).unwrap_or(defaults::XFER_MIB),
            dd_program: args
                .dd_program
                .clone()
                .or_else(|| file.dd_program.clone())
                .unwrap_or_else(|| defaults::DD_PROGRAM.to_string()),
            stat_path: args
                .stat_path
                .clone()
                .or_else(|| file.stat_path.clone())
                .unwrap_or_else(|| PathBuf::from(defaults::STAT_PATH)),
            report_path: args.report.clone(),
        };

        debug!(?config, "Resolved test configuration");
        config
    }
}

/// `sda` becomes `/dev/sda`; a path already under `/dev/` is kept as is.
pub fn normalize_device(raw: &str) -> PathBuf {
    let raw = raw.trim();
    if raw.starts_with(DEV_PREFIX) {
        PathBuf::from(raw)
    } else {
        Path::new(DEV_PREFIX).join(raw.trim_start_matches('/'))
    }
}

/// Outcome of resolving the SSH probe settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SshSettings {
    /// Probe this target.
    Probe(SshTarget),
    /// Do not probe, with the reason shown to the user.
    Skip(String),
}

impl SshSettings {
    pub fn resolve(args: &SshArgs, file: &SshSection) -> Self {
        Self::resolve_with_user(args, file, default_user())
    }

    fn resolve_with_user(args: &SshArgs, file: &SshSection, fallback_user: Option<String>) -> Self {
        if args.skip_ssh {
            return Self::Skip("SSH probe disabled with --skip-ssh".to_string());
        }

        let Some(host) = args.host.clone().or_else(|| file.host.clone()) else {
            return Self::Skip("no SSH host configured (--ssh-host)".to_string());
        };

        let Some(user) = args.user.clone().or_else(|| file.user.clone()).or(fallback_user) else {
            return Self::Skip("no SSH user configured (--ssh-user)".to_string());
        };

        let identity_file = args
            .identity_file
            .as_deref()
            .or(file.identity_file.as_deref())
            .filter(|raw| !raw.trim().is_empty())
            .map(expand_path);

        Self::Probe(SshTarget {
            host,
            port: args.port.or(file.port).unwrap_or(defaults::SSH_PORT),
            user,
            identity_file,
            connect_timeout: args
                .connect_timeout_secs
                .or(file.connect_timeout_secs)
                .map(Duration::from_secs),
        })
    }
}

fn default_user() -> Option<String> {
    ["USER", "LOGNAME"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|value| !value.trim().is_empty())
}

/// Load the configuration file selected by `--config` (or the default location).
pub fn load_file_config(args: &LoadArgs) -> Result<FileConfig, dcl_common::ConfigError> {
    FileConfig::load(args.config.as_deref())
}
