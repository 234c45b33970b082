//! Optional TOML configuration file.
//!
//! Values resolve with the precedence CLI flag > environment variable >
//! configuration file > built-in default. This module covers the file layer;
//! the first two are handled by clap in the `dcl` crate.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Built-in defaults.
pub mod defaults {
    pub const MAX_LOAD: u32 = 30;
    pub const XFER_MIB: u64 = 4096;
    pub const DEVICE: &str = "/dev/sda";
    pub const DD_PROGRAM: &str = "dd";
    pub const STAT_PATH: &str = "/proc/stat";
    pub const SSH_PORT: u16 = 22;
}

const APPLICATION: &str = "disk-cpu-load";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Parsed configuration file. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub load: LoadSection,
    pub ssh: SshSection,
}

/// `[load]` table.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct LoadSection {
    pub max_load: Option<u32>,
    pub xfer_mib: Option<u64>,
    pub device: Option<String>,
    pub dd_program: Option<String>,
    pub stat_path: Option<PathBuf>,
}

/// `[ssh]` table.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct SshSection {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub identity_file: Option<String>,
    pub connect_timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Parse TOML content. `origin` is only used in error messages.
    pub fn parse(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Read and parse a configuration file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        Self::parse(&content, path)
    }

    /// Load the explicit file if given, else the default file if it exists.
    ///
    /// A missing explicit file is an error; a missing default file yields an
    /// empty configuration.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            debug!(path = %path.display(), "Loading explicit config file");
            return Self::load_from(path);
        }

        match default_config_path() {
            Some(path) if path.is_file() => {
                debug!(path = %path.display(), "Loading default config file");
                Self::load_from(&path)
            }
            _ => Ok(Self::default()),
        }
    }
}

/// `<config dir>/disk-cpu-load/config.toml` for the current user.
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APPLICATION)
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

/// Expand a leading `~` in a user-supplied path.
pub fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}
