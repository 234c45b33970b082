//! Shared building blocks for the disk-cpu-load workspace.
//!
//! - [`logging`]: tracing subscriber setup used by both binaries
//! - [`config`]: the optional TOML configuration file and built-in defaults
//! - [`secret`]: a string wrapper that never prints its contents

pub mod config;
pub mod logging;
pub mod secret;

pub use config::{ConfigError, FileConfig, LoadSection, SshSection, defaults, expand_path};
pub use logging::{LogConfig, LogFormat, LoggingError, LoggingGuards, init_logging};
pub use secret::Secret;
