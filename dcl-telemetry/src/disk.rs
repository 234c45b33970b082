//! Sequential raw disk read used to generate CPU load.
//!
//! The read is delegated to `dd`, which copies `count` blocks of 1 MiB from
//! the device to `/dev/null`. Standard output is discarded and standard
//! error is kept so a failed read can be explained to the user.

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Block size passed to `dd` (1 MiB).
pub const BLOCK_SIZE_BYTES: u64 = 1_048_576;

const NULL_SINK: &str = "/dev/null";

/// Errors from the external disk-read command.
#[derive(Debug, Error)]
pub enum DiskReadError {
    #[error("failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' {}", describe_exit(.code))]
    CommandFailed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
}

impl DiskReadError {
    /// The command that failed.
    pub fn program(&self) -> &str {
        match self {
            Self::Spawn { program, .. } | Self::CommandFailed { program, .. } => program,
        }
    }

    /// The diagnostic text to show the user: captured stderr when the
    /// command ran, the launch error otherwise.
    pub fn diagnostic(&self) -> String {
        match self {
            Self::Spawn { source, .. } => source.to_string(),
            Self::CommandFailed { stderr, .. } if !stderr.is_empty() => stderr.clone(),
            Self::CommandFailed { code, .. } => describe_exit(code),
        }
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with status {code}"),
        None => "was terminated by a signal".to_string(),
    }
}

/// What to read and how much.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskReadRequest {
    pub device: PathBuf,
    /// Transfer size in MiB; also the `dd` block count.
    pub xfer_mib: u64,
}

impl DiskReadRequest {
    pub fn new(device: impl Into<PathBuf>, xfer_mib: u64) -> Self {
        Self {
            device: device.into(),
            xfer_mib,
        }
    }

    pub fn bytes(&self) -> u64 {
        self.xfer_mib.saturating_mul(BLOCK_SIZE_BYTES)
    }
}

/// Outcome of a successful read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiskReadStats {
    pub bytes_requested: u64,
    pub elapsed: Duration,
}

impl DiskReadStats {
    /// Requested MiB per second. A device shorter than the request makes this
    /// an upper bound.
    pub fn throughput_mib_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        (self.bytes_requested as f64 / BLOCK_SIZE_BYTES as f64) / secs
    }

    /// Elapsed wall time in milliseconds, saturating at `u64::MAX`.
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Something that performs the blocking disk read.
pub trait DiskReader {
    fn read(&self, request: &DiskReadRequest) -> Result<DiskReadStats, DiskReadError>;
}

/// Runs `dd if=<device> of=/dev/null bs=1048576 count=<xfer>`.
#[derive(Debug, Clone)]
pub struct DdReader {
    program: String,
}

impl DdReader {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Arguments for one read.
    pub fn args(request: &DiskReadRequest) -> Vec<OsString> {
        let mut input = OsString::from("if=");
        input.push(request.device.as_os_str());

        vec![
            input,
            OsString::from(format!("of={NULL_SINK}")),
            OsString::from(format!("bs={BLOCK_SIZE_BYTES}")),
            OsString::from(format!("count={}", request.xfer_mib)),
        ]
    }
}

impl Default for DdReader {
    fn default() -> Self {
        Self::new("dd")
    }
}

impl DiskReader for DdReader {
    fn read(&self, request: &DiskReadRequest) -> Result<DiskReadStats, DiskReadError> {
        debug!(
            program = %self.program,
            device = %request.device.display(),
            xfer_mib = request.xfer_mib,
            "Starting disk read"
        );

        let start = Instant::now();
        let output = Command::new(&self.program)
            .args(Self::args(request))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| DiskReadError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        let elapsed = start.elapsed();

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim_end().to_string();
            warn!(
                program = %self.program,
                code = ?output.status.code(),
                stderr = %stderr,
                "Disk read command failed"
            );
            return Err(DiskReadError::CommandFailed {
                program: self.program.clone(),
                code: output.status.code(),
                stderr,
            });
        }

        let stats = DiskReadStats {
            bytes_requested: request.bytes(),
            elapsed,
        };
        info!(
            device = %request.device.display(),
            elapsed_ms = stats.elapsed_ms(),
            throughput_mib_s = stats.throughput_mib_per_sec(),
            "Disk read complete"
        );
        Ok(stats)
    }
}
