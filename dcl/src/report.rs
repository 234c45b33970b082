//! User-facing output.
//!
//! [`Reporter`] writes the human-readable report to stdout (or any writer in
//! tests). [`LoadReport`] is the machine-readable form written by `--report`.

use crate::config::TestConfig;
use crate::driver::{Measurement, Verdict};
use chrono::{DateTime, Utc};
use dcl_telemetry::LoadBreakdown;
use serde::Serialize;
use std::fmt::Display;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Line-oriented report writer.
pub struct Reporter<W: Write> {
    out: W,
    verbose: bool,
}

impl Reporter<io::Stdout> {
    pub fn stdout(verbose: bool) -> Self {
        Self::new(io::stdout(), verbose)
    }
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, verbose: bool) -> Self {
        Self { out, verbose }
    }

    /// Print a line unconditionally.
    pub fn line(&mut self, message: impl Display) {
        // A closed stdout must not abort the measurement.
        let _ = writeln!(self.out, "{message}");
    }

    /// Print a line only in verbose mode.
    pub fn verbose(&mut self, message: impl Display) {
        if self.verbose {
            self.line(message);
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write report to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Machine-readable result of one load test.
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub timestamp: DateTime<Utc>,
    pub device: PathBuf,
    pub xfer_mib: u64,
    pub max_load: u32,
    pub load: i64,
    pub verdict: Verdict,
    pub breakdown: LoadBreakdown,
    pub disk_read_ms: u64,
    pub throughput_mib_s: f64,
}

impl LoadReport {
    pub fn new(config: &TestConfig, measurement: &Measurement, verdict: Verdict) -> Self {
        Self {
            timestamp: Utc::now(),
            device: config.device.clone(),
            xfer_mib: config.xfer_mib,
            max_load: config.max_load,
            load: measurement.breakdown.percent,
            verdict,
            breakdown: measurement.breakdown,
            disk_read_ms: measurement.read.elapsed_ms(),
            throughput_mib_s: measurement.read.throughput_mib_per_sec(),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_to(&self, path: &Path) -> Result<(), ReportError> {
        let json = self.to_json_pretty()?;
        std::fs::write(path, json + "\n").map_err(|source| ReportError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}
