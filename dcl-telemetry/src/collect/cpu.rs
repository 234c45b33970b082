//! Aggregate CPU counters from /proc/stat.
//!
//! A snapshot is the ordered list of time buckets on the aggregate `cpu`
//! line (user, nice, system, idle, iowait, irq, softirq, steal, ...). No
//! meaning is attached to a bucket beyond its position, except that index 3
//! is always the idle counter.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, trace};

/// Position of the idle bucket on the aggregate cpu line.
pub const IDLE_INDEX: usize = 3;

/// Label of the aggregate line (per-core lines are `cpu0`, `cpu1`, ...).
const AGGREGATE_LABEL: &str = "cpu";

/// Errors that can occur while sampling CPU counters.
#[derive(Error, Debug)]
pub enum CpuError {
    #[error("failed to read {path}: {source}")]
    ReadStat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no aggregate cpu line found in {0}")]
    MissingAggregateLine(String),

    #[error("malformed cpu counter {token:?} at position {position}")]
    MalformedInput { position: usize, token: String },
}

/// One capture of the aggregate CPU counters. Values are in clock ticks since boot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CpuSnapshot {
    counters: Vec<u64>,
}

impl CpuSnapshot {
    pub fn new(counters: Vec<u64>) -> Self {
        Self { counters }
    }

    /// Parse a whitespace-separated counter line such as `100 50 30 800 0 0 0 0`.
    ///
    /// The line must not carry the `cpu` label. Empty input gives an empty
    /// snapshot.
    pub fn parse_counters(line: &str) -> Result<Self, CpuError> {
        let counters = line
            .split_whitespace()
            .enumerate()
            .map(|(position, token)| {
                token.parse::<u64>().map_err(|_| CpuError::MalformedInput {
                    position,
                    token: token.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        trace!(fields = counters.len(), "Parsed cpu counter line");
        Ok(Self { counters })
    }

    /// Parse full /proc/stat content, using only the aggregate `cpu` line.
    pub fn parse_proc_stat(content: &str) -> Result<Self, CpuError> {
        let line = aggregate_counter_line(content)
            .ok_or_else(|| CpuError::MissingAggregateLine("/proc/stat content".to_string()))?;
        Self::parse_counters(line)
    }

    pub fn counters(&self) -> &[u64] {
        &self.counters
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// The idle bucket, or 0 when the snapshot has fewer than four fields.
    pub fn idle(&self) -> u64 {
        self.counters.get(IDLE_INDEX).copied().unwrap_or(0)
    }

    /// Sum of all buckets.
    pub fn total(&self) -> u64 {
        self.counters
            .iter()
            .fold(0u64, |acc, value| acc.saturating_add(*value))
    }
}

impl FromStr for CpuSnapshot {
    type Err = CpuError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_counters(s)
    }
}

/// Return the counters of the aggregate `cpu` line, label stripped.
pub fn aggregate_counter_line(content: &str) -> Option<&str> {
    content.lines().find_map(|line| {
        let trimmed = line.trim_start();
        let rest = trimmed.strip_prefix(AGGREGATE_LABEL)?;
        // "cpu0 ..." is a per-core line, not the aggregate.
        if rest.is_empty() || rest.starts_with(char::is_whitespace) {
            Some(rest.trim())
        } else {
            None
        }
    })
}

/// Where CPU counters come from.
pub trait CpuCounterSource {
    /// Read the current aggregate counter line, without the `cpu` label.
    fn read_counter_line(&mut self) -> Result<String, CpuError>;

    /// Read and parse a snapshot.
    fn snapshot(&mut self) -> Result<CpuSnapshot, CpuError> {
        let line = self.read_counter_line()?;
        CpuSnapshot::parse_counters(&line)
    }
}

/// Reads the live counters from a /proc/stat formatted file.
#[derive(Debug, Clone)]
pub struct ProcStatSource {
    path: PathBuf,
}

impl ProcStatSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for ProcStatSource {
    fn default() -> Self {
        Self::new("/proc/stat")
    }
}

impl CpuCounterSource for ProcStatSource {
    fn read_counter_line(&mut self) -> Result<String, CpuError> {
        let content = std::fs::read_to_string(&self.path).map_err(|source| CpuError::ReadStat {
            path: self.path.clone(),
            source,
        })?;

        let line = aggregate_counter_line(&content)
            .ok_or_else(|| CpuError::MissingAggregateLine(self.path.display().to_string()))?;

        debug!(path = %self.path.display(), counters = line, "Read aggregate cpu counters");
        Ok(line.to_string())
    }
}
