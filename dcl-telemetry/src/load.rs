//! CPU load between two counter snapshots.
//!
//! The load is the share of elapsed CPU time that was not idle:
//!
//! ```text
//! elapsed = sum(after) - sum(before)
//! used    = elapsed - (after[3] - before[3])
//! load    = used * 100 / elapsed        (0 when elapsed == 0)
//! ```
//!
//! Arithmetic is signed and integer. The result is not clamped, so counters
//! that went backwards show up as a value outside 0..=100.

use crate::collect::cpu::CpuSnapshot;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Intermediate quantities of one load computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBreakdown {
    /// Sum of all buckets in the first snapshot.
    pub start_total: u64,
    /// Sum of all buckets in the second snapshot.
    pub end_total: u64,
    pub idle_delta: i64,
    /// Non-idle time between the snapshots.
    pub used: i64,
    /// Total time between the snapshots.
    pub elapsed: i64,
    /// Load percentage, truncated toward zero.
    pub percent: i64,
}

impl LoadBreakdown {
    pub fn between(before: &CpuSnapshot, after: &CpuSnapshot) -> Self {
        let start_total = before.total();
        let end_total = after.total();

        let idle_delta = i128::from(after.idle()) - i128::from(before.idle());
        let elapsed = i128::from(end_total) - i128::from(start_total);
        let used = elapsed - idle_delta;

        let percent = if elapsed == 0 {
            0
        } else {
            used * 100 / elapsed
        };

        let breakdown = Self {
            start_total,
            end_total,
            idle_delta: narrow(idle_delta),
            used: narrow(used),
            elapsed: narrow(elapsed),
            percent: narrow(percent),
        };

        debug!(
            start_total = breakdown.start_total,
            end_total = breakdown.end_total,
            used = breakdown.used,
            elapsed = breakdown.elapsed,
            percent = breakdown.percent,
            "Computed cpu load"
        );

        breakdown
    }

    /// True when the percentage lies outside 0..=100 (counter reset or swapped snapshots).
    pub fn is_out_of_range(&self) -> bool {
        !(0..=100).contains(&self.percent)
    }

    /// True when the exact ratio `used * 100 / elapsed` is above `max_load`.
    ///
    /// Compared by cross-multiplication, so 30.5 exceeds 30 even though
    /// `percent` reads 30.
    pub fn exceeds(&self, max_load: u32) -> bool {
        let scaled_used = i128::from(self.used) * 100;
        let limit = i128::from(max_load) * i128::from(self.elapsed);
        match self.elapsed.signum() {
            0 => false,
            1 => scaled_used > limit,
            _ => scaled_used < limit,
        }
    }
}

/// Load percentage between `before` and `after`.
pub fn compute_load(before: &CpuSnapshot, after: &CpuSnapshot) -> i64 {
    LoadBreakdown::between(before, after).percent
}

fn narrow(value: i128) -> i64 {
    i64::try_from(value).unwrap_or(if value < 0 { i64::MIN } else { i64::MAX })
}
