//! Measurement primitives for the disk CPU load test.
//!
//! - [`collect::cpu`]: aggregate CPU counter snapshots and where they come from
//! - [`load`]: the load percentage between two snapshots
//! - [`disk`]: the sequential disk read that generates the load

pub mod collect;
pub mod disk;
pub mod load;

pub use collect::cpu::{CpuCounterSource, CpuError, CpuSnapshot, ProcStatSource};
pub use disk::{DdReader, DiskReadError, DiskReadRequest, DiskReadStats, DiskReader};
pub use load::{LoadBreakdown, compute_load};
