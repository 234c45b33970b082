//! The load test itself: counters before, disk read, counters after, verdict.
//!
//! Each collaborator is called exactly once and in that order. A failure in
//! any of them ends the test before the verdict.

use crate::config::TestConfig;
use crate::report::Reporter;
use crate::{EXIT_FAILURE, EXIT_SUCCESS};
use dcl_telemetry::{
    CpuCounterSource, CpuError, DiskReadError, DiskReadRequest, DiskReadStats, DiskReader,
    LoadBreakdown,
};
use serde::Serialize;
use std::io::Write;
use thiserror::Error;
use tracing::{info, warn};

pub const FAILURE_BANNER: &str = "*** DISK CPU LOAD TEST HAS FAILED! ***";

/// Pass/fail outcome of the load test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Pass,
    Fail,
}

impl Verdict {
    /// A load strictly above the threshold fails. The untruncated ratio is
    /// compared, so a 30.5% load fails a threshold of 30.
    pub fn decide(breakdown: &LoadBreakdown, max_load: u32) -> Self {
        if breakdown.exceeds(max_load) {
            Self::Fail
        } else {
            Self::Pass
        }
    }

    pub fn is_pass(self) -> bool {
        self == Self::Pass
    }

    pub fn exit_code(self) -> u8 {
        match self {
            Self::Pass => EXIT_SUCCESS,
            Self::Fail => EXIT_FAILURE,
        }
    }
}

/// Everything measured during one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub breakdown: LoadBreakdown,
    pub read: DiskReadStats,
}

/// Fatal errors of the measure stage.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Counters(#[from] CpuError),

    #[error(transparent)]
    DiskRead(#[from] DiskReadError),
}

impl DriverError {
    /// Print the error the way the user sees it.
    pub fn report<W: Write>(&self, reporter: &mut Reporter<W>) {
        match self {
            Self::DiskRead(err) => {
                reporter.line(format!("Error executing the '{}' command:", err.program()));
                reporter.line(err.diagnostic());
            }
            Self::Counters(err) => {
                reporter.line("Error reading CPU counters:");
                reporter.line(err);
            }
        }
    }

    pub fn exit_code(&self) -> u8 {
        EXIT_FAILURE
    }
}

/// One load test over a counter source and a disk reader.
pub struct LoadTest<'a, S, D> {
    config: &'a TestConfig,
    source: S,
    reader: D,
}

impl<'a, S: CpuCounterSource, D: DiskReader> LoadTest<'a, S, D> {
    pub fn new(config: &'a TestConfig, source: S, reader: D) -> Self {
        Self {
            config,
            source,
            reader,
        }
    }

    /// Announce, measure and decide.
    pub fn run<W: Write>(
        &mut self,
        reporter: &mut Reporter<W>,
    ) -> Result<(Measurement, Verdict), DriverError> {
        reporter.line(format!(
            "Testing CPU load when reading {} MiB from {}",
            self.config.xfer_mib,
            self.config.device.display()
        ));
        reporter.line(format!(
            "Maximum acceptable CPU load is {}",
            self.config.max_load
        ));

        let measurement = self.measure(reporter)?;
        let verdict = self.verdict(&measurement, reporter);
        Ok((measurement, verdict))
    }

    /// Counters before, disk read, counters after.
    pub fn measure<W: Write>(
        &mut self,
        reporter: &mut Reporter<W>,
    ) -> Result<Measurement, DriverError> {
        let before = self.source.snapshot()?;

        reporter.verbose("Beginning disk read....");
        let request = DiskReadRequest::new(&self.config.device, self.config.xfer_mib);
        let read = self.reader.read(&request)?;
        reporter.verbose("Disk read complete!");

        let after = self.source.snapshot()?;
        let breakdown = LoadBreakdown::between(&before, &after);

        reporter.verbose(format!("Start CPU time = {}", breakdown.start_total));
        reporter.verbose(format!("End CPU time = {}", breakdown.end_total));
        reporter.verbose(format!("CPU time used = {}", breakdown.used));
        reporter.verbose(format!("Total elapsed time = {}", breakdown.elapsed));

        if breakdown.is_out_of_range() {
            warn!(
                percent = breakdown.percent,
                "CPU load outside 0..=100; counters were reset or sampled out of order"
            );
        }

        Ok(Measurement { breakdown, read })
    }

    fn verdict<W: Write>(&self, measurement: &Measurement, reporter: &mut Reporter<W>) -> Verdict {
        let load = measurement.breakdown.percent;
        reporter.line(format!("Detected disk read CPU load is {load}"));

        let verdict = Verdict::decide(&measurement.breakdown, self.config.max_load);
        if !verdict.is_pass() {
            reporter.line(FAILURE_BANNER);
        }

        info!(
            load,
            max_load = self.config.max_load,
            verdict = ?verdict,
            "Disk CPU load test finished"
        );
        verdict
    }
}
