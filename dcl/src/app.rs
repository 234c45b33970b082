//! Entry points shared by both binaries.

use crate::cli::{LoadArgs, usage_line};
use crate::config::{SshSettings, TestConfig, load_file_config};
use crate::credentials::CredentialProvider;
use crate::driver::LoadTest;
use crate::report::{LoadReport, Reporter};
use crate::ssh::{ProbeOutcome, SshConnector, SshProbe};
use crate::EXIT_FAILURE;
use anyhow::Context;
use dcl_common::{FileConfig, LoadSection};
use dcl_telemetry::{DdReader, ProcStatSource};
use std::io::Write;
use tracing::error;

/// Read the configuration file named by `--config`, or the default one.
pub fn load_config(args: &LoadArgs) -> anyhow::Result<FileConfig> {
    load_file_config(args).context("failed to load configuration")
}

/// Resolve the test settings and validate the device.
///
/// On an unknown device the message and usage line are printed and the exit
/// code is returned as the error. Nothing has been measured at that point.
pub fn resolve_test_config<W: Write>(
    program: &str,
    args: &LoadArgs,
    file: &LoadSection,
    reporter: &mut Reporter<W>,
) -> Result<TestConfig, u8> {
    TestConfig::resolve(args, file).map_err(|err| {
        reporter.line(&err);
        reporter.line(usage_line(program));
        EXIT_FAILURE
    })
}

/// Run the load test and return the process exit code.
pub fn run_load_test<W: Write>(config: &TestConfig, reporter: &mut Reporter<W>) -> u8 {
    let source = ProcStatSource::new(&config.stat_path);
    let reader = DdReader::new(config.dd_program.as_str());

    let (measurement, verdict) = match LoadTest::new(config, source, reader).run(reporter) {
        Ok(result) => result,
        Err(err) => {
            err.report(reporter);
            return err.exit_code();
        }
    };

    if let Some(path) = &config.report_path {
        // The verdict stands even if the report cannot be written.
        if let Err(err) = LoadReport::new(config, &measurement, verdict).write_to(path) {
            error!(error = %err, "Could not write JSON report");
        }
    }

    verdict.exit_code()
}

/// Run the SSH probe if it is configured. Never fails the program.
pub fn run_ssh_probe<W, C, P>(
    settings: &SshSettings,
    connector: C,
    credentials: P,
    reporter: &mut Reporter<W>,
) -> Option<ProbeOutcome>
where
    W: Write,
    C: SshConnector,
    P: CredentialProvider,
{
    match settings {
        SshSettings::Skip(reason) => {
            reporter.line(format!("SSH probe skipped: {reason}"));
            None
        }
        SshSettings::Probe(target) => {
            Some(SshProbe::new(target, connector, credentials).run(reporter))
        }
    }
}
