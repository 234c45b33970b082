//! disk-cpu-load: CPU load of a raw sequential disk read.

#![forbid(unsafe_code)]

use anyhow::Result;
use dcl::app;
use dcl::cli::{DiskCpuLoadCli, parse_or_exit};
use dcl::report::Reporter;
use dcl_common::{LogConfig, init_logging};
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    let cli: DiskCpuLoadCli = parse_or_exit();

    let mut log_config = LogConfig::from_env("warn").with_stderr();
    if cli.load.verbose {
        log_config = log_config.with_level("debug");
    }
    let _logging_guards = init_logging(&log_config)?;

    let file = app::load_config(&cli.load)?;
    let mut reporter = Reporter::stdout(cli.load.verbose);
    let config =
        match app::resolve_test_config("disk-cpu-load", &cli.load, &file.load, &mut reporter) {
            Ok(config) => config,
            Err(code) => return Ok(ExitCode::from(code)),
        };

    Ok(ExitCode::from(app::run_load_test(&config, &mut reporter)))
}
