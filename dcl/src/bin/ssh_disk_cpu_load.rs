//! ssh-disk-cpu-load: SSH connectivity probe followed by the disk CPU load test.

#![forbid(unsafe_code)]

use anyhow::Result;
use dcl::app;
use dcl::cli::{SshDiskCpuLoadCli, parse_or_exit};
use dcl::config::SshSettings;
use dcl::credentials;
use dcl::report::Reporter;
use dcl::ssh::{OpenSshClient, askpass};
use dcl_common::{LogConfig, init_logging};
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    // `ssh` runs us as its askpass helper during the password flow.
    if let Some(code) = askpass::answer_if_requested() {
        return Ok(ExitCode::from(code));
    }

    let cli: SshDiskCpuLoadCli = parse_or_exit();

    let mut log_config = LogConfig::from_env("warn").with_stderr();
    if cli.load.verbose {
        log_config = log_config.with_level("debug");
    }
    let _logging_guards = init_logging(&log_config)?;

    let file = app::load_config(&cli.load)?;
    let mut reporter = Reporter::stdout(cli.load.verbose);

    // An unknown device ends the run before anyone is asked for a password.
    let config =
        match app::resolve_test_config("ssh-disk-cpu-load", &cli.load, &file.load, &mut reporter)
        {
            Ok(config) => config,
            Err(code) => return Ok(ExitCode::from(code)),
        };

    let settings = SshSettings::resolve(&cli.ssh, &file.ssh);
    app::run_ssh_probe(
        &settings,
        OpenSshClient::default(),
        credentials::default_provider(),
        &mut reporter,
    );

    Ok(ExitCode::from(app::run_load_test(&config, &mut reporter)))
}
