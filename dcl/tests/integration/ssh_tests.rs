#![cfg(unix)]

use crate::common::assertions::assert_not_contains;
use crate::common::{Sandbox, assert_contains, init_test_logging};

const BIN: &str = env!("CARGO_BIN_EXE_ssh-disk-cpu-load");

#[test]
fn test_skip_ssh_runs_only_load_test() {
    init_test_logging();
    crate::test_log!("TEST START: test_skip_ssh_runs_only_load_test");

    let sandbox = Sandbox::new();
    let stat = sandbox.static_stat();
    let output = sandbox
        .command(BIN)
        .args(["--skip-ssh", "--ssh-host", "bench.example.com"])
        .args(["--xfer", "1", "--dd-program", "true", "--stat-path"])
        .arg(&stat)
        .arg("null")
        .output()
        .expect("Failed to run ssh-disk-cpu-load");

    assert!(output.status.success(), "expected pass: {output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_contains(&stdout, "SSH probe skipped: SSH probe disabled with --skip-ssh");
    assert_contains(&stdout, "Detected disk read CPU load is 0");
    crate::test_log!("TEST PASS: test_skip_ssh_runs_only_load_test");
}

#[test]
fn test_missing_host_skips_probe() {
    init_test_logging();

    let sandbox = Sandbox::new();
    let stat = sandbox.static_stat();
    let output = sandbox
        .command(BIN)
        .args(["--xfer", "1", "--dd-program", "true", "--stat-path"])
        .arg(&stat)
        .arg("null")
        .output()
        .expect("Failed to run ssh-disk-cpu-load");

    assert!(output.status.success());
    assert_contains(&String::from_utf8_lossy(&output.stdout), "--ssh-host");
}

#[test]
fn test_failed_probe_does_not_decide_exit_code() {
    init_test_logging();

    let sandbox = Sandbox::new();
    let stat = sandbox.static_stat();
    let output = sandbox
        .command(BIN)
        .env("DCL_SSH_PASSWORD", "not-the-password")
        .args(["--ssh-host", "127.0.0.1", "--ssh-port", "1", "--ssh-user", "nobody"])
        .args(["--ssh-connect-timeout", "2"])
        .args(["--xfer", "1", "--dd-program", "true", "--stat-path"])
        .arg(&stat)
        .arg("null")
        .output()
        .expect("Failed to run ssh-disk-cpu-load");

    let stdout = String::from_utf8_lossy(&output.stdout);
    // Connection refused, or no ssh client installed.
    assert!(
        stdout.contains("SSH connection failed:") || stdout.contains("An error occurred:"),
        "expected a probe failure, got: {stdout}"
    );
    assert_not_contains(&stdout, "SSH connection established");
    assert_contains(&stdout, "Detected disk read CPU load is 0");
    assert!(output.status.success(), "load test decides the exit code");
}

#[test]
fn test_unknown_device_stops_before_ssh() {
    init_test_logging();
    crate::test_log!("TEST START: test_unknown_device_stops_before_ssh");

    let sandbox = Sandbox::new();
    let output = sandbox
        .command(BIN)
        .env("DCL_SSH_PASSWORD", "x")
        .args(["--ssh-host", "127.0.0.1", "--ssh-port", "1", "--ssh-user", "nobody"])
        .arg("dcl-no-such-device")
        .output()
        .expect("Failed to run ssh-disk-cpu-load");

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout,
        "Unknown block device \"/dev/dcl-no-such-device\"\n\
         Usage: ssh-disk-cpu-load [ --max-load <load> ] [ --xfer <mebibytes> ] [ device-file ]\n"
    );
    assert_not_contains(&stdout, "SSH");
    crate::test_log!("TEST PASS: test_unknown_device_stops_before_ssh");
}

#[test]
fn test_askpass_mode_prints_secret() {
    init_test_logging();

    let sandbox = Sandbox::new();
    let output = sandbox
        .command(BIN)
        .env("DCL_ASKPASS_MODE", "1")
        .env("DCL_ASKPASS_SECRET", "s3cret")
        .arg("nobody@127.0.0.1's password: ")
        .output()
        .expect("Failed to run ssh-disk-cpu-load in askpass mode");

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "s3cret\n");
}

#[test]
fn test_ssh_flags_rejected_by_plain_binary() {
    init_test_logging();

    let sandbox = Sandbox::new();
    let output = sandbox
        .command(env!("CARGO_BIN_EXE_disk-cpu-load"))
        .args(["--ssh-host", "bench.example.com"])
        .output()
        .expect("Failed to run disk-cpu-load");

    assert_eq!(output.status.code(), Some(1));
}
