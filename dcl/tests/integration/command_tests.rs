#![cfg(unix)]

use std::path::Path;

use crate::common::assertions::assert_not_contains;
use crate::common::{Sandbox, assert_contains, init_test_logging};

const BIN: &str = env!("CARGO_BIN_EXE_disk-cpu-load");

#[test]
fn test_help_exits_zero() {
    init_test_logging();
    crate::test_log!("TEST START: test_help_exits_zero");

    let sandbox = Sandbox::new();
    let output = sandbox
        .command(BIN)
        .arg("--help")
        .output()
        .expect("Failed to run disk-cpu-load --help");

    assert!(output.status.success(), "--help failed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_contains(&stdout, "--max-load");
    assert_contains(&stdout, "--xfer");
    assert_contains(&stdout, "DEVICE-FILE");
    crate::test_log!("TEST PASS: test_help_exits_zero");
}

#[test]
fn test_unknown_device_exits_one_with_usage() {
    init_test_logging();

    let sandbox = Sandbox::new();
    let output = sandbox
        .command(BIN)
        .arg("dcl-no-such-device")
        .output()
        .expect("Failed to run disk-cpu-load");

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_contains(&stdout, "Unknown block device \"/dev/dcl-no-such-device\"");
    assert_contains(
        &stdout,
        "Usage: disk-cpu-load [ --max-load <load> ] [ --xfer <mebibytes> ] [ device-file ]",
    );
    assert_not_contains(&stdout, "Testing CPU load");
}

#[test]
fn test_non_integer_max_load_is_usage_error() {
    init_test_logging();

    let sandbox = Sandbox::new();
    let output = sandbox
        .command(BIN)
        .args(["--max-load", "high", "null"])
        .output()
        .expect("Failed to run disk-cpu-load");

    assert_eq!(output.status.code(), Some(1));
    assert_contains(&String::from_utf8_lossy(&output.stderr), "--max-load");
}

#[test]
fn test_failed_disk_read_exits_one() {
    init_test_logging();
    crate::test_log!("TEST START: test_failed_disk_read_exits_one");

    let sandbox = Sandbox::new();
    let stat = sandbox.static_stat();
    let output = sandbox
        .command(BIN)
        .args(["--xfer", "1", "--dd-program", "false", "--stat-path"])
        .arg(&stat)
        .arg("null")
        .output()
        .expect("Failed to run disk-cpu-load");

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_contains(&stdout, "Testing CPU load when reading 1 MiB from /dev/null");
    assert_contains(&stdout, "Error executing the 'false' command:");
    assert_not_contains(&stdout, "Detected disk read CPU load");
    crate::test_log!("TEST PASS: test_failed_disk_read_exits_one");
}

#[test]
fn test_dd_program_from_environment() {
    init_test_logging();

    let sandbox = Sandbox::new();
    let stat = sandbox.static_stat();
    let output = sandbox
        .command(BIN)
        .env("DCL_DD_PROGRAM", "false")
        .env("DCL_STAT_PATH", &stat)
        .args(["--xfer", "1", "/dev/null"])
        .output()
        .expect("Failed to run disk-cpu-load");

    assert_eq!(output.status.code(), Some(1));
    assert_contains(
        &String::from_utf8_lossy(&output.stdout),
        "Error executing the 'false' command:",
    );
}

#[test]
fn test_zero_load_passes() {
    init_test_logging();

    let sandbox = Sandbox::new();
    let stat = sandbox.static_stat();
    let output = sandbox
        .command(BIN)
        .args(["--max-load", "0", "--xfer", "1", "--dd-program", "true", "--stat-path"])
        .arg(&stat)
        .arg("null")
        .output()
        .expect("Failed to run disk-cpu-load");

    assert!(output.status.success(), "expected pass: {output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout,
        "Testing CPU load when reading 1 MiB from /dev/null\n\
         Maximum acceptable CPU load is 0\n\
         Detected disk read CPU load is 0\n"
    );
}

#[test]
fn test_verbose_output() {
    init_test_logging();

    let sandbox = Sandbox::new();
    let stat = sandbox.static_stat();
    let output = sandbox
        .command(BIN)
        .args(["-v", "--xfer", "1", "--dd-program", "true", "--stat-path"])
        .arg(&stat)
        .arg("null")
        .output()
        .expect("Failed to run disk-cpu-load");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for line in [
        "Beginning disk read....",
        "Disk read complete!",
        "Start CPU time = 980",
        "End CPU time = 980",
        "CPU time used = 0",
        "Total elapsed time = 0",
    ] {
        assert_contains(&stdout, line);
    }
}

#[test]
fn test_report_file_written() {
    init_test_logging();

    let sandbox = Sandbox::new();
    let stat = sandbox.static_stat();
    let report = sandbox.path().join("result.json");
    let output = sandbox
        .command(BIN)
        .args(["--xfer", "1", "--dd-program", "true", "--stat-path"])
        .arg(&stat)
        .arg("--report")
        .arg(&report)
        .arg("null")
        .output()
        .expect("Failed to run disk-cpu-load");

    assert!(output.status.success());
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report).expect("report exists"))
            .expect("report is JSON");
    assert_eq!(json["device"], "/dev/null");
    assert_eq!(json["xfer_mib"], 1);
    assert_eq!(json["max_load"], 30);
    assert_eq!(json["load"], 0);
    assert_eq!(json["verdict"], "pass");
}

#[test]
fn test_real_read_of_dev_zero() {
    init_test_logging();
    if !Path::new("/proc/stat").exists() {
        crate::test_log!("SKIP: /proc/stat not available");
        return;
    }

    let sandbox = Sandbox::new();
    let output = sandbox
        .command(BIN)
        .args(["--max-load", "100", "--xfer", "1", "zero"])
        .output()
        .expect("Failed to run disk-cpu-load");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_contains(&stdout, "Testing CPU load when reading 1 MiB from /dev/zero");
    assert_contains(&stdout, "Detected disk read CPU load is ");
    assert!(matches!(output.status.code(), Some(0 | 1)));
}
