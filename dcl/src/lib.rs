//! disk-cpu-load: how much CPU does a raw sequential disk read cost?
//!
//! Both binaries follow the same three stages:
//!
//! 1. **ParseArgs**: [`cli`] parses the command line, [`config`] layers it
//!    over the configuration file into an immutable [`config::TestConfig`].
//! 2. **Measure**: [`driver`] samples CPU counters, runs the disk read and
//!    samples again. `ssh-disk-cpu-load` first runs the [`ssh`] probe.
//! 3. **Verdict**: the load is compared against the threshold and mapped to
//!    the process exit code.

pub mod app;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod driver;
pub mod report;
pub mod ssh;

/// Exit code for a passing test.
pub const EXIT_SUCCESS: u8 = 0;
/// Exit code for a failed test, a failed disk read, an unknown device or a usage error.
pub const EXIT_FAILURE: u8 = 1;
