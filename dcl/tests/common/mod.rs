pub mod assertions;

pub use assertions::assert_contains;
pub use logging::init_test_logging;

use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Counter line that never changes, so every run measures a load of 0.
pub const STATIC_PROC_STAT: &str = "cpu  100 50 30 800 0 0 0 0 0 0\ncpu0 100 50 30 800 0 0 0 0 0 0\n";

/// Scratch directory that doubles as an empty config home.
pub struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("Failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content).expect("Failed to write sandbox file");
        path
    }

    pub fn static_stat(&self) -> PathBuf {
        self.write("stat", STATIC_PROC_STAT)
    }

    /// `bin` isolated from the caller's environment and config file.
    pub fn command(&self, bin: &str) -> Command {
        let mut cmd = Command::new(bin);
        cmd.env("XDG_CONFIG_HOME", self.dir.path())
            .env("HOME", self.dir.path());
        for var in [
            "DCL_CONFIG",
            "DCL_DD_PROGRAM",
            "DCL_STAT_PATH",
            "DCL_SSH_HOST",
            "DCL_SSH_PORT",
            "DCL_SSH_USER",
            "DCL_SSH_KEY",
            "DCL_SSH_CONNECT_TIMEOUT",
            "DCL_SSH_PASSWORD",
            "DCL_ASKPASS_MODE",
            "DCL_ASKPASS_SECRET",
            "DCL_LOG",
            "DCL_LOG_FILE",
        ] {
            cmd.env_remove(var);
        }
        cmd
    }
}
