//! [`SshConnector`] backed by the system OpenSSH client.
//!
//! Each attempt runs `ssh ... user@host true`. The password is never put on
//! the command line: `ssh` asks for it through `SSH_ASKPASS`, which points
//! back at this executable running in askpass mode (see [`super::askpass`]).

use super::askpass::{ASKPASS_MODE_ENV, ASKPASS_SECRET_ENV};
use super::{Credential, SshConnector, SshError, SshTarget};
use std::ffi::OsString;
use std::process::{Command, Stdio};
use tracing::debug;

/// Exit status `ssh` uses for its own errors, as opposed to the remote command's.
const SSH_ERROR_STATUS: i32 = 255;

const AUTH_FAILURE_MARKERS: &[&str] = &[
    "Permission denied",
    "Too many authentication failures",
    "Authentication failed",
];

#[derive(Debug, Clone)]
pub struct OpenSshClient {
    program: String,
}

impl Default for OpenSshClient {
    fn default() -> Self {
        Self::new("ssh")
    }
}

impl OpenSshClient {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments for one attempt, excluding environment.
    pub fn args(target: &SshTarget, credential: &Credential<'_>) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        let mut option = |value: String| {
            args.push("-o".into());
            args.push(value.into());
        };

        option("StrictHostKeyChecking=accept-new".to_string());
        option("LogLevel=ERROR".to_string());
        if let Some(timeout) = target.connect_timeout {
            option(format!("ConnectTimeout={}", timeout.as_secs().max(1)));
        }

        match credential {
            Credential::Password(_) => {
                option("BatchMode=no".to_string());
                option("PubkeyAuthentication=no".to_string());
                option("PreferredAuthentications=password,keyboard-interactive".to_string());
                option("NumberOfPasswordPrompts=1".to_string());
            }
            Credential::Key(_) => {
                option("BatchMode=yes".to_string());
                option("PasswordAuthentication=no".to_string());
                option("PreferredAuthentications=publickey".to_string());
                option("IdentitiesOnly=yes".to_string());
            }
        }

        if let Credential::Key(key) = credential {
            args.push("-i".into());
            args.push(key.as_os_str().to_owned());
        }

        args.push("-p".into());
        args.push(target.port.to_string().into());
        args.push(target.destination().into());
        args.push("true".into());
        args
    }

    fn command(&self, target: &SshTarget, credential: &Credential<'_>) -> Result<Command, SshError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(Self::args(target, credential));
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        if let Credential::Password(secret) = credential {
            let askpass = std::env::current_exe().map_err(|err| {
                SshError::Other(format!("cannot locate askpass helper: {err}"))
            })?;
            cmd.env("SSH_ASKPASS", askpass)
                .env("SSH_ASKPASS_REQUIRE", "force")
                .env(ASKPASS_MODE_ENV, "1")
                .env(ASKPASS_SECRET_ENV, secret.expose());
        }
        Ok(cmd)
    }
}

impl SshConnector for OpenSshClient {
    fn connect(&self, target: &SshTarget, credential: Credential<'_>) -> Result<(), SshError> {
        if let Credential::Key(key) = credential {
            if !key.is_file() {
                return Err(SshError::Other(format!(
                    "private key file not found: {}",
                    key.display()
                )));
            }
        }

        let mut cmd = self.command(target, &credential)?;
        debug!(
            program = %self.program,
            destination = %target.destination(),
            method = %credential.method(),
            "Running ssh"
        );

        let output = cmd
            .output()
            .map_err(|err| SshError::Other(format!("failed to run '{}': {err}", self.program)))?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        classify(output.status.code(), &stderr)
    }
}

/// Map an `ssh` exit status and its stderr to a probe result.
pub fn classify(code: Option<i32>, stderr: &str) -> Result<(), SshError> {
    let detail = stderr.trim().to_string();
    match code {
        Some(0) => Ok(()),
        Some(SSH_ERROR_STATUS) => {
            if AUTH_FAILURE_MARKERS.iter().any(|marker| detail.contains(marker)) {
                Err(SshError::Auth(detail))
            } else if detail.is_empty() {
                Err(SshError::Protocol("ssh exited with status 255".to_string()))
            } else {
                Err(SshError::Protocol(detail))
            }
        }
        Some(code) => Err(SshError::Other(if detail.is_empty() {
            format!("ssh exited with status {code}")
        } else {
            detail
        })),
        None => Err(SshError::Other("ssh was terminated by a signal".to_string())),
    }
}
