//! SSH connectivity probe run by `ssh-disk-cpu-load` before the load test.
//!
//! Two independent flows are attempted against the same target: password and
//! private key. Failures are printed and recorded, never propagated; the load
//! test runs regardless of the outcome.

pub mod askpass;
pub mod client;

pub use client::OpenSshClient;

use crate::credentials::{CredentialProvider, PASSWORD_PROMPT};
use crate::report::Reporter;
use dcl_common::Secret;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Host the probe connects to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshTarget {
    pub host: String,
    pub port: u16,
    pub user: String,
    /// Private key for the key flow. `None` skips that flow.
    pub identity_file: Option<PathBuf>,
    pub connect_timeout: Option<Duration>,
}

impl SshTarget {
    /// `user@host`, as passed to `ssh`.
    pub fn destination(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    Password,
    Key,
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Password => f.write_str("password"),
            Self::Key => f.write_str("key-based"),
        }
    }
}

/// What a single connection attempt authenticates with.
#[derive(Debug, Clone, Copy)]
pub enum Credential<'a> {
    Password(&'a Secret),
    Key(&'a Path),
}

impl Credential<'_> {
    pub fn method(&self) -> AuthMethod {
        match self {
            Self::Password(_) => AuthMethod::Password,
            Self::Key(_) => AuthMethod::Key,
        }
    }
}

/// Failure of one connection attempt.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SshError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("SSH connection failed: {0}")]
    Protocol(String),

    #[error("An error occurred: {0}")]
    Other(String),
}

impl SshError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Auth(_) => "auth",
            Self::Protocol(_) => "protocol",
            Self::Other(_) => "other",
        }
    }
}

/// Opens (and immediately closes) one authenticated session.
pub trait SshConnector {
    fn connect(&self, target: &SshTarget, credential: Credential<'_>) -> Result<(), SshError>;
}

/// Result of one flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowResult {
    Succeeded,
    Failed(SshError),
    /// Not attempted because nothing was configured for it.
    Skipped,
}

impl FlowResult {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub password: FlowResult,
    pub key: FlowResult,
}

impl ProbeOutcome {
    /// The password flow must succeed; the key flow must succeed or be skipped.
    pub fn succeeded(&self) -> bool {
        self.password == FlowResult::Succeeded && !self.key.is_failure()
    }
}

/// Runs both flows against one target.
pub struct SshProbe<'a, C, P> {
    target: &'a SshTarget,
    connector: C,
    credentials: P,
}

impl<'a, C: SshConnector, P: CredentialProvider> SshProbe<'a, C, P> {
    pub fn new(target: &'a SshTarget, connector: C, credentials: P) -> Self {
        Self {
            target,
            connector,
            credentials,
        }
    }

    pub fn run<W: Write>(&self, reporter: &mut Reporter<W>) -> ProbeOutcome {
        info!(
            destination = %self.target.destination(),
            port = self.target.port,
            "Starting SSH probe"
        );

        let password = self.password_flow(reporter);
        let key = self.key_flow(reporter);
        let outcome = ProbeOutcome { password, key };

        if outcome.succeeded() {
            info!("SSH probe succeeded");
        } else {
            warn!(?outcome, "SSH probe failed");
        }
        outcome
    }

    fn password_flow<W: Write>(&self, reporter: &mut Reporter<W>) -> FlowResult {
        let secret = match self.credentials.password(PASSWORD_PROMPT) {
            Ok(secret) => secret,
            Err(err) => {
                let err = SshError::Other(err.to_string());
                reporter.line(&err);
                return FlowResult::Failed(err);
            }
        };
        self.attempt(Credential::Password(&secret), reporter)
    }

    fn key_flow<W: Write>(&self, reporter: &mut Reporter<W>) -> FlowResult {
        match self.target.identity_file.as_deref() {
            Some(key) => self.attempt(Credential::Key(key), reporter),
            None => {
                reporter.verbose("Key-based authentication skipped: no private key configured.");
                FlowResult::Skipped
            }
        }
    }

    fn attempt<W: Write>(&self, credential: Credential<'_>, reporter: &mut Reporter<W>) -> FlowResult {
        let method = credential.method();
        debug!(%method, "Attempting SSH connection");

        match self.connector.connect(self.target, credential) {
            Ok(()) => {
                reporter.line(format!(
                    "SSH connection established with {method} authentication."
                ));
                FlowResult::Succeeded
            }
            Err(err) => {
                debug!(%method, kind = err.kind(), error = %err, "SSH connection failed");
                reporter.line(&err);
                FlowResult::Failed(err)
            }
        }
    }
}
