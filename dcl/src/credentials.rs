//! Where the SSH password comes from.
//!
//! The binary uses [`EnvPassword`] falling back to [`ConsolePrompt`]; tests
//! supply a [`StaticPassword`].

use dcl_common::Secret;
use thiserror::Error;
use tracing::debug;

pub const PASSWORD_ENV: &str = "DCL_SSH_PASSWORD";
pub const PASSWORD_PROMPT: &str = "Enter your password";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    /// This provider has nothing to offer; another one may.
    #[error("no password available: {0}")]
    Unavailable(String),

    #[error("password prompt failed: {0}")]
    Prompt(String),
}

pub trait CredentialProvider {
    fn password(&self, prompt: &str) -> Result<Secret, CredentialError>;
}

impl<P: CredentialProvider + ?Sized> CredentialProvider for &P {
    fn password(&self, prompt: &str) -> Result<Secret, CredentialError> {
        (**self).password(prompt)
    }
}

/// Hidden interactive prompt on the terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsolePrompt;

impl CredentialProvider for ConsolePrompt {
    fn password(&self, prompt: &str) -> Result<Secret, CredentialError> {
        dialoguer::Password::new()
            .with_prompt(prompt)
            .allow_empty_password(true)
            .interact()
            .map(Secret::from)
            .map_err(|err| CredentialError::Prompt(err.to_string()))
    }
}

/// Password read from an environment variable.
#[derive(Debug, Clone)]
pub struct EnvPassword {
    var: String,
}

impl Default for EnvPassword {
    fn default() -> Self {
        Self::from_var(PASSWORD_ENV)
    }
}

impl EnvPassword {
    pub fn from_var(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl CredentialProvider for EnvPassword {
    fn password(&self, _prompt: &str) -> Result<Secret, CredentialError> {
        match std::env::var(&self.var) {
            Ok(value) => {
                debug!(var = %self.var, "Using password from environment");
                Ok(Secret::from(value))
            }
            Err(_) => Err(CredentialError::Unavailable(format!("{} is not set", self.var))),
        }
    }
}

/// A fixed password.
#[derive(Debug, Clone)]
pub struct StaticPassword(Secret);

impl StaticPassword {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Secret::new(value))
    }
}

impl CredentialProvider for StaticPassword {
    fn password(&self, _prompt: &str) -> Result<Secret, CredentialError> {
        Ok(self.0.clone())
    }
}

/// Ask `primary`; if it is [`CredentialError::Unavailable`], ask `fallback`.
#[derive(Debug, Clone)]
pub struct Fallback<A, B> {
    primary: A,
    fallback: B,
}

impl<A, B> Fallback<A, B> {
    pub fn new(primary: A, fallback: B) -> Self {
        Self { primary, fallback }
    }
}

impl<A: CredentialProvider, B: CredentialProvider> CredentialProvider for Fallback<A, B> {
    fn password(&self, prompt: &str) -> Result<Secret, CredentialError> {
        match self.primary.password(prompt) {
            Err(CredentialError::Unavailable(reason)) => {
                debug!(%reason, "Falling back to next credential provider");
                self.fallback.password(prompt)
            }
            other => other,
        }
    }
}

/// Environment first, then the terminal.
pub fn default_provider() -> Fallback<EnvPassword, ConsolePrompt> {
    Fallback::new(EnvPassword::default(), ConsolePrompt)
}
