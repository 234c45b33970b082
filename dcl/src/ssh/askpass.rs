//! Askpass mode: `ssh` re-runs this executable to obtain the password.
//!
//! [`super::OpenSshClient`] sets [`ASKPASS_MODE_ENV`] and
//! [`ASKPASS_SECRET_ENV`] on the `ssh` child. `ssh` inherits them into the
//! askpass process, which prints the secret and exits before any argument
//! parsing happens.

use crate::{EXIT_FAILURE, EXIT_SUCCESS};
use std::io::{self, Write};

pub const ASKPASS_MODE_ENV: &str = "DCL_ASKPASS_MODE";
pub const ASKPASS_SECRET_ENV: &str = "DCL_ASKPASS_SECRET";

/// When running as an askpass helper, answer and return the exit code.
///
/// Returns `None` for a normal invocation.
pub fn answer_if_requested() -> Option<u8> {
    let mode = std::env::var_os(ASKPASS_MODE_ENV)?;
    let secret = std::env::var(ASKPASS_SECRET_ENV).ok();
    answer(&mode.to_string_lossy(), secret.as_deref(), &mut io::stdout().lock())
}

fn answer<W: Write>(mode: &str, secret: Option<&str>, out: &mut W) -> Option<u8> {
    if mode != "1" {
        return None;
    }
    let Some(secret) = secret else {
        return Some(EXIT_FAILURE);
    };
    match writeln!(out, "{secret}").and_then(|()| out.flush()) {
        Ok(()) => Some(EXIT_SUCCESS),
        Err(_) => Some(EXIT_FAILURE),
    }
}
