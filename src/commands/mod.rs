//! Register read and write operations.
//!
//! This module drives the request/reply protocol for one register at a time.
//! The module must already be in configuration mode (M0/M1 jumpers set by the
//! operator); nothing on the wire reveals whether it is.

use std::time::Duration;

use crate::error::{Error, Result};
use crate::protocol::{decode_reply, encode_read_command, encode_write_command};
use crate::session::Session;
use crate::transport::Transport;

/// Result of a write-then-confirm exchange.
///
/// Whether a module echoes the requested value or merely acknowledges the
/// write differs between firmware revisions, so the confirmed byte is reported
/// as-is. Use [`WriteOutcome::verify`] to treat a difference as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOutcome {
    /// Register address.
    pub register: u8,
    /// Value read before the write.
    pub previous: u8,
    /// Value sent in the write command.
    pub requested: u8,
    /// Value carried by the module's reply to the write.
    pub confirmed: u8,
}

impl WriteOutcome {
    /// Returns true if the module confirmed the requested value.
    #[must_use]
    pub const fn is_confirmed(&self) -> bool {
        self.requested == self.confirmed
    }

    /// Returns true if the write changed the register.
    #[must_use]
    pub const fn changed(&self) -> bool {
        self.previous != self.confirmed
    }

    /// Returns the confirmed value, or [`Error::ConfigurationMismatch`] if it
    /// differs from the requested one.
    pub fn verify(&self) -> Result<u8> {
        if self.is_confirmed() {
            Ok(self.confirmed)
        } else {
            Err(Error::ConfigurationMismatch {
                register: self.register,
                requested: self.requested,
                confirmed: self.confirmed,
            })
        }
    }
}

/// Reads the current value of a register.
///
/// Stale input is flushed first. Timeouts and malformed replies are returned
/// unchanged.
pub async fn read_register<T: Transport>(
    session: &mut Session<T>,
    register: impl Into<u8>,
    timeout: Duration,
) -> Result<u8> {
    let register = register.into();
    session.flush_input()?;

    tracing::debug!("reading register 0x{register:02x}");
    let reply = session
        .exchange(encode_read_command(register), timeout)
        .await?;
    let value = decode_reply(&reply)?;

    tracing::debug!("register 0x{register:02x} = 0x{value:02x}");
    Ok(value)
}

/// Writes a register and returns the module's confirmation.
///
/// The register is read first; the module expects a read before a write in
/// the same exchange. A confirmation that differs from `value` is logged and
/// reported through [`WriteOutcome`], never retried.
pub async fn write_register<T: Transport>(
    session: &mut Session<T>,
    register: impl Into<u8>,
    value: u8,
    timeout: Duration,
) -> Result<WriteOutcome> {
    let register = register.into();
    let previous = read_register(session, register, timeout).await?;

    tracing::debug!("writing register 0x{register:02x}: 0x{previous:02x} -> 0x{value:02x}");
    let reply = session
        .exchange(encode_write_command(register, value), timeout)
        .await?;
    let confirmed = decode_reply(&reply)?;

    let outcome = WriteOutcome {
        register,
        previous,
        requested: value,
        confirmed,
    };

    if outcome.is_confirmed() {
        tracing::info!("register 0x{register:02x} set to 0x{confirmed:02x}");
    } else {
        tracing::warn!(
            "register 0x{register:02x} confirmed 0x{confirmed:02x}, requested 0x{value:02x}"
        );
    }

    Ok(outcome)
}
