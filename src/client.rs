//! Main [`RadioConfigurator`] client implementation.
//!
//! This module provides the high-level client that combines a transport,
//! a session and the register operations into typed getters and setters.

use std::time::Duration;

use crate::commands::{WriteOutcome, read_register, write_register};
use crate::error::Result;
use crate::protocol::Register;
use crate::session::{CancelHandle, Session, SessionConfig};
use crate::transport::{SerialTransport, Transport, serial::SerialConfig};
use crate::types::{Channel, OptionConfig, RegisterValue, SpeedConfig};

/// Client for configuring a module's registers.
///
/// The module has to be in configuration mode before [`connect`](Self::connect);
/// that is a jumper setting the protocol cannot detect.
pub struct RadioConfigurator<T> {
    session: Session<T>,
    timeout: Duration,
}

impl RadioConfigurator<SerialTransport> {
    /// Creates a new client for a serial port.
    ///
    /// # Arguments
    ///
    /// * `port` - Serial port path (e.g., "/dev/ttyS0")
    ///
    /// # Returns
    ///
    /// A new client (not yet connected).
    #[must_use]
    pub fn serial(port: impl Into<String>) -> Self {
        Self::with_serial_config(SerialConfig::new(port))
    }

    /// Creates a new client with custom serial configuration.
    #[must_use]
    pub fn with_serial_config(config: SerialConfig) -> Self {
        Self::new(SerialTransport::new(config), SessionConfig::default())
    }
}

impl<T: Transport> RadioConfigurator<T> {
    /// Creates a new client with the given transport.
    #[must_use]
    pub fn new(transport: T, config: SessionConfig) -> Self {
        Self {
            timeout: config.reply_timeout,
            session: Session::new(transport, config),
        }
    }

    /// Opens the link and flushes stale input.
    ///
    /// Also used to reopen after a timeout or cancellation closed the session.
    pub async fn connect(&mut self) -> Result<()> {
        if self.session.is_open() {
            return Ok(());
        }
        self.session.open().await
    }

    /// Closes the link.
    pub async fn disconnect(&mut self) -> Result<()> {
        self.session.close().await
    }

    /// Returns true if connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.session.is_open()
    }

    /// Sets the per-reply timeout.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Returns the per-reply timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns a handle that aborts the pending reply wait.
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        self.session.cancel_handle()
    }

    /// Returns the session for direct access.
    pub fn session_mut(&mut self) -> &mut Session<T> {
        &mut self.session
    }

    // ==================== Raw Register Access ====================

    /// Reads a register by address.
    pub async fn read_raw(&mut self, register: u8) -> Result<u8> {
        read_register(&mut self.session, register, self.timeout).await
    }

    /// Writes a register by address.
    pub async fn write_raw(&mut self, register: u8, value: u8) -> Result<WriteOutcome> {
        write_register(&mut self.session, register, value, self.timeout).await
    }

    /// Reads a register and interprets its value.
    pub async fn read(&mut self, register: Register) -> Result<RegisterValue> {
        let byte = read_register(&mut self.session, register, self.timeout).await?;
        Ok(RegisterValue::from_raw(register, byte))
    }

    /// Writes an interpreted register value.
    pub async fn write(&mut self, value: RegisterValue) -> Result<WriteOutcome> {
        write_register(
            &mut self.session,
            value.register(),
            value.to_byte(),
            self.timeout,
        )
        .await
    }

    // ==================== Typed Registers ====================

    /// Gets the operating channel.
    pub async fn channel(&mut self) -> Result<Channel> {
        self.read_raw(Register::Channel.address())
            .await
            .map(Channel::from)
    }

    /// Sets the operating channel.
    pub async fn set_channel(&mut self, channel: Channel) -> Result<WriteOutcome> {
        self.write_raw(Register::Channel.address(), channel.into())
            .await
    }

    /// Gets the speed register.
    pub async fn speed(&mut self) -> Result<SpeedConfig> {
        self.read_raw(Register::Speed.address())
            .await
            .map(SpeedConfig::from_byte)
    }

    /// Sets the speed register.
    pub async fn set_speed(&mut self, speed: SpeedConfig) -> Result<WriteOutcome> {
        self.write_raw(Register::Speed.address(), speed.to_byte())
            .await
    }

    /// Gets the option register.
    pub async fn options(&mut self) -> Result<OptionConfig> {
        self.read_raw(Register::Option.address())
            .await
            .map(OptionConfig::from_byte)
    }

    /// Sets the option register.
    pub async fn set_options(&mut self, options: OptionConfig) -> Result<WriteOutcome> {
        self.write_raw(Register::Option.address(), options.to_byte())
            .await
    }
}
