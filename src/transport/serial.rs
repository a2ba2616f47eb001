//! Serial transport implementation.
//!
//! This module provides serial port communication with the module's UART in
//! configuration mode.

use std::collections::HashSet;
use std::sync::{LazyLock, Mutex, PoisonError};
use std::time::Duration;

use bytes::Bytes;
use futures::future::BoxFuture;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{
    ClearBuffer, DataBits, Parity, SerialPort, SerialPortBuilderExt, SerialStream, StopBits,
};

use crate::error::{Error, Result};
use crate::transport::Transport;

/// Baud rate the module uses in configuration mode.
pub const CONFIG_BAUD_RATE: u32 = 9600;

/// Default delay after opening the port before the first command.
pub const DEFAULT_CONNECTION_DELAY: Duration = Duration::from_millis(100);

/// Ports currently held by a live [`SerialTransport`] in this process.
static OPEN_PORTS: LazyLock<Mutex<HashSet<String>>> = LazyLock::new(Mutex::default);

/// Exclusive claim on a port name, released on drop.
#[derive(Debug)]
struct PortLease {
    port: String,
}

impl PortLease {
    fn acquire(port: &str) -> Result<Self> {
        let mut ports = OPEN_PORTS.lock().unwrap_or_else(PoisonError::into_inner);
        if !ports.insert(port.to_owned()) {
            return Err(Error::PortInUse {
                port: port.to_owned(),
            });
        }
        Ok(Self {
            port: port.to_owned(),
        })
    }
}

impl Drop for PortLease {
    fn drop(&mut self) {
        let mut ports = OPEN_PORTS.lock().unwrap_or_else(PoisonError::into_inner);
        ports.remove(&self.port);
        tracing::trace!("released lease on {}", self.port);
    }
}

/// Configuration for serial transport.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Serial port path (e.g., "/dev/ttyS0" or "COM3").
    pub port: String,
    /// Baud rate.
    pub baud_rate: u32,
    /// Delay after connection before sending commands.
    pub connection_delay: Duration,
}

impl SerialConfig {
    /// Creates a new serial configuration with default settings.
    #[must_use]
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud_rate: CONFIG_BAUD_RATE,
            connection_delay: DEFAULT_CONNECTION_DELAY,
        }
    }

    /// Sets the baud rate.
    ///
    /// Modules only accept configuration commands at [`CONFIG_BAUD_RATE`];
    /// other rates are for bridges that translate.
    #[must_use]
    pub const fn baud_rate(mut self, rate: u32) -> Self {
        self.baud_rate = rate;
        self
    }

    /// Sets the connection delay.
    #[must_use]
    pub const fn connection_delay(mut self, delay: Duration) -> Self {
        self.connection_delay = delay;
        self
    }
}

/// Serial transport for module configuration.
///
/// Only one `SerialTransport` per port name may be connected at a time in a
/// process; a second `connect` fails with [`Error::PortInUse`].
pub struct SerialTransport {
    config: SerialConfig,
    // Declared before `lease` so the port closes before the claim is released.
    stream: Option<SerialStream>,
    lease: Option<PortLease>,
}

impl SerialTransport {
    /// Creates a new serial transport with the given configuration.
    #[must_use]
    pub const fn new(config: SerialConfig) -> Self {
        Self {
            config,
            stream: None,
            lease: None,
        }
    }

    /// Creates a new serial transport for the given port with default settings.
    #[must_use]
    pub fn with_port(port: impl Into<String>) -> Self {
        Self::new(SerialConfig::new(port))
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &SerialConfig {
        &self.config
    }

    fn stream_mut(&mut self) -> Result<&mut SerialStream> {
        self.stream.as_mut().ok_or(Error::NotConnected)
    }
}

impl Transport for SerialTransport {
    fn connect(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            if self.stream.is_some() {
                return Ok(());
            }

            let lease = PortLease::acquire(&self.config.port)?;

            tracing::info!(
                "opening serial port {} at {} baud",
                self.config.port,
                self.config.baud_rate
            );

            let mut stream = tokio_serial::new(&self.config.port, self.config.baud_rate)
                .data_bits(DataBits::Eight)
                .parity(Parity::None)
                .stop_bits(StopBits::One)
                .open_native_async()
                .map_err(Error::Connection)?;

            if let Err(e) = stream.write_request_to_send(false) {
                tracing::warn!("failed to set RTS: {}", e);
            }

            tokio::time::sleep(self.config.connection_delay).await;

            self.stream = Some(stream);
            self.lease = Some(lease);

            tracing::info!("connected to serial port");
            Ok(())
        })
    }

    fn disconnect(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            if self.stream.is_some() {
                tracing::info!("closing serial port {}", self.config.port);
                self.stream = None;
            }
            self.lease = None;
            Ok(())
        })
    }

    fn send(&mut self, data: Bytes) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let stream = self.stream_mut()?;
            tracing::trace!("writing {} bytes", data.len());
            stream.write_all(&data).await?;
            stream.flush().await?;
            Ok(())
        })
    }

    fn bytes_available(&mut self) -> Result<usize> {
        let pending = self.stream_mut()?.bytes_to_read().map_err(link_error)?;
        Ok(pending as usize)
    }

    fn read_available(&mut self, max: usize) -> BoxFuture<'_, Result<Bytes>> {
        Box::pin(async move {
            let stream = self.stream_mut()?;
            let mut buf = vec![0u8; max];
            let n = stream.read(&mut buf).await?;
            buf.truncate(n);
            Ok(Bytes::from(buf))
        })
    }

    fn clear_input(&mut self) -> Result<()> {
        self.stream_mut()?
            .clear(ClearBuffer::Input)
            .map_err(link_error)?;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn port_name(&self) -> &str {
        &self.config.port
    }
}

/// Maps a port error raised after the open succeeded.
///
/// [`Error::Connection`] is kept for failures to open the port.
fn link_error(e: tokio_serial::Error) -> Error {
    Error::Io(e.into())
}

/// Lists available serial ports.
///
/// # Errors
///
/// Returns an error if the port list cannot be retrieved.
pub fn list_ports() -> Result<Vec<String>> {
    let ports = tokio_serial::available_ports().map_err(Error::Connection)?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}
