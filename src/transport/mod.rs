//! Transport layer for module communication.
//!
//! This module provides the abstraction the session polls for replies.
//! [`SerialTransport`] talks to a real module; tests use a simulated one.

#[cfg(test)]
pub(crate) mod mock;
pub mod serial;

use bytes::Bytes;
use futures::future::BoxFuture;

use crate::error::Result;

/// Trait for transport implementations.
///
/// A transport is a byte pipe with an inspectable input buffer. It carries no
/// framing of its own: commands are written verbatim and replies are read as
/// whatever happens to be buffered.
pub trait Transport: Send {
    /// Opens the link.
    fn connect(&mut self) -> BoxFuture<'_, Result<()>>;

    /// Closes the link and releases the port.
    fn disconnect(&mut self) -> BoxFuture<'_, Result<()>>;

    /// Writes data verbatim.
    fn send(&mut self, data: Bytes) -> BoxFuture<'_, Result<()>>;

    /// Returns the number of bytes waiting in the input buffer.
    fn bytes_available(&mut self) -> Result<usize>;

    /// Reads up to `max` bytes that are already buffered.
    fn read_available(&mut self, max: usize) -> BoxFuture<'_, Result<Bytes>>;

    /// Discards everything in the input buffer.
    fn clear_input(&mut self) -> Result<()>;

    /// Returns true if connected.
    fn is_connected(&self) -> bool;

    /// Human-readable port identifier for logs.
    fn port_name(&self) -> &str;
}

pub use serial::SerialTransport;
