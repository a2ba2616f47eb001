//! # loracfg
//!
//! A Rust library for configuring SX126x-class serial LoRa transceiver modules.
//!
//! The module exposes its settings as single-byte registers reachable over the
//! UART at 9600 baud while its M0/M1 jumpers select configuration mode. This
//! library reads and writes those registers and interprets their contents.
//!
//! ## Features
//!
//! - Async/await based API using Tokio
//! - Bounded reply waits with explicit timeouts and cancellation
//! - Typed register values (channel, speed bitmask, option bitmask)
//! - Write confirmation reported back to the caller
//!
//! ## Quick Start
//!
//! ```no_run
//! use loracfg::{Channel, RadioConfigurator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), loracfg::Error> {
//!     // The module must already be jumpered into configuration mode.
//!     let mut client = RadioConfigurator::serial("/dev/ttyS0");
//!     client.connect().await?;
//!
//!     println!("Channel: {}", client.channel().await?);
//!
//!     let outcome = client.set_channel(Channel(65)).await?;
//!     println!("Confirmed: {}", outcome.confirmed);
//!
//!     client.disconnect().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`protocol`] - Command encoding and reply decoding
//! - [`types`] - Register value interpretation
//! - [`transport`] - Transport implementations (currently Serial)
//! - [`session`] - Request/reply session with bounded polling
//! - [`commands`] - Register read and write-then-confirm operations
//! - [`client`] - High-level [`RadioConfigurator`] client

pub mod client;
pub mod commands;
pub mod error;
pub mod protocol;
pub mod session;
pub mod transport;
pub mod types;

// Re-exports for convenience
pub use client::RadioConfigurator;
pub use commands::{WriteOutcome, read_register, write_register};
pub use error::{Error, FrameError, Result};
pub use protocol::{
    Opcode, REPLY_LEN, Register, decode_reply, encode_read_command, encode_write_command,
};
pub use session::{CancelHandle, Session, SessionConfig};
pub use transport::{SerialTransport, Transport, serial::SerialConfig, serial::list_ports};
pub use types::{
    AirDataRate, BitField, Channel, OptionConfig, PacketSize, Parity, RegisterValue, SpeedConfig,
    TxPower, UartBaud,
};
