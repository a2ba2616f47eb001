//! Error types for the loracfg library.

use thiserror::Error;

/// The main error type for register configuration.
#[derive(Debug, Error)]
pub enum Error {
    /// The serial port could not be opened or configured.
    #[error("connection error: {0}")]
    Connection(#[from] tokio_serial::Error),

    /// I/O error on an open link.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Reply frame could not be decoded.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// No complete reply arrived before the deadline.
    #[error("no reply after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The exchange was cancelled through a [`CancelHandle`](crate::session::CancelHandle).
    #[error("exchange cancelled")]
    Cancelled,

    /// The session is closed.
    #[error("not connected")]
    NotConnected,

    /// Another session in this process already owns the port.
    #[error("serial port {port} is already owned by another session")]
    PortInUse { port: String },

    /// The module confirmed a different value than the one written.
    #[error(
        "register 0x{register:02x} confirmed 0x{confirmed:02x}, requested 0x{requested:02x}"
    )]
    ConfigurationMismatch {
        register: u8,
        requested: u8,
        confirmed: u8,
    },

    /// A register value or sub-field could not be parsed.
    #[error("invalid value: {reason}")]
    InvalidValue { reason: String },
}

/// Frame-specific errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// Reply is not exactly the fixed reply size.
    #[error("malformed reply: expected {expected} bytes, got {got}")]
    MalformedReply { expected: usize, got: usize },
}

/// Result type alias for loracfg operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns true if retrying the whole exchange from scratch is reasonable.
    ///
    /// Connection errors are fatal; protocol violations and mismatches need an
    /// operator to look at the module first.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Cancelled)
    }
}
