//! Frame encoding and decoding for the module configuration protocol.
//!
//! Commands carry no length prefix or checksum:
//! ```text
//! read:   ┌────────┬──────────┬────────┐
//!         │  0xC1  │ register │  0x01  │
//!         └────────┴──────────┴────────┘
//! write:  ┌────────┬──────────┬────────┬────────┐
//!         │  0xC0  │ register │  0x01  │ value  │
//!         └────────┴──────────┴────────┴────────┘
//! ```
//!
//! The module answers each command with a fixed 4-byte reply that echoes the
//! opcode, register and length, followed by the current register value. The
//! reply size is not announced on the wire, so [`REPLY_LEN`] is the only way to
//! tell a complete reply apart from a partial one.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::FrameError;
use crate::protocol::command::Opcode;

/// Size of every reply frame.
pub const REPLY_LEN: usize = 4;

/// Register count used by single-register commands.
pub const SINGLE_REGISTER: u8 = 0x01;

/// Encodes a command reading one register.
#[must_use]
pub fn encode_read_command(register: u8) -> Bytes {
    let mut buf = BytesMut::with_capacity(3);
    buf.put_u8(Opcode::Read.into());
    buf.put_u8(register);
    buf.put_u8(SINGLE_REGISTER);
    buf.freeze()
}

/// Encodes a command writing `value` into one register.
#[must_use]
pub fn encode_write_command(register: u8, value: u8) -> Bytes {
    let mut buf = BytesMut::with_capacity(4);
    buf.put_u8(Opcode::Write.into());
    buf.put_u8(register);
    buf.put_u8(SINGLE_REGISTER);
    buf.put_u8(value);
    buf.freeze()
}

/// Encodes the reply a module sends for a single-register command.
#[must_use]
pub fn encode_reply(opcode: u8, register: u8, value: u8) -> Bytes {
    let mut buf = BytesMut::with_capacity(REPLY_LEN);
    buf.put_u8(opcode);
    buf.put_u8(register);
    buf.put_u8(SINGLE_REGISTER);
    buf.put_u8(value);
    buf.freeze()
}

/// Decodes a reply into the register value it carries.
///
/// The echoed opcode and register are not compared against the command that
/// was sent; correlation is positional and owned by the session.
///
/// # Errors
///
/// Returns [`FrameError::MalformedReply`] unless `data` is exactly
/// [`REPLY_LEN`] bytes.
pub fn decode_reply(data: &[u8]) -> Result<u8, FrameError> {
    ReplyFrame::parse(data).map(|frame| frame.value)
}

/// A parsed reply frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyFrame {
    /// Echoed opcode.
    pub opcode: u8,
    /// Echoed register address.
    pub register: u8,
    /// Echoed register count.
    pub length: u8,
    /// Current register value.
    pub value: u8,
}

impl ReplyFrame {
    /// Parses a reply frame.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::MalformedReply`] unless `data` is exactly
    /// [`REPLY_LEN`] bytes.
    pub fn parse(data: &[u8]) -> Result<Self, FrameError> {
        let &[opcode, register, length, value] = data else {
            return Err(FrameError::MalformedReply {
                expected: REPLY_LEN,
                got: data.len(),
            });
        };
        Ok(Self {
            opcode,
            register,
            length,
            value,
        })
    }

    /// Returns true if the echo fields match the given command.
    #[must_use]
    pub fn echoes(&self, opcode: Opcode, register: u8) -> bool {
        self.opcode == u8::from(opcode) && self.register == register && self.length == SINGLE_REGISTER
    }
}
