//! Protocol definitions for module configuration.
//!
//! This module contains the low-level protocol types:
//! - Command opcodes and register addresses
//! - Command encoding and reply decoding

pub mod command;
pub mod frame;

pub use command::{Opcode, Register};
pub use frame::{
    REPLY_LEN, ReplyFrame, SINGLE_REGISTER, decode_reply, encode_read_command, encode_reply,
    encode_write_command,
};
