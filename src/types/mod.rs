//! Register value types.
//!
//! Every register is a single byte on the wire. This module gives those bytes
//! their meaning:
//! - Channel index
//! - Speed bitmask (UART baud, parity, air data rate)
//! - Option bitmask (packet size, noise reporting, transmit power)

pub mod bits;
pub mod channel;
pub mod option;
pub mod speed;

use std::fmt;

pub use bits::BitField;
pub use channel::Channel;
pub use option::{OPTION_LAYOUT, OptionConfig, PacketSize, TxPower};
pub use speed::{AirDataRate, Parity, SPEED_LAYOUT, SpeedConfig, UartBaud};

use crate::protocol::Register;

/// A register byte interpreted according to its register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterValue {
    /// Channel register.
    Channel(Channel),
    /// Speed register.
    Speed(SpeedConfig),
    /// Option register.
    Option(OptionConfig),
}

impl RegisterValue {
    /// Interprets a raw register byte.
    #[must_use]
    pub const fn from_raw(register: Register, byte: u8) -> Self {
        match register {
            Register::Channel => Self::Channel(Channel(byte)),
            Register::Speed => Self::Speed(SpeedConfig::from_byte(byte)),
            Register::Option => Self::Option(OptionConfig::from_byte(byte)),
        }
    }

    /// Returns the register this value belongs to.
    #[must_use]
    pub const fn register(&self) -> Register {
        match self {
            Self::Channel(_) => Register::Channel,
            Self::Speed(_) => Register::Speed,
            Self::Option(_) => Register::Option,
        }
    }

    /// Encodes the value back to its register byte.
    #[must_use]
    pub const fn to_byte(&self) -> u8 {
        match self {
            Self::Channel(channel) => channel.0,
            Self::Speed(speed) => speed.to_byte(),
            Self::Option(option) => option.to_byte(),
        }
    }
}

impl fmt::Display for RegisterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Channel(channel) => write!(f, "channel {channel}"),
            Self::Speed(speed) => write!(f, "{speed}"),
            Self::Option(option) => write!(f, "{option}"),
        }?;
        write!(f, " [0x{:02x}]", self.to_byte())
    }
}
