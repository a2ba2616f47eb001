//! Command opcodes and register addresses for the module configuration protocol.
//!
//! Every command starts with an opcode byte, followed by the starting register
//! address and the number of registers addressed.

/// Command opcodes sent to the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    /// Write registers (followed by the new values).
    Write = 0xC0,
    /// Read registers.
    Read = 0xC1,
}

impl Opcode {
    /// Parses an opcode from a byte.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0xC0 => Some(Self::Write),
            0xC1 => Some(Self::Read),
            _ => None,
        }
    }
}

impl From<Opcode> for u8 {
    fn from(op: Opcode) -> Self {
        op as Self
    }
}

/// Configuration registers of the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Register {
    /// Packed UART baud, parity and air data rate.
    Speed = 0x03,
    /// Packed packet size, ambient noise reporting and transmit power.
    Option = 0x04,
    /// Operating channel.
    Channel = 0x05,
}

impl Register {
    /// All known registers in address order.
    pub const ALL: [Self; 3] = [Self::Speed, Self::Option, Self::Channel];

    /// Parses a register from its address.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x03 => Some(Self::Speed),
            0x04 => Some(Self::Option),
            0x05 => Some(Self::Channel),
            _ => None,
        }
    }

    /// Register address on the wire.
    #[must_use]
    pub const fn address(self) -> u8 {
        self as u8
    }

    /// Lowercase register name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Speed => "speed",
            Self::Option => "option",
            Self::Channel => "channel",
        }
    }
}

impl From<Register> for u8 {
    fn from(reg: Register) -> Self {
        reg as Self
    }
}

impl std::fmt::Display for Register {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (0x{:02x})", self.name(), self.address())
    }
}

impl std::str::FromStr for Register {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "speed" => Ok(Self::Speed),
            "option" | "options" => Ok(Self::Option),
            "channel" => Ok(Self::Channel),
            other => Err(crate::Error::InvalidValue {
                reason: format!("unknown register '{other}'"),
            }),
        }
    }
}
