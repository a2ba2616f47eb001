//! Option register (0x04) sub-fields.
//!
//! ```text
//!   7   6   5   4   3   2   1   0
//! ┌───────┬───┬───────────┬───────┐
//! │ size  │RSN│ reserved  │ power │
//! └───────┴───┴───────────┴───────┘
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::types::bits::{BitField, pack, unpack};

/// Sub-packet size (bits 7..6).
pub const PACKET_SIZE: BitField = BitField::new(6, 2);
/// Ambient noise RSSI reporting (bit 5).
pub const AMBIENT_NOISE: BitField = BitField::new(5, 1);
/// Reserved bits (4..2), kept as read.
pub const RESERVED: BitField = BitField::new(2, 3);
/// Transmit power (bits 1..0).
pub const TX_POWER: BitField = BitField::new(0, 2);

/// Bit layout of the option register, most significant field first.
pub const OPTION_LAYOUT: [BitField; 4] = [PACKET_SIZE, AMBIENT_NOISE, RESERVED, TX_POWER];

/// Maximum over-the-air sub-packet size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketSize {
    Bytes240 = 0b00,
    Bytes128 = 0b01,
    Bytes64 = 0b10,
    Bytes32 = 0b11,
}

impl PacketSize {
    /// All sizes in bit order.
    pub const ALL: [Self; 4] = [Self::Bytes240, Self::Bytes128, Self::Bytes64, Self::Bytes32];

    /// Parses the size from its 2-bit value.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self::ALL[(bits & 0b11) as usize]
    }

    /// Size in bytes.
    #[must_use]
    pub const fn bytes(self) -> u8 {
        match self {
            Self::Bytes240 => 240,
            Self::Bytes128 => 128,
            Self::Bytes64 => 64,
            Self::Bytes32 => 32,
        }
    }
}

impl fmt::Display for PacketSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bytes", self.bytes())
    }
}

impl FromStr for PacketSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|size| size.bytes().to_string() == s.trim())
            .ok_or_else(|| Error::InvalidValue {
                reason: format!("unsupported packet size '{s}'"),
            })
    }
}

/// Transmit power level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TxPower {
    Dbm22 = 0b00,
    Dbm17 = 0b01,
    Dbm13 = 0b10,
    Dbm10 = 0b11,
}

impl TxPower {
    /// All levels in bit order.
    pub const ALL: [Self; 4] = [Self::Dbm22, Self::Dbm17, Self::Dbm13, Self::Dbm10];

    /// Parses the level from its 2-bit value.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self::ALL[(bits & 0b11) as usize]
    }

    /// Output power in dBm.
    #[must_use]
    pub const fn dbm(self) -> u8 {
        match self {
            Self::Dbm22 => 22,
            Self::Dbm17 => 17,
            Self::Dbm13 => 13,
            Self::Dbm10 => 10,
        }
    }
}

impl fmt::Display for TxPower {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} dBm", self.dbm())
    }
}

impl FromStr for TxPower {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let digits = s.strip_suffix("dBm").or_else(|| s.strip_suffix("dbm")).unwrap_or(s);
        Self::ALL
            .into_iter()
            .find(|power| power.dbm().to_string() == digits.trim())
            .ok_or_else(|| Error::InvalidValue {
                reason: format!("unsupported transmit power '{s}'"),
            })
    }
}

/// Decoded option register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OptionConfig {
    /// Sub-packet size.
    pub packet_size: PacketSize,
    /// Whether ambient noise RSSI reporting is enabled.
    pub ambient_noise: bool,
    /// Reserved bits, right-aligned.
    pub reserved: u8,
    /// Transmit power.
    pub tx_power: TxPower,
}

impl OptionConfig {
    /// Parses the option register from a byte.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Self {
        let [packet_size, ambient_noise, reserved, tx_power] = unpack(&OPTION_LAYOUT, byte);
        Self {
            packet_size: PacketSize::from_bits(packet_size),
            ambient_noise: ambient_noise == 1,
            reserved,
            tx_power: TxPower::from_bits(tx_power),
        }
    }

    /// Encodes the option register to a byte.
    #[must_use]
    pub const fn to_byte(self) -> u8 {
        pack(
            &OPTION_LAYOUT,
            [
                self.packet_size as u8,
                self.ambient_noise as u8,
                self.reserved,
                self.tx_power as u8,
            ],
        )
    }
}

impl Default for OptionConfig {
    /// Factory setting: 240-byte packets, no noise reporting, 22 dBm.
    fn default() -> Self {
        Self {
            packet_size: PacketSize::Bytes240,
            ambient_noise: false,
            reserved: 0,
            tx_power: TxPower::Dbm22,
        }
    }
}

impl From<u8> for OptionConfig {
    fn from(byte: u8) -> Self {
        Self::from_byte(byte)
    }
}

impl From<OptionConfig> for u8 {
    fn from(option: OptionConfig) -> Self {
        option.to_byte()
    }
}

impl fmt::Display for OptionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "packet size {}, ambient noise {}, tx power {}",
            self.packet_size,
            if self.ambient_noise { "on" } else { "off" },
            self.tx_power
        )
    }
}
