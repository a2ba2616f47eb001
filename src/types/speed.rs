//! Speed register (0x03) sub-fields.
//!
//! ```text
//!   7   6   5   4   3   2   1   0
//! ┌───────────┬───────┬───────────┐
//! │ UART baud │parity │ air rate  │
//! └───────────┴───────┴───────────┘
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::types::bits::{BitField, pack, unpack};

/// UART baud selector (bits 7..5).
pub const UART_BAUD: BitField = BitField::new(5, 3);
/// UART parity (bits 4..3).
pub const PARITY: BitField = BitField::new(3, 2);
/// Air data rate (bits 2..0).
pub const AIR_DATA_RATE: BitField = BitField::new(0, 3);

/// Bit layout of the speed register, most significant field first.
pub const SPEED_LAYOUT: [BitField; 3] = [UART_BAUD, PARITY, AIR_DATA_RATE];

/// UART baud rate used in transparent mode.
///
/// Configuration mode always talks at 9600 regardless of this setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum UartBaud {
    Baud1200 = 0b000,
    Baud2400 = 0b001,
    Baud4800 = 0b010,
    Baud9600 = 0b011,
    Baud19200 = 0b100,
    Baud38400 = 0b101,
    Baud57600 = 0b110,
    Baud115200 = 0b111,
}

impl UartBaud {
    /// All selectors in bit order.
    pub const ALL: [Self; 8] = [
        Self::Baud1200,
        Self::Baud2400,
        Self::Baud4800,
        Self::Baud9600,
        Self::Baud19200,
        Self::Baud38400,
        Self::Baud57600,
        Self::Baud115200,
    ];

    /// Parses the selector from its 3-bit value.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self::ALL[(bits & 0b111) as usize]
    }

    /// Baud rate in bits per second.
    #[must_use]
    pub const fn bps(self) -> u32 {
        match self {
            Self::Baud1200 => 1200,
            Self::Baud2400 => 2400,
            Self::Baud4800 => 4800,
            Self::Baud9600 => 9600,
            Self::Baud19200 => 19_200,
            Self::Baud38400 => 38_400,
            Self::Baud57600 => 57_600,
            Self::Baud115200 => 115_200,
        }
    }
}

impl fmt::Display for UartBaud {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bps())
    }
}

impl FromStr for UartBaud {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|baud| baud.bps().to_string() == s.trim())
            .ok_or_else(|| Error::InvalidValue {
                reason: format!("unsupported UART baud rate '{s}'"),
            })
    }
}

/// UART parity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Parity {
    /// 8N1 (bit pattern `11` also means 8N1 and decodes to this).
    None = 0b00,
    /// 8O1.
    Odd = 0b01,
    /// 8E1.
    Even = 0b10,
}

impl Parity {
    /// Parses parity from its 2-bit value.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b01 => Self::Odd,
            0b10 => Self::Even,
            _ => Self::None,
        }
    }

    /// Short UART notation.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::None => "8N1",
            Self::Odd => "8O1",
            Self::Even => "8E1",
        }
    }
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Parity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "8N1" | "NONE" => Ok(Self::None),
            "8O1" | "ODD" => Ok(Self::Odd),
            "8E1" | "EVEN" => Ok(Self::Even),
            _ => Err(Error::InvalidValue {
                reason: format!("unsupported parity '{s}'"),
            }),
        }
    }
}

/// Air data rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AirDataRate {
    Rate300 = 0b000,
    Rate1200 = 0b001,
    Rate2400 = 0b010,
    Rate4800 = 0b011,
    Rate9600 = 0b100,
    Rate19200 = 0b101,
    Rate38400 = 0b110,
    Rate62500 = 0b111,
}

impl AirDataRate {
    /// All rates in bit order.
    pub const ALL: [Self; 8] = [
        Self::Rate300,
        Self::Rate1200,
        Self::Rate2400,
        Self::Rate4800,
        Self::Rate9600,
        Self::Rate19200,
        Self::Rate38400,
        Self::Rate62500,
    ];

    /// Parses the rate from its 3-bit value.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self::ALL[(bits & 0b111) as usize]
    }

    /// Rate in bits per second.
    #[must_use]
    pub const fn bps(self) -> u32 {
        match self {
            Self::Rate300 => 300,
            Self::Rate1200 => 1200,
            Self::Rate2400 => 2400,
            Self::Rate4800 => 4800,
            Self::Rate9600 => 9600,
            Self::Rate19200 => 19_200,
            Self::Rate38400 => 38_400,
            Self::Rate62500 => 62_500,
        }
    }

    /// Short notation, e.g. `2.4k`.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Rate300 => "0.3k",
            Self::Rate1200 => "1.2k",
            Self::Rate2400 => "2.4k",
            Self::Rate4800 => "4.8k",
            Self::Rate9600 => "9.6k",
            Self::Rate19200 => "19.2k",
            Self::Rate38400 => "38.4k",
            Self::Rate62500 => "62.5k",
        }
    }
}

impl fmt::Display for AirDataRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AirDataRate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|rate| rate.label().eq_ignore_ascii_case(s) || rate.bps().to_string() == s)
            .ok_or_else(|| Error::InvalidValue {
                reason: format!("unsupported air data rate '{s}'"),
            })
    }
}

/// Decoded speed register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpeedConfig {
    /// UART baud rate in transparent mode.
    pub uart_baud: UartBaud,
    /// UART parity.
    pub parity: Parity,
    /// Over-the-air data rate.
    pub air_data_rate: AirDataRate,
}

impl SpeedConfig {
    /// Parses the speed register from a byte.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Self {
        let [uart_baud, parity, air_data_rate] = unpack(&SPEED_LAYOUT, byte);
        Self {
            uart_baud: UartBaud::from_bits(uart_baud),
            parity: Parity::from_bits(parity),
            air_data_rate: AirDataRate::from_bits(air_data_rate),
        }
    }

    /// Encodes the speed register to a byte.
    #[must_use]
    pub const fn to_byte(self) -> u8 {
        pack(
            &SPEED_LAYOUT,
            [
                self.uart_baud as u8,
                self.parity as u8,
                self.air_data_rate as u8,
            ],
        )
    }
}

impl Default for SpeedConfig {
    /// Factory setting: 9600 8N1, 2.4k air rate (`0x62`).
    fn default() -> Self {
        Self {
            uart_baud: UartBaud::Baud9600,
            parity: Parity::None,
            air_data_rate: AirDataRate::Rate2400,
        }
    }
}

impl From<u8> for SpeedConfig {
    fn from(byte: u8) -> Self {
        Self::from_byte(byte)
    }
}

impl From<SpeedConfig> for u8 {
    fn from(speed: SpeedConfig) -> Self {
        speed.to_byte()
    }
}

impl fmt::Display for SpeedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "uart {} {}, air rate {}",
            self.uart_baud, self.parity, self.air_data_rate
        )
    }
}
