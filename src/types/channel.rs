//! Channel register (0x05).

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Operating channel index.
///
/// The byte is the channel index; the valid range depends on the module
/// variant, so no range check is applied beyond the byte itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Channel(pub u8);

impl Channel {
    /// Returns the channel index.
    #[must_use]
    pub const fn index(self) -> u8 {
        self.0
    }
}

impl From<u8> for Channel {
    fn from(byte: u8) -> Self {
        Self(byte)
    }
}

impl From<Channel> for u8 {
    fn from(channel: Channel) -> Self {
        channel.0
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Channel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u8>()
            .map(Self)
            .map_err(|e| Error::InvalidValue {
                reason: format!("channel '{s}': {e}"),
            })
    }
}
