//! Bit-range layout helpers for packed registers.
//!
//! A register layout is a table of [`BitField`]s, one per sub-field. The
//! register types decode and encode through [`unpack`] and [`pack`] so the
//! table is the only place the bit positions live.

/// A bit range inside a register byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitField {
    /// Position of the lowest bit.
    pub shift: u8,
    /// Number of bits.
    pub width: u8,
}

impl BitField {
    /// Creates a bit field.
    #[must_use]
    pub const fn new(shift: u8, width: u8) -> Self {
        Self { shift, width }
    }

    /// Mask of the field, right-aligned.
    #[must_use]
    pub const fn mask(self) -> u8 {
        ((1u16 << self.width) - 1) as u8
    }

    /// Extracts the field from a register byte.
    #[must_use]
    pub const fn extract(self, byte: u8) -> u8 {
        (byte >> self.shift) & self.mask()
    }

    /// Replaces the field in a register byte. Excess bits of `value` are dropped.
    #[must_use]
    pub const fn insert(self, byte: u8, value: u8) -> u8 {
        let mask = self.mask() << self.shift;
        (byte & !mask) | ((value << self.shift) & mask)
    }
}

/// Splits a register byte into its sub-field values, in layout order.
#[must_use]
pub const fn unpack<const N: usize>(layout: &[BitField; N], byte: u8) -> [u8; N] {
    let mut values = [0u8; N];
    let mut i = 0;
    while i < N {
        values[i] = layout[i].extract(byte);
        i += 1;
    }
    values
}

/// Packs sub-field values, in layout order, into a register byte.
///
/// Bits not covered by the layout are zero.
#[must_use]
pub const fn pack<const N: usize>(layout: &[BitField; N], values: [u8; N]) -> u8 {
    let mut byte = 0;
    let mut i = 0;
    while i < N {
        byte = layout[i].insert(byte, values[i]);
        i += 1;
    }
    byte
}
