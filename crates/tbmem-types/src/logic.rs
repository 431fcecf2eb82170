//! Nine-valued bits and bit vectors.
//!
//! A [`LogicVector`] is stored MSB-first: index 0 is the most significant
//! bit, matching the left-to-right order of the text image.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Logic
// ---------------------------------------------------------------------------

/// One bit of a word or address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Logic {
    /// `U`: never driven.
    #[default]
    Uninitialized,
    /// `X`: conflicting or unknown.
    Unknown,
    /// `0`
    Zero,
    /// `1`
    One,
    /// `Z`
    HighImpedance,
    /// `W`
    WeakUnknown,
    /// `L`: weak 0.
    WeakZero,
    /// `H`: weak 1.
    WeakOne,
    /// `-`
    DontCare,
}

impl Logic {
    /// Parse a bit symbol. Letters are accepted in either case.
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'U' | 'u' => Some(Self::Uninitialized),
            'X' | 'x' => Some(Self::Unknown),
            '0' => Some(Self::Zero),
            '1' => Some(Self::One),
            'Z' | 'z' => Some(Self::HighImpedance),
            'W' | 'w' => Some(Self::WeakUnknown),
            'L' | 'l' => Some(Self::WeakZero),
            'H' | 'h' => Some(Self::WeakOne),
            '-' => Some(Self::DontCare),
            _ => None,
        }
    }

    /// The canonical (upper-case) symbol for this bit.
    #[must_use]
    pub const fn to_char(self) -> char {
        match self {
            Self::Uninitialized => 'U',
            Self::Unknown => 'X',
            Self::Zero => '0',
            Self::One => '1',
            Self::HighImpedance => 'Z',
            Self::WeakUnknown => 'W',
            Self::WeakZero => 'L',
            Self::WeakOne => 'H',
            Self::DontCare => '-',
        }
    }

    /// Binary value of this bit, or `None` when it is indeterminate.
    #[must_use]
    pub const fn to_bit(self) -> Option<bool> {
        match self {
            Self::Zero | Self::WeakZero => Some(false),
            Self::One | Self::WeakOne => Some(true),
            _ => None,
        }
    }

    #[must_use]
    pub const fn from_bit(bit: bool) -> Self {
        if bit { Self::One } else { Self::Zero }
    }

    /// Whether this bit is neither a known 0 nor a known 1.
    #[must_use]
    pub const fn is_indeterminate(self) -> bool {
        self.to_bit().is_none()
    }
}

impl fmt::Display for Logic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

// ---------------------------------------------------------------------------
// LogicVector
// ---------------------------------------------------------------------------

/// A fixed-width, MSB-first vector of [`Logic`] bits.
///
/// The width of a vector is the number of bits it holds; a zero-width vector
/// is legal and addresses the single word of a zero-address-width memory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct LogicVector(Vec<Logic>);

impl LogicVector {
    #[must_use]
    pub fn new(bits: Vec<Logic>) -> Self {
        Self(bits)
    }

    /// A vector of `width` copies of `bit`.
    #[must_use]
    pub fn filled(bit: Logic, width: usize) -> Self {
        Self(vec![bit; width])
    }

    /// All-`U`: the result of reading a word that was never written.
    #[must_use]
    pub fn uninitialized(width: usize) -> Self {
        Self::filled(Logic::Uninitialized, width)
    }

    /// All-`X`: the result of reading an unknown word or an unknown address.
    #[must_use]
    pub fn unknown(width: usize) -> Self {
        Self::filled(Logic::Unknown, width)
    }

    /// Binary encoding of `value` in `width` bits.
    ///
    /// Bits above 64 are zero; bits of `value` above `width` are dropped.
    #[must_use]
    pub fn from_u64(value: u64, width: usize) -> Self {
        let bits = (0..width)
            .rev()
            .map(|pos| Logic::from_bit(pos < 64 && (value >> pos) & 1 == 1))
            .collect();
        Self(bits)
    }

    /// Numeric value of the vector.
    ///
    /// Returns `None` when any bit is indeterminate or a set bit lies above
    /// bit 63.
    #[must_use]
    pub fn to_u64(&self) -> Option<u64> {
        let width = self.0.len();
        let mut value = 0_u64;
        for (i, bit) in self.0.iter().enumerate() {
            let pos = width - 1 - i;
            if bit.to_bit()? {
                if pos >= 64 {
                    return None;
                }
                value |= 1 << pos;
            }
        }
        Some(value)
    }

    /// Number of bits.
    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        self.0.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn bits(&self) -> &[Logic] {
        &self.0
    }

    /// Whether any bit is neither a known 0 nor a known 1.
    #[must_use]
    pub fn has_indeterminate(&self) -> bool {
        self.0.iter().any(|bit| bit.is_indeterminate())
    }

    /// Whether every bit equals `bit`.
    #[must_use]
    pub fn is_all(&self, bit: Logic) -> bool {
        self.0.iter().all(|b| *b == bit)
    }

    /// Hexadecimal rendering, one digit per 4 bits, MSB nibble zero-padded.
    ///
    /// A nibble made of one repeated non-binary symbol renders as that
    /// symbol; any other nibble containing an indeterminate bit renders `X`.
    #[must_use]
    pub fn to_hex_string(&self) -> String {
        let pad = (4 - self.0.len() % 4) % 4;
        let padded: Vec<Logic> = std::iter::repeat_n(Logic::Zero, pad)
            .chain(self.0.iter().copied())
            .collect();
        padded.chunks(4).map(nibble_char).collect()
    }
}

fn nibble_char(nibble: &[Logic]) -> char {
    let mut value = 0_u32;
    for bit in nibble {
        match bit.to_bit() {
            Some(b) => value = (value << 1) | u32::from(b),
            None => {
                return if nibble.iter().all(|other| other == bit) {
                    bit.to_char()
                } else {
                    'X'
                };
            }
        }
    }
    char::from_digit(value, 16).map_or('X', |c| c.to_ascii_uppercase())
}

impl From<Vec<Logic>> for LogicVector {
    fn from(bits: Vec<Logic>) -> Self {
        Self(bits)
    }
}

impl fmt::Display for LogicVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in &self.0 {
            write!(f, "{bit}")?;
        }
        Ok(())
    }
}

/// Error returned when a string contains a character that is not a bit symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseLogicError {
    pub offset: usize,
    pub found: char,
}

impl fmt::Display for ParseLogicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid bit symbol '{}' at offset {}",
            self.found, self.offset
        )
    }
}

impl std::error::Error for ParseLogicError {}

impl FromStr for LogicVector {
    type Err = ParseLogicError;

    /// Parse per-bit symbols, MSB first. `_` separators are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.char_indices()
            .filter(|(_, c)| *c != '_')
            .map(|(offset, found)| Logic::from_char(found).ok_or(ParseLogicError { offset, found }))
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}
