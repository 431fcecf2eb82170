use std::fmt;

use serde::{Deserialize, Serialize};
use tbmem_types::LogicVector;

use crate::scanner::{
    LineCursor, TokenResult, is_binary_start, is_hex_start, read_binary_token, read_hex_token,
};

/// Encoding of data words in an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// One hex digit per 4 bits; unknown nibbles as `X`, `U`, `Z`, `W`, `-`.
    #[default]
    Hex,
    /// One symbol per bit.
    Binary,
}

impl ImageFormat {
    /// Whether `c` can start a data token in this format.
    #[must_use]
    pub fn is_data_start(self, c: char) -> bool {
        match self {
            Self::Hex => is_hex_start(c),
            Self::Binary => is_binary_start(c),
        }
    }

    /// Decode a data token.
    pub fn read_token(self, line: &mut LineCursor<'_>, width: usize) -> TokenResult {
        match self {
            Self::Hex => read_hex_token(line, width),
            Self::Binary => read_binary_token(line, width),
        }
    }

    /// Render a known `width`-bit value as a data token.
    #[must_use]
    pub fn render(self, value: u64, width: usize) -> String {
        let word = LogicVector::from_u64(value, width);
        match self {
            Self::Hex => word.to_hex_string(),
            Self::Binary => word.to_string(),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hex => "hex",
            Self::Binary => "binary",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
