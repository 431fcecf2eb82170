use serde::{Deserialize, Serialize};

use crate::logic::LogicVector;

/// Content of one stored word.
///
/// Per-bit unknowns are not tracked: a word written with any indeterminate
/// bit collapses to [`WordCell::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WordCell {
    /// Never assigned since its block was allocated.
    #[default]
    Unwritten,
    /// Written with a value containing at least one indeterminate bit.
    Unknown,
    /// A fully known binary value.
    Value(u64),
}

impl WordCell {
    /// Classify written data.
    ///
    /// `data` must be at most 64 bits wide (or carry no set bit above 63);
    /// wider known values are classified as `Unknown`.
    #[must_use]
    pub fn from_data(data: &LogicVector) -> Self {
        data.to_u64().map_or(Self::Unknown, Self::Value)
    }

    /// Resolve the cell into a `width`-bit word.
    ///
    /// `Value(n)` renders as binary, `Unknown` as all-`X`, `Unwritten` as
    /// all-`U`.
    #[must_use]
    pub fn to_vector(self, width: usize) -> LogicVector {
        match self {
            Self::Unwritten => LogicVector::uninitialized(width),
            Self::Unknown => LogicVector::unknown(width),
            Self::Value(n) => LogicVector::from_u64(n, width),
        }
    }

    /// The stored value, if known.
    #[inline]
    #[must_use]
    pub const fn value(self) -> Option<u64> {
        match self {
            Self::Value(n) => Some(n),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_known(self) -> bool {
        matches!(self, Self::Value(_))
    }
}
