//! Store geometry.
//!
//! Addresses split into a high-order block index and a low-order word
//! offset of [`BLOCK_WIDTH`] bits (fewer when the address itself is
//! narrower). Blocks are allocated on first write.

use serde::{Deserialize, Serialize};
use tbmem_error::{MemoryError, Result};

use crate::logic::{Logic, LogicVector};

/// Maximum number of address bits used as the intra-block word offset.
pub const BLOCK_WIDTH: usize = 10;

/// Widest supported address; the block-index array holds at most
/// `2^(MAX_ADDRESS_WIDTH - BLOCK_WIDTH)` entries.
pub const MAX_ADDRESS_WIDTH: usize = 32;

/// Widest supported word; cells store a `u64`.
pub const MAX_DATA_WIDTH: usize = 64;

/// Address and data widths of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemoryConfig {
    pub address_width: usize,
    pub data_width: usize,
}

impl MemoryConfig {
    /// Build a validated configuration.
    pub fn new(address_width: usize, data_width: usize) -> Result<Self> {
        let config = Self {
            address_width,
            data_width,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the widths against the supported bounds.
    ///
    /// Needed for configurations that bypassed [`MemoryConfig::new`], e.g.
    /// ones deserialized from a test-bench settings file.
    pub fn validate(&self) -> Result<()> {
        if self.address_width > MAX_ADDRESS_WIDTH {
            return Err(MemoryError::invalid_config(format!(
                "address width {} exceeds maximum {MAX_ADDRESS_WIDTH}",
                self.address_width
            )));
        }
        if self.data_width == 0 || self.data_width > MAX_DATA_WIDTH {
            return Err(MemoryError::invalid_config(format!(
                "data width {} must be between 1 and {MAX_DATA_WIDTH}",
                self.data_width
            )));
        }
        Ok(())
    }

    /// Low-order address bits used as the word offset within a block.
    #[inline]
    #[must_use]
    pub const fn block_width(&self) -> usize {
        if self.address_width < BLOCK_WIDTH {
            self.address_width
        } else {
            BLOCK_WIDTH
        }
    }

    /// Number of entries in the block-index array.
    #[inline]
    #[must_use]
    pub const fn block_count(&self) -> usize {
        1 << (self.address_width - self.block_width())
    }

    /// Number of words per block.
    #[inline]
    #[must_use]
    pub const fn block_size(&self) -> usize {
        1 << self.block_width()
    }

    /// Largest address value, i.e. all address bits set.
    #[inline]
    #[must_use]
    pub const fn max_address(&self) -> u64 {
        if self.address_width == 0 {
            0
        } else {
            u64::MAX >> (64 - self.address_width)
        }
    }
}

/// An inclusive pair of addresses for image load/store.
///
/// `start` may exceed `end` for loads (the image is then applied with
/// descending addresses); stores require `start <= end`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AddressRange {
    pub start: LogicVector,
    pub end: LogicVector,
}

impl AddressRange {
    #[must_use]
    pub fn new(start: LogicVector, end: LogicVector) -> Self {
        Self { start, end }
    }

    /// Range built from numeric bounds at `address_width` bits.
    #[must_use]
    pub fn from_u64(start: u64, end: u64, address_width: usize) -> Self {
        Self::new(
            LogicVector::from_u64(start, address_width),
            LogicVector::from_u64(end, address_width),
        )
    }

    /// The whole address space: all zeros to all ones.
    #[must_use]
    pub fn full(address_width: usize) -> Self {
        Self::new(
            LogicVector::filled(Logic::Zero, address_width),
            LogicVector::filled(Logic::One, address_width),
        )
    }
}
