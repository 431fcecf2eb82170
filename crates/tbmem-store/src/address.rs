//! Address → (block, word) mapping.

use tbmem_types::MemoryConfig;

/// Split `address` into `(block_index, word_index)`.
///
/// The word index is the low `block_width` bits; the block index is the
/// remaining high-order bits. When `address_width <= block_width` the whole
/// address is the word index and the block index is 0.
#[inline]
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn split(address: u64, address_width: usize, block_width: usize) -> (usize, usize) {
    if address_width <= block_width {
        (0, address as usize)
    } else {
        let word_mask = (1_u64 << block_width) - 1;
        ((address >> block_width) as usize, (address & word_mask) as usize)
    }
}

/// [`split`] bound to one store's geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressMapper {
    address_width: usize,
    block_width: usize,
}

impl AddressMapper {
    #[must_use]
    pub const fn new(config: &MemoryConfig) -> Self {
        Self {
            address_width: config.address_width,
            block_width: config.block_width(),
        }
    }

    #[inline]
    #[must_use]
    pub const fn split(&self, address: u64) -> (usize, usize) {
        split(address, self.address_width, self.block_width)
    }

    /// Inverse of [`AddressMapper::split`].
    #[inline]
    #[must_use]
    pub const fn join(&self, block: usize, word: usize) -> u64 {
        ((block as u64) << self.block_width) | word as u64
    }

    #[inline]
    #[must_use]
    pub const fn block_width(&self) -> usize {
        self.block_width
    }
}
