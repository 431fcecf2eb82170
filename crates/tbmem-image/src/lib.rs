//! Sparse text images of a [`MemoryStore`](tbmem_store::MemoryStore).
//!
//! An image is a line-oriented text file of whitespace-separated items:
//!
//! ```text
//! -- comment            // also a comment   /* block
//!                          comment */
//! @0010                 address marker: following data start at 0x0010
//! A5 5A 3C              data words at 0x0010, 0x0011, 0x0012
//! @0014
//! 7E
//! ```
//!
//! Data words are hexadecimal ([`ImageFormat::Hex`]) or per-bit symbols
//! ([`ImageFormat::Binary`]). Loading only ever writes; storing emits one
//! address marker per contiguous run of known words.

pub mod codec;
pub mod file;
pub mod format;
pub mod scanner;

pub use codec::{LoadSummary, StoreSummary, load_image, store_image};
pub use file::{load_file, store_file};
pub use format::ImageFormat;
pub use scanner::{
    LineCursor, TokenFault, TokenResult, Tokenizer, read_binary_token, read_hex_token,
};
