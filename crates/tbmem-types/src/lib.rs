//! Core value types shared across the tbmem crates.
//!
//! - [`Logic`] / [`LogicVector`]: nine-valued bits and MSB-first bit vectors,
//!   the argument and result type of every word operation.
//! - [`WordCell`]: the tri-state content of one stored word.
//! - [`MemoryConfig`] / [`AddressRange`]: store geometry and range arguments.

pub mod cell;
pub mod config;
pub mod logic;

pub use cell::WordCell;
pub use config::{AddressRange, BLOCK_WIDTH, MAX_ADDRESS_WIDTH, MAX_DATA_WIDTH, MemoryConfig};
pub use logic::{Logic, LogicVector, ParseLogicError};
