use std::fmt;

use thiserror::Error;

/// Primary error type for tbmem operations.
///
/// Every variant carries an [`AlertLevel`]: failures abort the enclosing
/// operation, warnings are reported and the operation continues.
#[derive(Error, Debug)]
pub enum MemoryError {
    // === Configuration Errors ===
    /// The store has no configured widths (never initialized or deallocated).
    #[error("{operation}: memory not initialized, call configure first")]
    NotConfigured { operation: &'static str },

    /// Requested widths are outside the supported bounds.
    #[error("invalid memory configuration: {detail}")]
    InvalidConfig { detail: String },

    // === Width Errors ===
    /// Address argument width differs from the configured address width.
    #[error("{operation}: address width {actual} does not match memory address width {expected}")]
    AddressWidthMismatch {
        operation: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Data argument width differs from the configured data width.
    #[error("{operation}: data width {actual} does not match memory data width {expected}")]
    DataWidthMismatch {
        operation: &'static str,
        expected: usize,
        actual: usize,
    },

    // === Range Errors ===
    /// Image write requested over a descending range.
    #[error("{operation}: start address {start} is greater than end address {end}")]
    OrderingViolation {
        operation: &'static str,
        start: String,
        end: String,
    },

    /// A range bound contains indeterminate bits.
    #[error("{operation}: range bounds must be fully known, got {start} to {end}")]
    IndeterminateRange {
        operation: &'static str,
        start: String,
        end: String,
    },

    /// An image address fell outside the requested bounds.
    #[error("address {address} outside bounds [{low}, {high}] on line {line}")]
    OutOfRange {
        address: String,
        low: String,
        high: String,
        line: usize,
    },

    // === Image Token Errors ===
    /// An address or data token could not be decoded at the required width.
    #[error("malformed token on line {line}, item {item}: {detail}")]
    MalformedToken {
        line: usize,
        item: usize,
        detail: String,
    },

    /// Text that is neither an address marker nor a data token.
    #[error("invalid text on line {line}, item {item}, skipping: {text}")]
    UnrecognizedToken {
        line: usize,
        item: usize,
        text: String,
    },

    // === I/O Errors ===
    /// Reading or writing the image source/sink failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of [`MemoryError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotConfigured,
    InvalidConfig,
    WidthMismatch,
    OrderingViolation,
    IndeterminateRange,
    OutOfRange,
    MalformedToken,
    UnrecognizedToken,
    Io,
}

/// Severity with which a condition is reported to the alert sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AlertLevel {
    /// Logged and counted; the operation continues.
    Warning,
    /// Logged and counted; the current operation is aborted.
    Failure,
}

impl AlertLevel {
    /// All levels, in ascending severity.
    pub const ALL: [Self; 2] = [Self::Warning, Self::Failure];

    /// Upper-case label used in alert messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Warning => "WARNING",
            Self::Failure => "FAILURE",
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl MemoryError {
    /// Classify this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotConfigured { .. } => ErrorKind::NotConfigured,
            Self::InvalidConfig { .. } => ErrorKind::InvalidConfig,
            Self::AddressWidthMismatch { .. } | Self::DataWidthMismatch { .. } => {
                ErrorKind::WidthMismatch
            }
            Self::OrderingViolation { .. } => ErrorKind::OrderingViolation,
            Self::IndeterminateRange { .. } => ErrorKind::IndeterminateRange,
            Self::OutOfRange { .. } => ErrorKind::OutOfRange,
            Self::MalformedToken { .. } => ErrorKind::MalformedToken,
            Self::UnrecognizedToken { .. } => ErrorKind::UnrecognizedToken,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    /// Severity this condition is reported with.
    pub const fn level(&self) -> AlertLevel {
        match self {
            Self::OutOfRange { .. } | Self::UnrecognizedToken { .. } => AlertLevel::Warning,
            _ => AlertLevel::Failure,
        }
    }

    /// Whether this condition aborts the enclosing operation.
    pub const fn is_fatal(&self) -> bool {
        matches!(self.level(), AlertLevel::Failure)
    }

    /// Create an invalid-configuration error.
    pub fn invalid_config(detail: impl Into<String>) -> Self {
        Self::InvalidConfig {
            detail: detail.into(),
        }
    }

    /// Create a malformed-token error.
    pub fn malformed(line: usize, item: usize, detail: impl Into<String>) -> Self {
        Self::MalformedToken {
            line,
            item,
            detail: detail.into(),
        }
    }
}

/// Result type alias using `MemoryError`.
pub type Result<T> = std::result::Result<T, MemoryError>;
