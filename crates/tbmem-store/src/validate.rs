//! Argument checks shared by word operations and image load/store.
//!
//! Checks only classify; reporting to the alert sink is the caller's job so
//! that each operation can attach its own identity.

use tbmem_error::{MemoryError, Result};
use tbmem_types::{AddressRange, LogicVector, MemoryConfig};

/// Validation against a store's current configuration.
///
/// `None` means the store has no block-index array (never configured, or
/// deallocated); every check then fails with `NotConfigured`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationPolicy {
    config: Option<MemoryConfig>,
}

impl ValidationPolicy {
    #[must_use]
    pub const fn new(config: Option<MemoryConfig>) -> Self {
        Self { config }
    }

    /// The configuration, or `NotConfigured`.
    pub fn configured(&self, operation: &'static str) -> Result<MemoryConfig> {
        self.config
            .ok_or(MemoryError::NotConfigured { operation })
    }

    /// Require `address` to be exactly the configured address width.
    pub fn address(&self, operation: &'static str, address: &LogicVector) -> Result<MemoryConfig> {
        let config = self.configured(operation)?;
        if address.width() != config.address_width {
            return Err(MemoryError::AddressWidthMismatch {
                operation,
                expected: config.address_width,
                actual: address.width(),
            });
        }
        Ok(config)
    }

    /// Require `data` to be exactly the configured data width.
    pub fn data(&self, operation: &'static str, data: &LogicVector) -> Result<()> {
        let config = self.configured(operation)?;
        if data.width() != config.data_width {
            return Err(MemoryError::DataWidthMismatch {
                operation,
                expected: config.data_width,
                actual: data.width(),
            });
        }
        Ok(())
    }

    /// Require both bounds of `range` to be the configured address width and
    /// fully known. Returns the numeric `(start, end)` pair.
    pub fn range(&self, operation: &'static str, range: &AddressRange) -> Result<(u64, u64)> {
        self.address(operation, &range.start)?;
        self.address(operation, &range.end)?;
        match (range.start.to_u64(), range.end.to_u64()) {
            (Some(start), Some(end)) => Ok((start, end)),
            _ => Err(MemoryError::IndeterminateRange {
                operation,
                start: range.start.to_hex_string(),
                end: range.end.to_hex_string(),
            }),
        }
    }

    /// [`ValidationPolicy::range`] plus `start <= end`.
    pub fn ascending_range(
        &self,
        operation: &'static str,
        range: &AddressRange,
    ) -> Result<(u64, u64)> {
        let (start, end) = self.range(operation, range)?;
        if start > end {
            return Err(MemoryError::OrderingViolation {
                operation,
                start: range.start.to_hex_string(),
                end: range.end.to_hex_string(),
            });
        }
        Ok((start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tbmem_error::ErrorKind;
    use tbmem_types::Logic;

    fn policy() -> ValidationPolicy {
        ValidationPolicy::new(Some(MemoryConfig::new(8, 16).unwrap()))
    }

    #[test]
    fn test_unconfigured_is_distinguished() {
        let policy = ValidationPolicy::new(None);
        let err = policy
            .address("write", &LogicVector::from_u64(0, 8))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotConfigured);
        let err = policy.data("write", &LogicVector::from_u64(0, 1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotConfigured);
    }

    #[test]
    fn test_width_must_match_exactly() {
        let policy = policy();
        assert!(policy.address("read", &LogicVector::from_u64(3, 8)).is_ok());
        let narrower = policy
            .address("read", &LogicVector::from_u64(3, 7))
            .unwrap_err();
        assert!(matches!(
            narrower,
            MemoryError::AddressWidthMismatch {
                expected: 8,
                actual: 7,
                ..
            }
        ));
        assert!(policy.address("read", &LogicVector::from_u64(3, 9)).is_err());
        assert!(policy.data("write", &LogicVector::from_u64(3, 16)).is_ok());
        assert!(policy.data("write", &LogicVector::from_u64(3, 8)).is_err());
    }

    #[test]
    fn test_indeterminate_bounds_rejected() {
        let range = AddressRange::new(LogicVector::unknown(8), LogicVector::from_u64(4, 8));
        let err = policy().range("load", &range).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IndeterminateRange);
    }

    #[test]
    fn test_ascending_range() {
        let policy = policy();
        assert_eq!(
            policy
                .ascending_range("store", &AddressRange::from_u64(0x10, 0x20, 8))
                .unwrap(),
            (0x10, 0x20)
        );
        let err = policy
            .ascending_range("store", &AddressRange::from_u64(0x20, 0x10, 8))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OrderingViolation);
        // Descending is fine when order is not required.
        assert_eq!(
            policy
                .range("load", &AddressRange::from_u64(0x20, 0x10, 8))
                .unwrap(),
            (0x20, 0x10)
        );
        let full = AddressRange::new(
            LogicVector::filled(Logic::Zero, 8),
            LogicVector::filled(Logic::One, 8),
        );
        assert_eq!(policy.ascending_range("store", &full).unwrap(), (0, 0xFF));
    }
}
