//! Error taxonomy for the tallybook crates.
//!
//! Two layers, matching the crate layering:
//! - [`StorageError`]: raised by storage backends (I/O, corrupt records,
//!   failed conditional writes)
//! - [`LedgerError`]: raised by the commission ledger (input validation plus
//!   propagated persistence failures)
//!
//! Corrupt financial records are never papered over with defaults; they
//! surface as errors so data loss stays visible.

use rust_decimal::Decimal;
use thiserror::Error;

/// Result alias for storage-layer operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Result alias for ledger-layer operations.
pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

/// Errors surfaced by storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying I/O failure while reading or writing records.
    #[error("storage I/O failure ({context}): {source}")]
    Io {
        /// What the store was doing when the failure occurred.
        context: String,
        /// The originating I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A persisted record or snapshot could not be decoded.
    #[error("corrupt record '{key}': {detail}")]
    Corrupt {
        /// Key of the record that failed to decode ("snapshot" for the
        /// file-store envelope itself).
        key: String,
        /// Decoder diagnostic.
        detail: String,
    },

    /// A conditional write observed a different version than it expected.
    ///
    /// `expected`/`actual` are `None` when the expectation or the stored
    /// state is "no record".
    #[error("version conflict on '{key}': expected {expected:?}, found {actual:?}")]
    Conflict {
        /// Key of the contended record.
        key: String,
        /// Version the writer expected, if any.
        expected: Option<u64>,
        /// Version actually stored, if any.
        actual: Option<u64>,
    },
}

impl StorageError {
    /// Build an [`StorageError::Io`] with a context string.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        StorageError::Io {
            context: context.into(),
            source,
        }
    }

    /// Build a [`StorageError::Corrupt`] for `key`.
    pub fn corrupt(key: impl Into<String>, detail: impl Into<String>) -> Self {
        StorageError::Corrupt {
            key: key.into(),
            detail: detail.into(),
        }
    }

    /// True for [`StorageError::Conflict`]; the ledger's retry loop keys
    /// off this.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StorageError::Conflict { .. })
    }
}

/// Errors surfaced by the commission ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// `record_sale` was called with a zero or negative amount, or one too
    /// large to split or fold into the aggregates.
    #[error("sale amount must be positive and within ledger range, got {amount}")]
    InvalidAmount {
        /// The rejected amount.
        amount: Decimal,
    },

    /// `set_commission_rate` was called with a rate outside `0..=100`.
    #[error("commission rate must be between 0 and 100, got {rate}")]
    InvalidRate {
        /// The rejected rate, in percent.
        rate: Decimal,
    },

    /// The storage backend failed, or a financial record was corrupt.
    #[error("persistence failure: {source}")]
    Persistence {
        /// The underlying storage error.
        #[from]
        source: StorageError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_invalid_amount_display() {
        let err = LedgerError::InvalidAmount { amount: dec!(-5) };
        assert_eq!(
            err.to_string(),
            "sale amount must be positive and within ledger range, got -5"
        );
    }

    #[test]
    fn test_invalid_rate_display() {
        let err = LedgerError::InvalidRate { rate: dec!(101) };
        assert_eq!(
            err.to_string(),
            "commission rate must be between 0 and 100, got 101"
        );
    }

    #[test]
    fn test_storage_error_converts_to_persistence() {
        let err: LedgerError = StorageError::corrupt("ledger/stats", "bad json").into();
        assert!(matches!(
            err,
            LedgerError::Persistence {
                source: StorageError::Corrupt { .. }
            }
        ));
    }

    #[test]
    fn test_conflict_display_mentions_versions() {
        let err = StorageError::Conflict {
            key: "ledger/stats".to_string(),
            expected: Some(3),
            actual: Some(5),
        };
        let msg = err.to_string();
        assert!(msg.contains("ledger/stats"));
        assert!(msg.contains("Some(3)"));
        assert!(msg.contains("Some(5)"));
    }

    #[test]
    fn test_is_conflict() {
        let conflict = StorageError::Conflict {
            key: "k".to_string(),
            expected: None,
            actual: Some(1),
        };
        assert!(conflict.is_conflict());
        assert!(!StorageError::corrupt("k", "x").is_conflict());
    }

    #[test]
    fn test_io_error_preserves_source() {
        let inner = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = StorageError::io("writing snapshot", inner);
        let msg = err.to_string();
        assert!(msg.contains("writing snapshot"));
        assert!(msg.contains("denied"));
    }
}
