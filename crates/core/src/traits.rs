//! Storage abstraction for the ledger.
//!
//! Backends implement [`Storage`]: a string-keyed byte store where every
//! record carries a monotonically increasing version. Writers state what
//! version they expect via [`Expected`] and the backend applies the write
//! atomically only when the expectation holds, otherwise it reports a
//! conflict. All ledger mutations are built as read-modify-write loops on
//! top of this compare-and-swap primitive.
//!
//! # Design
//!
//! - Versions are assigned by the backend and only ever grow per key.
//! - `Expected::Absent` makes first-writer-wins bootstrap possible without
//!   a separate "create" call.
//! - The trait is object safe so facades can hold `Arc<dyn Storage>` and
//!   swap in-memory and file-backed stores freely.

use chrono::Utc;

use crate::error::StorageResult;

/// A stored record together with its version metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedRecord {
    /// Serialized record payload.
    pub data: Vec<u8>,
    /// Backend-assigned version, increases with every successful write.
    pub version: u64,
    /// Unix timestamp (seconds) of the write that produced this version.
    pub timestamp: i64,
}

impl VersionedRecord {
    /// Wrap a payload with a freshly stamped timestamp.
    pub fn new(data: Vec<u8>, version: u64) -> Self {
        Self {
            data,
            version,
            timestamp: Utc::now().timestamp(),
        }
    }
}

/// Precondition a writer attaches to a `put`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    /// Write unconditionally, whatever is stored.
    Any,
    /// Write only if no record exists under the key yet.
    Absent,
    /// Write only if the current record has exactly this version.
    Version(u64),
}

impl Expected {
    /// Check the precondition against the key's current version.
    pub fn matches(&self, current: Option<u64>) -> bool {
        match self {
            Expected::Any => true,
            Expected::Absent => current.is_none(),
            Expected::Version(v) => current == Some(*v),
        }
    }

    /// The concrete version this precondition names, if any.
    pub fn expected_version(&self) -> Option<u64> {
        match self {
            Expected::Version(v) => Some(*v),
            Expected::Any | Expected::Absent => None,
        }
    }
}

/// Versioned key-value backend the ledger persists through.
///
/// Implementations must apply each `put` atomically with respect to
/// concurrent calls on the same key: the expectation check and the write
/// are one indivisible step.
pub trait Storage: Send + Sync {
    /// Read the current record under `key`, if any.
    fn get(&self, key: &str) -> StorageResult<Option<VersionedRecord>>;

    /// Write `data` under `key` if `expected` matches the current version.
    ///
    /// Returns the version assigned to the new record. Fails with
    /// [`StorageError::Conflict`](crate::error::StorageError::Conflict)
    /// when the expectation does not hold.
    fn put(&self, key: &str, data: Vec<u8>, expected: Expected) -> StorageResult<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_any_always_matches() {
        assert!(Expected::Any.matches(None));
        assert!(Expected::Any.matches(Some(7)));
    }

    #[test]
    fn test_expected_absent_matches_only_missing() {
        assert!(Expected::Absent.matches(None));
        assert!(!Expected::Absent.matches(Some(1)));
    }

    #[test]
    fn test_expected_version_matches_exact() {
        assert!(Expected::Version(3).matches(Some(3)));
        assert!(!Expected::Version(3).matches(Some(4)));
        assert!(!Expected::Version(3).matches(None));
    }

    #[test]
    fn test_expected_version_exposes_value() {
        assert_eq!(Expected::Version(9).expected_version(), Some(9));
        assert_eq!(Expected::Any.expected_version(), None);
        assert_eq!(Expected::Absent.expected_version(), None);
    }

    #[test]
    fn test_versioned_record_stamps_timestamp() {
        let record = VersionedRecord::new(vec![1, 2, 3], 5);
        assert_eq!(record.version, 5);
        assert!(record.timestamp > 0);
    }
}
