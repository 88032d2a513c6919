//! In-memory storage backend
//!
//! DashMap-backed store with a global version counter. The default backend
//! for tests and for embedders who do not need the ledger to survive a
//! restart.
//!
//! # Design
//!
//! - DashMap: 16-way sharded by default, lock-free reads
//! - Compare-and-swap: the expectation check and the write happen under
//!   the key's entry lock, so they are one atomic step
//! - AtomicU64 versions: global counter, per-key versions strictly grow

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tally_core::{Expected, Storage, StorageError, StorageResult, VersionedRecord};

/// In-memory versioned store
///
/// # Thread Safety
///
/// All operations are thread-safe:
/// - get(): Lock-free read via DashMap
/// - put(): Only locks the target key's entry while checking and writing
///
/// # Example
///
/// ```ignore
/// use tally_storage::MemoryStore;
/// use std::sync::Arc;
///
/// let store = Arc::new(MemoryStore::new());
/// ```
pub struct MemoryStore {
    /// Versioned records keyed by name
    records: DashMap<String, VersionedRecord>,
    /// Global version counter
    version: AtomicU64,
}

impl MemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            version: AtomicU64::new(0),
        }
    }

    /// Get current version
    #[inline]
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Increment version and return new value
    #[inline]
    fn next_version(&self) -> u64 {
        self.version.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the store holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("records", &self.len())
            .field("version", &self.version())
            .finish()
    }
}

impl Storage for MemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<VersionedRecord>> {
        Ok(self.records.get(key).map(|entry| entry.value().clone()))
    }

    fn put(&self, key: &str, data: Vec<u8>, expected: Expected) -> StorageResult<u64> {
        // The entry guard locks this key's shard, making check-then-write
        // atomic with respect to concurrent puts on the same key.
        match self.records.entry(key.to_string()) {
            Entry::Occupied(mut slot) => {
                let current = slot.get().version;
                if !expected.matches(Some(current)) {
                    return Err(StorageError::Conflict {
                        key: key.to_string(),
                        expected: expected.expected_version(),
                        actual: Some(current),
                    });
                }
                let version = self.next_version();
                slot.insert(VersionedRecord::new(data, version));
                Ok(version)
            }
            Entry::Vacant(slot) => {
                if !expected.matches(None) {
                    return Err(StorageError::Conflict {
                        key: key.to_string(),
                        expected: expected.expected_version(),
                        actual: None,
                    });
                }
                let version = self.next_version();
                slot.insert(VersionedRecord::new(data, version));
                Ok(version)
            }
        }
    }
}
