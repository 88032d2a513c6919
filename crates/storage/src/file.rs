//! File-backed storage backend
//!
//! Persists all records as one JSON snapshot on disk so the ledger survives
//! a process restart. Payloads are kept base64-encoded in the snapshot and
//! the whole file is rewritten through a temp file plus rename, so readers
//! never observe a half-written snapshot.
//!
//! # Design
//!
//! - Write-through: the in-memory map and the snapshot advance together,
//!   a failed disk write rolls the map back
//! - One writer at a time: put() holds the map's write lock across the
//!   expectation check, the mutation, and the flush
//! - Strict open: a snapshot that fails to parse is reported as corrupt,
//!   never silently replaced

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tally_core::{Expected, Storage, StorageError, StorageResult, VersionedRecord};
use tracing::{debug, info};

/// On-disk form of the whole store.
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    /// Version counter high-water mark at flush time.
    version: u64,
    /// Records keyed by name, sorted for stable snapshots.
    records: BTreeMap<String, SnapshotRecord>,
}

/// On-disk form of a single record.
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotRecord {
    /// Base64-encoded payload.
    data: String,
    version: u64,
    timestamp: i64,
}

/// File-backed versioned store
///
/// # Thread Safety
///
/// All operations are thread-safe:
/// - get(): shared read lock on the record map
/// - put(): exclusive lock held across check, write, and flush
pub struct FileStore {
    /// Snapshot location on disk
    path: PathBuf,
    /// Current records, mirrors the snapshot
    records: RwLock<FxHashMap<String, VersionedRecord>>,
    /// Global version counter
    version: AtomicU64,
}

impl FileStore {
    /// Open the store at `path`, loading an existing snapshot if present.
    ///
    /// A missing file starts an empty store. An unreadable or unparseable
    /// snapshot is an error: financial records are never replaced with
    /// defaults on decode failure.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StorageError::io(format!("create {}", parent.display()), e))?;
            }
        }

        let mut records = FxHashMap::default();
        let mut counter = 0u64;
        match std::fs::read(&path) {
            Ok(bytes) => {
                let snapshot: Snapshot = serde_json::from_slice(&bytes).map_err(|e| {
                    StorageError::corrupt(path.to_string_lossy(), format!("decode failed: {e}"))
                })?;
                counter = snapshot.version;
                for (key, stored) in snapshot.records {
                    let data = BASE64.decode(stored.data.as_bytes()).map_err(|e| {
                        StorageError::corrupt(&key, format!("invalid payload encoding: {e}"))
                    })?;
                    // Guard against a hand-edited counter lagging its records.
                    counter = counter.max(stored.version);
                    records.insert(
                        key,
                        VersionedRecord {
                            data,
                            version: stored.version,
                            timestamp: stored.timestamp,
                        },
                    );
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(StorageError::io(format!("open {}", path.display()), e));
            }
        }

        info!(
            path = %path.display(),
            records = records.len(),
            version = counter,
            "opened file store"
        );
        Ok(Self {
            path,
            records: RwLock::new(records),
            version: AtomicU64::new(counter),
        })
    }

    /// Snapshot location on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get current version
    #[inline]
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    #[inline]
    fn next_version(&self) -> u64 {
        self.version.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Rewrite the snapshot atomically. Called with the write lock held.
    fn flush(&self, records: &FxHashMap<String, VersionedRecord>) -> StorageResult<()> {
        let snapshot = Snapshot {
            version: self.version(),
            records: records
                .iter()
                .map(|(key, record)| {
                    (
                        key.clone(),
                        SnapshotRecord {
                            data: BASE64.encode(&record.data),
                            version: record.version,
                            timestamp: record.timestamp,
                        },
                    )
                })
                .collect(),
        };
        let bytes = serde_json::to_vec_pretty(&snapshot).map_err(|e| {
            StorageError::corrupt(self.path.to_string_lossy(), format!("encode failed: {e}"))
        })?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, &bytes)
            .map_err(|e| StorageError::io(format!("write {}", tmp.display()), e))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| StorageError::io(format!("rename into {}", self.path.display()), e))?;

        debug!(records = records.len(), bytes = bytes.len(), "flushed snapshot");
        Ok(())
    }
}

impl std::fmt::Debug for FileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStore")
            .field("path", &self.path)
            .field("records", &self.records.read().len())
            .field("version", &self.version())
            .finish()
    }
}

impl Storage for FileStore {
    fn get(&self, key: &str) -> StorageResult<Option<VersionedRecord>> {
        Ok(self.records.read().get(key).cloned())
    }

    fn put(&self, key: &str, data: Vec<u8>, expected: Expected) -> StorageResult<u64> {
        let mut records = self.records.write();

        let current = records.get(key).map(|record| record.version);
        if !expected.matches(current) {
            return Err(StorageError::Conflict {
                key: key.to_string(),
                expected: expected.expected_version(),
                actual: current,
            });
        }

        let version = self.next_version();
        let prior = records.insert(key.to_string(), VersionedRecord::new(data, version));

        // Write-through: a failed flush restores the map so memory and
        // disk never disagree.
        if let Err(e) = self.flush(&records) {
            match prior {
                Some(old) => records.insert(key.to_string(), old),
                None => records.remove(key),
            };
            return Err(e);
        }
        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn store_path(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join("ledger.json")
    }

    #[test]
    fn test_open_fresh() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(store_path(&dir)).unwrap();
        assert_eq!(store.version(), 0);
        assert!(store.get("anything").unwrap().is_none());
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/deeper/ledger.json");
        let store = FileStore::open(&path).unwrap();
        store.put("k", b"v".to_vec(), Expected::Any).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_put_get_round_trip() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(store_path(&dir)).unwrap();

        let version = store.put("k", b"payload".to_vec(), Expected::Any).unwrap();
        let record = store.get("k").unwrap().unwrap();
        assert_eq!(record.data, b"payload");
        assert_eq!(record.version, version);
    }

    #[test]
    fn test_reopen_preserves_records_and_versions() {
        let dir = tempdir().unwrap();
        let path = store_path(&dir);

        let v_config;
        let v_stats;
        {
            let store = FileStore::open(&path).unwrap();
            v_config = store.put("config", b"{\"rate\":10}".to_vec(), Expected::Any).unwrap();
            v_stats = store.put("stats", b"{\"total\":0}".to_vec(), Expected::Any).unwrap();
        }

        let store = FileStore::open(&path).unwrap();
        let config = store.get("config").unwrap().unwrap();
        let stats = store.get("stats").unwrap().unwrap();
        assert_eq!(config.data, b"{\"rate\":10}");
        assert_eq!(config.version, v_config);
        assert_eq!(stats.data, b"{\"total\":0}");
        assert_eq!(stats.version, v_stats);

        // The counter resumes past everything on disk.
        let v_next = store.put("more", b"x".to_vec(), Expected::Any).unwrap();
        assert!(v_next > v_stats);
    }

    #[test]
    fn test_open_rejects_garbage_snapshot() {
        let dir = tempdir().unwrap();
        let path = store_path(&dir);
        std::fs::write(&path, b"definitely not json").unwrap();

        let err = FileStore::open(&path).unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { .. }));
    }

    #[test]
    fn test_open_rejects_bad_payload_encoding() {
        let dir = tempdir().unwrap();
        let path = store_path(&dir);
        std::fs::write(
            &path,
            br#"{"version":1,"records":{"k":{"data":"!!! not base64 !!!","version":1,"timestamp":0}}}"#,
        )
        .unwrap();

        let err = FileStore::open(&path).unwrap_err();
        match err {
            StorageError::Corrupt { key, .. } => assert_eq!(key, "k"),
            other => panic!("expected Corrupt, got {other:?}"),
        }
    }

    #[test]
    fn test_cas_conflict_leaves_disk_untouched() {
        let dir = tempdir().unwrap();
        let path = store_path(&dir);

        let store = FileStore::open(&path).unwrap();
        let v1 = store.put("k", b"one".to_vec(), Expected::Any).unwrap();
        store.put("k", b"two".to_vec(), Expected::Any).unwrap();

        let err = store
            .put("k", b"stale".to_vec(), Expected::Version(v1))
            .unwrap_err();
        assert!(err.is_conflict());
        drop(store);

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("k").unwrap().unwrap().data, b"two");
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let dir = tempdir().unwrap();
        let path = store_path(&dir);

        let store = FileStore::open(&path).unwrap();
        store.put("k", b"v".to_vec(), Expected::Any).unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_concurrent_cas_on_shared_file() {
        use std::thread;

        let dir = tempdir().unwrap();
        let store = Arc::new(FileStore::open(store_path(&dir)).unwrap());
        store.put("counter", b"0".to_vec(), Expected::Absent).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..10 {
                        loop {
                            let current = store.get("counter").unwrap().unwrap();
                            let n: u64 =
                                String::from_utf8(current.data.clone()).unwrap().parse().unwrap();
                            let next = (n + 1).to_string().into_bytes();
                            match store.put("counter", next, Expected::Version(current.version)) {
                                Ok(_) => break,
                                Err(StorageError::Conflict { .. }) => continue,
                                Err(other) => panic!("unexpected error: {other:?}"),
                            }
                        }
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        let final_value = store.get("counter").unwrap().unwrap();
        assert_eq!(String::from_utf8(final_value.data).unwrap(), "40");
    }
}
