//! File-backed snapshot store.
//!
//! Persists the assignment snapshot as a single file:
//!
//! ```text
//! [magic: 4 bytes][version: 1 byte][length: 4 bytes LE][payload: N bytes JSON][crc32: 4 bytes LE]
//! ```
//!
//! The CRC32 checksum detects torn or corrupted files; writes go to a
//! sibling temp file first and are moved into place with an atomic
//! rename, so a crash mid-write leaves the previous snapshot intact.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

use crate::assignment::{AssignmentRecord, ExperimentId};
use crate::storage::traits::{AssignmentStore, StorageError};

/// Magic bytes identifying a splitcache snapshot file.
const MAGIC: [u8; 4] = *b"SPLT";

/// Current snapshot format version.
const FORMAT_VERSION: u8 = 1;

/// Header size: magic + version + length prefix.
const HEADER_LEN: usize = 4 + 1 + 4;

/// Reject unreasonably large snapshots (16 MB is orders of magnitude above
/// any realistic experiment count).
const MAX_PAYLOAD_LEN: usize = 16 * 1024 * 1024;

#[derive(Serialize, Deserialize)]
struct SnapshotPayload {
    written_at: DateTime<Utc>,
    assignments: Vec<AssignmentRecord>,
}

/// Assignment store backed by one checksummed snapshot file.
#[derive(Debug, Clone)]
pub struct SnapshotFileStore {
    path: PathBuf,
}

impl SnapshotFileStore {
    /// Creates a store persisting to the given file path.
    ///
    /// The file and its parent directory are created lazily on the first
    /// `store`; a missing file loads as an empty snapshot.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The snapshot file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map_or_else(
            || std::ffi::OsString::from("snapshot"),
            std::ffi::OsStr::to_os_string,
        );
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn encode(payload: &SnapshotPayload) -> Result<Vec<u8>, StorageError> {
        let data = serde_json::to_vec(payload)?;

        let mut hasher = Hasher::new();
        hasher.update(&data);
        let crc = hasher.finalize();

        let len = u32::try_from(data.len())
            .map_err(|_| StorageError::Backend("snapshot payload exceeds u32 length".to_string()))?;

        let mut out = Vec::with_capacity(HEADER_LEN + data.len() + 4);
        out.extend_from_slice(&MAGIC);
        out.push(FORMAT_VERSION);
        out.extend_from_slice(&len.to_le_bytes());
        out.extend_from_slice(&data);
        out.extend_from_slice(&crc.to_le_bytes());
        Ok(out)
    }

    fn decode(bytes: &[u8]) -> Result<SnapshotPayload, StorageError> {
        if bytes.len() < HEADER_LEN + 4 {
            return Err(StorageError::Corrupt(format!(
                "snapshot file too short: {} bytes",
                bytes.len()
            )));
        }

        if bytes[0..4] != MAGIC {
            return Err(StorageError::Corrupt("bad magic bytes".to_string()));
        }

        let version = bytes[4];
        if version != FORMAT_VERSION {
            return Err(StorageError::Corrupt(format!(
                "unsupported snapshot format version: {version} (expected {FORMAT_VERSION})"
            )));
        }

        let mut len_bytes = [0u8; 4];
        len_bytes.copy_from_slice(&bytes[5..9]);
        let len = u32::from_le_bytes(len_bytes) as usize;

        if len > MAX_PAYLOAD_LEN {
            return Err(StorageError::Corrupt(format!(
                "payload length {len} exceeds maximum {MAX_PAYLOAD_LEN}"
            )));
        }
        if bytes.len() != HEADER_LEN + len + 4 {
            return Err(StorageError::Corrupt(format!(
                "payload length {len} does not match file size {}",
                bytes.len()
            )));
        }

        let data = &bytes[HEADER_LEN..HEADER_LEN + len];

        let mut crc_bytes = [0u8; 4];
        crc_bytes.copy_from_slice(&bytes[HEADER_LEN + len..]);
        let expected = u32::from_le_bytes(crc_bytes);

        let mut hasher = Hasher::new();
        hasher.update(data);
        let actual = hasher.finalize();
        if actual != expected {
            return Err(StorageError::Corrupt(format!(
                "checksum mismatch: expected {expected:#010x}, got {actual:#010x}"
            )));
        }

        Ok(serde_json::from_slice(data)?)
    }
}

impl AssignmentStore for SnapshotFileStore {
    fn load(&self) -> Result<HashMap<ExperimentId, AssignmentRecord>, StorageError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(err) => return Err(err.into()),
        };

        let payload = Self::decode(&bytes)?;
        Ok(payload
            .assignments
            .into_iter()
            .map(|record| (record.experiment_id, record))
            .collect())
    }

    fn store(
        &self,
        assignments: &HashMap<ExperimentId, AssignmentRecord>,
    ) -> Result<(), StorageError> {
        // Sort for byte-stable output given equal contents.
        let mut records: Vec<AssignmentRecord> = assignments.values().cloned().collect();
        records.sort_by_key(|record| record.experiment_id);

        let payload = SnapshotPayload {
            written_at: Utc::now(),
            assignments: records,
        };
        let bytes = Self::encode(&payload)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp = self.temp_path();
        fs::write(&temp, &bytes)?;
        fs::rename(&temp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reason::DecisionReason;

    fn sample() -> HashMap<ExperimentId, AssignmentRecord> {
        let mut map = HashMap::new();
        map.insert(
            ExperimentId::new(42),
            AssignmentRecord::new(ExperimentId::new(42), "B", 1, DecisionReason::TrafficAllocated),
        );
        map.insert(
            ExperimentId::new(43),
            AssignmentRecord::new(ExperimentId::new(43), "A", 2, DecisionReason::Overridden),
        );
        map
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotFileStore::new(dir.path().join("assignments.bin"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn store_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotFileStore::new(dir.path().join("assignments.bin"));

        let assignments = sample();
        store.store(&assignments).unwrap();
        assert_eq!(store.load().unwrap(), assignments);

        // Overwrite with a smaller snapshot; nothing of the old one survives.
        let mut smaller = assignments.clone();
        smaller.remove(&ExperimentId::new(42));
        store.store(&smaller).unwrap();
        assert_eq!(store.load().unwrap(), smaller);
    }

    #[test]
    fn flipped_payload_byte_is_detected_as_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("assignments.bin");
        let store = SnapshotFileStore::new(&path);
        store.store(&sample()).unwrap();

        let mut bytes = fs::read(&path).unwrap();
        let mid = HEADER_LEN + (bytes.len() - HEADER_LEN - 4) / 2;
        bytes[mid] ^= 0xFF;
        fs::write(&path, &bytes).unwrap();

        let err = store.load().unwrap_err();
        assert!(matches!(err, StorageError::Corrupt(_)), "got {err:?}");
    }

    #[test]
    fn truncated_file_is_detected_as_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("assignments.bin");
        let store = SnapshotFileStore::new(&path);
        store.store(&sample()).unwrap();

        let bytes = fs::read(&path).unwrap();
        fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

        assert!(matches!(store.load().unwrap_err(), StorageError::Corrupt(_)));
    }

    #[test]
    fn foreign_file_is_rejected_on_magic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("assignments.bin");
        fs::write(&path, b"definitely not a snapshot").unwrap();

        let store = SnapshotFileStore::new(&path);
        assert!(matches!(store.load().unwrap_err(), StorageError::Corrupt(_)));
    }

    #[test]
    fn no_temp_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotFileStore::new(dir.path().join("assignments.bin"));
        store.store(&sample()).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("assignments.bin")]);
    }
}
