//! Abstract storage trait for assignment snapshots.
//!
//! The trait defines the contract a storage backend must implement. By
//! using a trait, we enable:
//! - In-memory backends for testing and embedded use
//! - File-backed backends for production
//! - Host-platform backends (preferences stores, key-value services)

use std::collections::HashMap;

use thiserror::Error;

use crate::assignment::{AssignmentRecord, ExperimentId};

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be read or written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The persisted snapshot failed integrity checks.
    #[error("snapshot is corrupt: {0}")]
    Corrupt(String),

    /// (De)serialization of the snapshot failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend-specific failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Storage backend for the persisted assignment snapshot.
///
/// # Safety Considerations
/// - `store` always receives the full current cache state; a backend never
///   has to reason about partial updates or mixed old/new contents
/// - Implementations should handle concurrent access safely
pub trait AssignmentStore: Send + Sync {
    /// Loads the persisted snapshot.
    ///
    /// An empty backend (nothing persisted yet) loads as an empty map, not
    /// an error.
    fn load(&self) -> Result<HashMap<ExperimentId, AssignmentRecord>, StorageError>;

    /// Overwrites the persisted snapshot with the given cache state.
    fn store(
        &self,
        assignments: &HashMap<ExperimentId, AssignmentRecord>,
    ) -> Result<(), StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time test: ensure the trait is object-safe
    fn _assert_assignment_store_object_safe(_: &dyn AssignmentStore) {}

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::Corrupt("checksum mismatch".to_string());
        assert!(err.to_string().contains("checksum mismatch"));

        let err = StorageError::Backend("preferences unavailable".to_string());
        assert!(err.to_string().contains("preferences unavailable"));
    }

    #[test]
    fn test_storage_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: StorageError = io.into();
        assert!(matches!(err, StorageError::Io(_)));
    }
}
