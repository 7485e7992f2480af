//! Persisted-storage collaborator for assignment snapshots.
//!
//! The cache is written through to durable storage as a full snapshot
//! after every mutation; no partial-update API exists or is needed. The
//! trait lives here, an in-memory backend ships for embedded and test
//! use, and a checksummed single-file backend is available behind the
//! `persistent` feature.

mod memory;
mod traits;

#[cfg(feature = "persistent")]
mod snapshot;

pub use memory::InMemoryAssignmentStore;
pub use traits::{AssignmentStore, StorageError};

#[cfg(feature = "persistent")]
pub use snapshot::SnapshotFileStore;
