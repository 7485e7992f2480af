//! In-memory storage backend.
//!
//! Thread-safe in-memory implementation of the storage trait, intended
//! for embedded usage, tests, and as a reference implementation.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::assignment::{AssignmentRecord, ExperimentId};
use crate::storage::traits::{AssignmentStore, StorageError};

/// Thread-safe in-memory assignment store.
#[derive(Debug, Default)]
pub struct InMemoryAssignmentStore {
    state: RwLock<HashMap<ExperimentId, AssignmentRecord>>,
}

impl InMemoryAssignmentStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl AssignmentStore for InMemoryAssignmentStore {
    fn load(&self) -> Result<HashMap<ExperimentId, AssignmentRecord>, StorageError> {
        Ok(self.state.read().clone())
    }

    fn store(
        &self,
        assignments: &HashMap<ExperimentId, AssignmentRecord>,
    ) -> Result<(), StorageError> {
        *self.state.write() = assignments.clone();
        Ok(())
    }
}
