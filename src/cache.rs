//! The in-memory assignment cache.
//!
//! A lock-guarded map from experiment id to the currently believed-valid
//! assignment. Mutations only happen through reconciliation results:
//! [`AssignmentCache::apply`] runs the merge policy under the map's write
//! lock, which makes the compute-and-replace for one experiment id
//! linearizable against every concurrent writer (the native evaluation
//! path and the web bridge race for the same ids).

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::assignment::{AssignmentRecord, ExperimentId};
use crate::reconcile;

/// A full, consistent copy of the cache contents, as handed to the
/// persisted-storage collaborator after every mutation.
pub type CacheSnapshot = HashMap<ExperimentId, AssignmentRecord>;

/// Concurrency-safe map of active experiment assignments.
///
/// Whole-map locking is deliberate: per-key atomicity is the hard
/// requirement, and with one entry per experiment contention stays low
/// enough that finer-grained locking buys nothing.
#[derive(Debug, Default)]
pub struct AssignmentCache {
    state: RwLock<HashMap<ExperimentId, AssignmentRecord>>,
}

impl AssignmentCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached assignment for an experiment, if any.
    #[must_use]
    pub fn get(&self, id: ExperimentId) -> Option<AssignmentRecord> {
        self.state.read().get(&id).cloned()
    }

    /// Merges a freshly observed, validated decision into the cache.
    ///
    /// The previous entry is read, the merge policy runs, and the result
    /// is installed (or the entry removed) all under one write lock, so a
    /// racing writer for the same id can never interleave between the read
    /// and the write. Returns the post-mutation snapshot, taken under the
    /// same lock, so the caller persists exactly the state it produced.
    pub fn apply(&self, current: AssignmentRecord) -> CacheSnapshot {
        let mut state = self.state.write();
        let id = current.experiment_id;
        match reconcile::merge(state.get(&id), &current) {
            Some(record) => {
                state.insert(id, record);
            }
            None => {
                state.remove(&id);
            }
        }
        state.clone()
    }

    /// Replaces the entire cache contents.
    ///
    /// Used only by the startup reconciliation pass, before the repository
    /// is shared with concurrent callers. Returns the installed snapshot.
    pub fn replace_all(&self, new_state: CacheSnapshot) -> CacheSnapshot {
        let mut state = self.state.write();
        *state = new_state;
        state.clone()
    }

    /// Returns a copy of the current cache contents.
    #[must_use]
    pub fn snapshot(&self) -> CacheSnapshot {
        self.state.read().clone()
    }

    /// Number of cached assignments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().len()
    }

    /// True when nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reason::DecisionReason;

    fn record(id: u64, variation: &str, version: u32, reason: DecisionReason) -> AssignmentRecord {
        AssignmentRecord::new(ExperimentId::new(id), variation, version, reason)
    }

    #[test]
    fn apply_installs_running_assignments() {
        let cache = AssignmentCache::new();
        let snapshot = cache.apply(record(42, "B", 1, DecisionReason::TrafficAllocated));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(
            cache.get(ExperimentId::new(42)),
            Some(record(42, "B", 1, DecisionReason::TrafficAllocated))
        );
    }

    #[test]
    fn apply_removes_on_eviction() {
        let cache = AssignmentCache::new();
        cache.apply(record(42, "B", 1, DecisionReason::TrafficAllocated));
        let snapshot = cache.apply(record(42, "B", 1, DecisionReason::ExperimentCompleted));

        assert!(snapshot.is_empty());
        assert!(cache.get(ExperimentId::new(42)).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn apply_keeps_previous_on_transient_reasons() {
        let cache = AssignmentCache::new();
        cache.apply(record(43, "A", 1, DecisionReason::Overridden));
        cache.apply(record(43, "B", 1, DecisionReason::NotInExperimentTarget));

        assert_eq!(
            cache.get(ExperimentId::new(43)),
            Some(record(43, "A", 1, DecisionReason::Overridden))
        );
    }

    #[test]
    fn entries_for_different_ids_do_not_interact() {
        let cache = AssignmentCache::new();
        cache.apply(record(1, "A", 1, DecisionReason::TrafficAllocated));
        cache.apply(record(2, "B", 1, DecisionReason::TrafficAllocated));
        cache.apply(record(1, "A", 1, DecisionReason::ExperimentCompleted));

        assert!(cache.get(ExperimentId::new(1)).is_none());
        assert_eq!(
            cache.get(ExperimentId::new(2)),
            Some(record(2, "B", 1, DecisionReason::TrafficAllocated))
        );
    }

    #[test]
    fn replace_all_swaps_contents() {
        let cache = AssignmentCache::new();
        cache.apply(record(1, "A", 1, DecisionReason::TrafficAllocated));

        let mut new_state = CacheSnapshot::new();
        let replacement = record(2, "B", 3, DecisionReason::Overridden);
        new_state.insert(replacement.experiment_id, replacement.clone());

        let snapshot = cache.replace_all(new_state);
        assert_eq!(snapshot.len(), 1);
        assert!(cache.get(ExperimentId::new(1)).is_none());
        assert_eq!(cache.get(ExperimentId::new(2)), Some(replacement));
    }

    #[test]
    fn snapshot_is_a_detached_copy() {
        let cache = AssignmentCache::new();
        cache.apply(record(1, "A", 1, DecisionReason::TrafficAllocated));

        let snapshot = cache.snapshot();
        cache.apply(record(1, "A", 1, DecisionReason::ExperimentCompleted));

        assert_eq!(snapshot.len(), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn concurrent_same_key_updates_lose_no_writer() {
        use std::sync::Arc;
        use std::thread;

        let cache = Arc::new(AssignmentCache::new());
        let mut handles = Vec::new();

        for worker in 0..4u32 {
            let cache = Arc::clone(&cache);
            handles.push(thread::spawn(move || {
                for round in 0..250u32 {
                    let variation = if (worker + round) % 2 == 0 { "A" } else { "B" };
                    cache.apply(record(
                        7,
                        variation,
                        1,
                        DecisionReason::TrafficAllocated,
                    ));
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        // Every update was a running decision for the same id: exactly one
        // entry survives and it is one of the written values.
        let survivor = cache.get(ExperimentId::new(7)).unwrap();
        assert_eq!(cache.len(), 1);
        assert!(survivor.variation == "A" || survivor.variation == "B");
        assert_eq!(survivor.reason, DecisionReason::TrafficAllocated);
    }
}
