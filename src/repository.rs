//! The experiment repository.
//!
//! `ExperimentRepository` wires the collaborators together: it asks the
//! evaluation engine for decisions, runs them through the reconciliation
//! policy, keeps the in-memory cache current, and writes the full
//! snapshot through to persisted storage after every mutation.
//!
//! No method on this surface returns an error. Invalid decisions are
//! dropped, and persistence failures are logged and swallowed: the
//! in-memory cache remains the source of truth for the process lifetime
//! even when the backing store lags or fails.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::assignment::{AssignmentRecord, ExperimentId};
use crate::cache::{AssignmentCache, CacheSnapshot};
use crate::evaluate::VariationEvaluator;
use crate::identity::IdentityProvider;
use crate::reconcile;
use crate::storage::AssignmentStore;

/// Locally cached view of a client's active experiment assignments.
///
/// Constructed once at process start with its collaborators injected and
/// then shared (via `Arc`) with every call site; there is no ambient
/// global. Call [`init`](Self::init) before exposing the repository to
/// concurrent callers.
pub struct ExperimentRepository {
    evaluator: Arc<dyn VariationEvaluator>,
    store: Arc<dyn AssignmentStore>,
    identity: Arc<dyn IdentityProvider>,
    cache: AssignmentCache,
}

impl ExperimentRepository {
    /// Creates a repository over the given collaborators.
    #[must_use]
    pub fn new(
        evaluator: Arc<dyn VariationEvaluator>,
        store: Arc<dyn AssignmentStore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            evaluator,
            store,
            identity,
            cache: AssignmentCache::new(),
        }
    }

    /// Runs the startup reconciliation pass.
    ///
    /// Loads the persisted snapshot, fetches every current decision from
    /// the evaluation engine, prunes everything that has concluded since
    /// the snapshot was written, and installs the result as both the
    /// in-memory and persisted state. A failed load degrades to an empty
    /// starting map rather than failing startup.
    pub fn init(&self) {
        let cached = match self.store.load() {
            Ok(cached) => cached,
            Err(err) => {
                warn!(error = %err, "failed to load persisted assignments, starting empty");
                HashMap::new()
            }
        };

        let user = self.identity.new_anonymous_id();
        let fresh = self.evaluator.all_variation_details(&user);

        let reconciled = reconcile::reconcile_all(&cached, &fresh);
        let snapshot = self.cache.replace_all(reconciled);
        self.persist(&snapshot);
    }

    /// Evaluates an experiment and returns the assigned variation name.
    ///
    /// The decision is validated and reconciled into the cache when it
    /// carries experiment metadata; either way the caller gets the
    /// variation name the engine answered with, so an invalid decision
    /// still resolves to its fallback variation.
    pub fn get_assignment(&self, experiment_id: ExperimentId) -> String {
        let user = self.identity.new_anonymous_id();
        let decision = self.evaluator.variation_detail(experiment_id, &user);

        match AssignmentRecord::from_decision(&decision) {
            Some(record) => self.apply(record),
            None => {
                debug!(%experiment_id, reason = %decision.reason, "decision carries no experiment metadata, not cached");
            }
        }

        decision.variation
    }

    /// Bridge entry point: records a decision observed by embedded web
    /// content.
    ///
    /// The payload is untrusted and loosely typed; malformed JSON or a
    /// payload without experiment metadata is a no-op.
    pub fn record_external_decision(&self, raw: &str) {
        let Ok(value) = serde_json::from_str::<serde_json::Value>(raw) else {
            debug!("dropping unparseable external decision payload");
            return;
        };

        let Some(record) = AssignmentRecord::from_json(&value) else {
            debug!("dropping external decision without experiment metadata");
            return;
        };

        self.apply(record);
    }

    /// Returns the cached assignment for an experiment, if any.
    #[must_use]
    pub fn assignment(&self, experiment_id: ExperimentId) -> Option<AssignmentRecord> {
        self.cache.get(experiment_id)
    }

    /// Returns a copy of the full cached state.
    #[must_use]
    pub fn assignments(&self) -> CacheSnapshot {
        self.cache.snapshot()
    }

    fn apply(&self, record: AssignmentRecord) {
        let snapshot = self.cache.apply(record);
        self.persist(&snapshot);
    }

    fn persist(&self, snapshot: &CacheSnapshot) {
        if let Err(err) = self.store.store(snapshot) {
            warn!(error = %err, "failed to persist assignment snapshot");
        }
    }
}
