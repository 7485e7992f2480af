//! The reconciliation policy.
//!
//! Reconciliation compares a cached assignment to a freshly observed
//! decision (or to the absence of one) and decides whether to keep,
//! replace, or evict the cached entry. The policy lives here as plain
//! functions so it stays independent of where decisions come from and of
//! how the cache is locked.

use std::collections::HashMap;

use tracing::debug;

use crate::assignment::{AssignmentRecord, ExperimentId};
use crate::evaluate::Decision;

/// Merges one freshly observed, validated decision against the cached
/// entry for the same experiment.
///
/// Returns the record that should be stored, or `None` to evict. The rules
/// apply in this exact priority order:
///
/// 1. A *running* reason (`TRAFFIC_ALLOCATED`, `OVERRIDDEN`) always wins:
///    the current record replaces whatever was cached, regardless of
///    version.
/// 2. A *completed* reason (`EXPERIMENT_COMPLETED`, `EXPERIMENT_DRAFT`)
///    evicts the entry.
/// 3. A version mismatch against the cached entry (or no cached entry at
///    all) evicts: the cached campaign generation has ended, even though
///    the current reason does not say so explicitly.
/// 4. Anything else is transient noise (for example
///    `NOT_IN_EXPERIMENT_TARGET` on a momentary targeting miss) and the
///    last known good assignment is preserved unchanged.
#[must_use]
pub fn merge(
    previous: Option<&AssignmentRecord>,
    current: &AssignmentRecord,
) -> Option<AssignmentRecord> {
    if current.reason.is_running() {
        return Some(current.clone());
    }

    if current.reason.is_completed() {
        return None;
    }

    if previous.map(|p| p.version) != Some(current.version) {
        return None;
    }

    previous.cloned()
}

/// The bulk startup pass: prunes a persisted cache against a fresh
/// snapshot of all current decisions.
///
/// For each cached entry:
///
/// - no fresh decision for that id at all means the experiment was
///   archived server-side: evict
/// - a fresh decision that fails validation means completion cannot be
///   determined: keep the entry rather than guess
/// - a completed reason, or a version differing from the cached one:
///   evict
/// - otherwise: keep the entry unchanged
///
/// Fresh decisions with no cached counterpart are ignored; they enter the
/// cache through [`merge`] on first observation, not here.
#[must_use]
pub fn reconcile_all(
    cached: &HashMap<ExperimentId, AssignmentRecord>,
    fresh: &HashMap<ExperimentId, Decision>,
) -> HashMap<ExperimentId, AssignmentRecord> {
    let kept: HashMap<ExperimentId, AssignmentRecord> = cached
        .iter()
        .filter(|(id, record)| !is_concluded(record, fresh.get(*id)))
        .map(|(id, record)| (*id, record.clone()))
        .collect();

    if kept.len() < cached.len() {
        debug!(
            evicted = cached.len() - kept.len(),
            kept = kept.len(),
            "startup reconciliation pruned concluded experiments"
        );
    }

    kept
}

/// Decides whether a cached assignment's experiment has concluded, given
/// the fresh decision observed for it at startup (if any).
fn is_concluded(previous: &AssignmentRecord, current: Option<&Decision>) -> bool {
    // No fresh decision at all: the experiment was archived server-side.
    let Some(current) = current else {
        return true;
    };

    // An invalid fresh decision cannot prove conclusion either way.
    let Some(current) = AssignmentRecord::from_decision(current) else {
        return false;
    };

    if current.reason.is_completed() {
        return true;
    }

    // Version rollover: the cached generation ended.
    current.version != previous.version
}
