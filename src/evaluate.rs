//! Evaluation collaborator interface.
//!
//! The decision engine that computes variation assignments is external to
//! this crate (the vendor SDK owns targeting, percentages, and allocation).
//! This module defines the boundary it is consumed through: the
//! [`Decision`] value it produces and the [`VariationEvaluator`] trait the
//! repository calls.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::assignment::ExperimentId;
use crate::reason::DecisionReason;

/// Reference to the experiment a decision was made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentRef {
    /// The experiment's identifier.
    pub id: ExperimentId,

    /// The experiment's configuration version at decision time.
    pub version: u32,
}

impl ExperimentRef {
    /// Creates an experiment reference.
    #[must_use]
    pub const fn new(id: ExperimentId, version: u32) -> Self {
        Self { id, version }
    }
}

/// One fresh evaluation outcome, not yet admitted to the cache.
///
/// `experiment` is absent when the engine could not resolve an experiment
/// at all (for example `EXPERIMENT_NOT_FOUND`); such a decision still
/// carries a fallback variation name for the caller, but it is invalid as
/// cache input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// The experiment the decision refers to, if one was identifiable.
    pub experiment: Option<ExperimentRef>,

    /// Name of the assigned (or fallback) variation.
    pub variation: String,

    /// Why this variation was assigned.
    pub reason: DecisionReason,
}

impl Decision {
    /// Creates a decision with no identifiable experiment.
    #[must_use]
    pub fn of(variation: impl Into<String>, reason: DecisionReason) -> Self {
        Self {
            experiment: None,
            variation: variation.into(),
            reason,
        }
    }

    /// Creates a decision for a resolved experiment.
    #[must_use]
    pub fn with_experiment(
        experiment: ExperimentRef,
        variation: impl Into<String>,
        reason: DecisionReason,
    ) -> Self {
        Self {
            experiment: Some(experiment),
            variation: variation.into(),
            reason,
        }
    }
}

/// The external decision engine, consumed at this boundary.
///
/// Implementations wrap the vendor SDK. Both calls are synchronous and
/// infallible from this crate's point of view: whatever retry or fallback
/// behavior the SDK has, it always hands back *some* decision.
pub trait VariationEvaluator: Send + Sync {
    /// Evaluates a single experiment for the given user.
    fn variation_detail(&self, experiment_id: ExperimentId, user_id: &str) -> Decision;

    /// Evaluates every known experiment for the given user.
    ///
    /// Used once, by the startup reconciliation pass.
    fn all_variation_details(&self, user_id: &str) -> HashMap<ExperimentId, Decision>;
}
