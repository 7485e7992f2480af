//! Cached assignment records and their validation gate.
//!
//! A decision only becomes an [`AssignmentRecord`] if it carries
//! identifiable experiment metadata (an id and a version). Decisions come
//! in two raw shapes - the typed [`Decision`](crate::evaluate::Decision)
//! value from the native SDK and the loosely typed JSON payload posted by
//! embedded web content - and both normalize through this module. A
//! payload that fails validation is dropped before it can touch the cache.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::evaluate::Decision;
use crate::reason::DecisionReason;

/// Unique identifier of an experiment.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ExperimentId(u64);

impl ExperimentId {
    /// Creates an experiment id from its numeric key.
    #[must_use]
    pub const fn new(key: u64) -> Self {
        Self(key)
    }

    /// Returns the numeric key.
    #[must_use]
    pub const fn key(self) -> u64 {
        self.0
    }
}

impl From<u64> for ExperimentId {
    fn from(key: u64) -> Self {
        Self(key)
    }
}

impl fmt::Display for ExperimentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One cached experiment outcome.
///
/// A record is meaningful only paired with its experiment id; records for
/// different ids never interact during reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    /// The experiment this record belongs to.
    pub experiment_id: ExperimentId,

    /// Name of the assigned variation.
    pub variation: String,

    /// The experiment's configuration version at decision time. A version
    /// change signals that the prior generation of the experiment ended.
    pub version: u32,

    /// Why this variation was assigned.
    pub reason: DecisionReason,
}

impl AssignmentRecord {
    /// Creates a record from its parts.
    #[must_use]
    pub fn new(
        experiment_id: ExperimentId,
        variation: impl Into<String>,
        version: u32,
        reason: DecisionReason,
    ) -> Self {
        Self {
            experiment_id,
            variation: variation.into(),
            version,
            reason,
        }
    }

    /// Validates a typed decision from the native evaluation path.
    ///
    /// Returns `None` when the decision carries no experiment reference,
    /// which happens for outcomes like `EXPERIMENT_NOT_FOUND` where there
    /// is nothing identifiable to cache.
    #[must_use]
    pub fn from_decision(decision: &Decision) -> Option<Self> {
        let experiment = decision.experiment.as_ref()?;
        Some(Self {
            experiment_id: experiment.id,
            variation: decision.variation.clone(),
            version: experiment.version,
            reason: decision.reason,
        })
    }

    /// Validates a loosely typed decision payload from embedded content.
    ///
    /// The expected shape is what the web SDK serializes:
    ///
    /// ```json
    /// {
    ///   "experiment": { "key": 42, "version": 1 },
    ///   "variation": "B",
    ///   "decisionReason": "TRAFFIC_ALLOCATED"
    /// }
    /// ```
    ///
    /// Any missing key, wrong type, or non-object payload yields `None`;
    /// extraction failures are validation failures, never panics.
    #[must_use]
    pub fn from_json(raw: &serde_json::Value) -> Option<Self> {
        let experiment = raw.get("experiment")?;
        let key = experiment.get("key")?.as_u64()?;
        let version = u32::try_from(experiment.get("version")?.as_u64()?).ok()?;
        let variation = raw.get("variation")?.as_str()?.to_string();
        let reason = raw.get("decisionReason")?.as_str()?;
        let reason: DecisionReason =
            serde_json::from_value(serde_json::Value::String(reason.to_string())).ok()?;

        Some(Self {
            experiment_id: ExperimentId::new(key),
            variation,
            version,
            reason,
        })
    }
}
