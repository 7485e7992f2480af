//! Decision reason codes.
//!
//! Every decision produced by the evaluation SDK carries a reason code
//! explaining why the variation was assigned. The reconciliation policy
//! only cares about two categories of reasons; everything else is treated
//! as transient and non-authoritative.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Enumerated cause code for an assignment outcome.
///
/// Serialized in `SCREAMING_SNAKE_CASE`, matching the wire form produced
/// by the evaluation SDK on both the native and web sides. Codes this
/// crate does not know about deserialize to [`DecisionReason::Unknown`]
/// rather than failing, so a newer SDK cannot break payload parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionReason {
    /// The SDK was not yet initialized when evaluation was requested.
    SdkNotReady,

    /// Evaluation failed internally; the default variation was returned.
    Exception,

    /// The evaluation request itself was malformed.
    InvalidInput,

    /// No experiment exists for the requested key.
    ExperimentNotFound,

    /// The experiment has not started (or was reset after completion).
    ExperimentDraft,

    /// The experiment is paused.
    ExperimentPaused,

    /// The experiment concluded and a winner was rolled out.
    ExperimentCompleted,

    /// The assignment was force-overridden (test device).
    Overridden,

    /// The user was not allocated any experiment traffic.
    TrafficNotAllocated,

    /// The user belongs to a mutually exclusive sibling experiment.
    NotInMutualExclusionExperiment,

    /// The user could not be identified.
    IdentifierNotFound,

    /// The user does not match the experiment's targeting rules.
    NotInExperimentTarget,

    /// The user was allocated traffic and assigned a variation.
    TrafficAllocated,

    /// A reason code this crate does not recognize.
    #[serde(other)]
    Unknown,
}

impl DecisionReason {
    /// True for reasons that mean the experiment is actively running for
    /// this user: the assignment is authoritative and supersedes whatever
    /// was cached.
    #[must_use]
    pub const fn is_running(self) -> bool {
        matches!(self, Self::TrafficAllocated | Self::Overridden)
    }

    /// True for reasons that mean the experiment has concluded (completed,
    /// or redrafted after completion): the cached assignment must go.
    #[must_use]
    pub const fn is_completed(self) -> bool {
        matches!(self, Self::ExperimentCompleted | Self::ExperimentDraft)
    }
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::SdkNotReady => "SDK_NOT_READY",
            Self::Exception => "EXCEPTION",
            Self::InvalidInput => "INVALID_INPUT",
            Self::ExperimentNotFound => "EXPERIMENT_NOT_FOUND",
            Self::ExperimentDraft => "EXPERIMENT_DRAFT",
            Self::ExperimentPaused => "EXPERIMENT_PAUSED",
            Self::ExperimentCompleted => "EXPERIMENT_COMPLETED",
            Self::Overridden => "OVERRIDDEN",
            Self::TrafficNotAllocated => "TRAFFIC_NOT_ALLOCATED",
            Self::NotInMutualExclusionExperiment => "NOT_IN_MUTUAL_EXCLUSION_EXPERIMENT",
            Self::IdentifierNotFound => "IDENTIFIER_NOT_FOUND",
            Self::NotInExperimentTarget => "NOT_IN_EXPERIMENT_TARGET",
            Self::TrafficAllocated => "TRAFFIC_ALLOCATED",
            Self::Unknown => "UNKNOWN",
        };
        write!(f, "{s}")
    }
}
