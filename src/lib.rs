//! # splitcache - a reconciling A/B test assignment cache
//!
//! splitcache keeps a locally cached view of a client's active experiment
//! assignments consistent with the authoritative decisions produced by an
//! external evaluation SDK. Decisions arrive from two independent sources
//! (a native evaluation call and an embedded web view callback) and are
//! merged into the cache through a single deterministic reconciliation
//! policy; a bulk pass at process startup prunes everything the server has
//! since completed or archived.
//!
//! ## Core Concepts
//!
//! - **AssignmentRecord**: one cached experiment outcome (variation,
//!   version, decision reason)
//! - **Reconciler**: the merge policy deciding keep / replace / evict
//! - **AssignmentCache**: the concurrency-safe in-memory map, written
//!   through to a persisted snapshot after every mutation
//! - **ExperimentRepository**: the constructed service wiring evaluator,
//!   cache, storage, and identity collaborators together
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use splitcache::{ExperimentRepository, InMemoryAssignmentStore, UuidIdentity};
//!
//! let repository = Arc::new(ExperimentRepository::new(
//!     Arc::new(sdk),                             // VariationEvaluator
//!     Arc::new(InMemoryAssignmentStore::new()),  // AssignmentStore
//!     Arc::new(UuidIdentity),
//! ));
//!
//! repository.init();
//! let variation = repository.get_assignment(42.into());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod assignment;
pub mod bridge;
pub mod cache;
pub mod evaluate;
pub mod identity;
pub mod reason;
pub mod reconcile;
pub mod repository;
pub mod storage;

// Re-export primary types at crate root for convenience
pub use assignment::{AssignmentRecord, ExperimentId};
pub use bridge::WebViewBridge;
pub use cache::{AssignmentCache, CacheSnapshot};
pub use evaluate::{Decision, ExperimentRef, VariationEvaluator};
pub use identity::{IdentityProvider, UuidIdentity};
pub use reason::DecisionReason;
pub use repository::ExperimentRepository;
pub use storage::{AssignmentStore, InMemoryAssignmentStore, StorageError};

#[cfg(feature = "persistent")]
pub use storage::SnapshotFileStore;
