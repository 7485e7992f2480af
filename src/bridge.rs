//! Embedded web content bridge.
//!
//! Web pages rendered inside the app evaluate experiments through the web
//! SDK and post their decisions back over the host bridge so both sides
//! agree on what the user was assigned:
//!
//! ```ts
//! const decision = useVariationDetail(key)
//! bridge.recordDecision(JSON.stringify(decision))
//! ```
//!
//! The payload is untrusted and loosely typed; anything malformed is a
//! no-op, never an error surfaced to the embedded page.

use std::sync::Arc;

use crate::repository::ExperimentRepository;

/// Host-side endpoint for decisions observed by embedded web content.
#[derive(Clone)]
pub struct WebViewBridge {
    repository: Arc<ExperimentRepository>,
}

impl WebViewBridge {
    /// Creates a bridge forwarding into the given repository.
    #[must_use]
    pub fn new(repository: Arc<ExperimentRepository>) -> Self {
        Self { repository }
    }

    /// Records one serialized decision payload.
    pub fn record(&self, json: &str) {
        self.repository.record_external_decision(json);
    }
}
