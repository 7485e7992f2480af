//! User identity collaborator.
//!
//! Every evaluation call is made for a freshly generated anonymous user
//! id. Identity generation is a collaborator of its own so tests can pin
//! it to a fixed value.

use uuid::Uuid;

/// Generates user identifiers for evaluation calls.
pub trait IdentityProvider: Send + Sync {
    /// Returns a new anonymous user id.
    fn new_anonymous_id(&self) -> String;
}

/// Default identity provider: random UUID v4 per call.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIdentity;

impl IdentityProvider for UuidIdentity {
    fn new_anonymous_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time test: ensure the collaborator trait is object-safe
    fn _assert_identity_object_safe(_: &dyn IdentityProvider) {}

    #[test]
    fn test_ids_are_valid_uuids_and_distinct() {
        let identity = UuidIdentity;
        let a = identity.new_anonymous_id();
        let b = identity.new_anonymous_id();

        assert!(Uuid::parse_str(&a).is_ok());
        assert!(Uuid::parse_str(&b).is_ok());
        assert_ne!(a, b);
    }
}
