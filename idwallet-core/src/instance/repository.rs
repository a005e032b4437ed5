//! Secure-area façade.

use std::sync::Arc;

use idwallet_store::PreferencesStore;

use crate::secure_area::{AttestationFields, SecureArea, SecureAreaController};

/// Unifies alias generation, key creation, attestation encoding, and key
/// hashing behind three operations, decoupling upper layers from the
/// hardware API.
pub struct SecureAreaRepository {
    controller: SecureAreaController,
}

impl SecureAreaRepository {
    /// Builds the repository over a secure element and preferences store.
    #[must_use]
    pub fn new(secure_area: Arc<dyn SecureArea>, prefs: Arc<dyn PreferencesStore>) -> Self {
        Self {
            controller: SecureAreaController::new(secure_area, prefs),
        }
    }

    /// Generates a hardware key and its attestation for `challenge`.
    /// All-or-nothing; see [`SecureAreaController::generate_key_with_attestation`].
    #[must_use]
    pub fn generate_key_with_attestation(&self, challenge: &str) -> Option<AttestationFields> {
        self.controller.generate_key_with_attestation(challenge)
    }

    /// Whether a live hardware key exists for this installation.
    #[must_use]
    pub fn check_instance(&self) -> bool {
        self.controller.check_instance()
    }

    /// Tears down the hardware key. Idempotent, never fails.
    pub fn delete_instance(&self) {
        self.controller.delete_key();
    }
}
