//! Wallet-instance key lifecycle.
//!
//! Owns exactly one hardware-backed signing key per installation. Every
//! secure-element failure is absorbed here and mapped to a sentinel (`None`
//! / `false`); callers treat "no attestation" as a legitimate retryable
//! state, not a crash.

use std::sync::Arc;

use idwallet_store::PreferencesStore;
use tracing::{debug, warn};

use crate::attestation::{encode_attestation, public_key_tag};
use crate::challenge::decode_challenge_digest;
use crate::key_alias::generate_key_alias;
use crate::secure_area::{KeySpec, SecureArea};

/// Preference key holding the active hardware key alias. At most one alias
/// is persisted at any time.
pub const WALLET_KEY_ALIAS_PREF: &str = "wallet_instance_key_alias";

/// The three fields of a completed attestation, all populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestationFields {
    /// The original challenge, echoed byte-for-byte.
    pub challenge: String,
    /// CBOR attestation envelope, base64url without padding.
    pub key_attestation: String,
    /// SHA-256 of the uncompressed public key, standard base64.
    pub hardware_key_tag: String,
}

/// Sequencing layer over the platform secure element.
pub struct SecureAreaController {
    secure_area: Arc<dyn SecureArea>,
    prefs: Arc<dyn PreferencesStore>,
}

impl SecureAreaController {
    /// Creates a controller over the given secure element and preferences.
    pub fn new(secure_area: Arc<dyn SecureArea>, prefs: Arc<dyn PreferencesStore>) -> Self {
        Self { secure_area, prefs }
    }

    /// Generates a fresh hardware key and produces its attestation for
    /// `challenge`.
    ///
    /// Returns either all three attestation fields or `None`, never a
    /// partial result. The new alias is persisted before key creation, so
    /// the stored alias always refers to the key of the current call and a
    /// caller-driven rollback via [`delete_key`](Self::delete_key) covers
    /// every failure point. This controller does not roll back on its own.
    #[must_use]
    pub fn generate_key_with_attestation(&self, challenge: &str) -> Option<AttestationFields> {
        let digest = decode_challenge_digest(challenge)?;
        let alias = generate_key_alias();

        if let Err(err) = self.prefs.set_string(WALLET_KEY_ALIAS_PREF, &alias) {
            warn!(%err, "failed to persist key alias");
            return None;
        }
        let spec = KeySpec::for_wallet_instance(digest.to_vec());
        if let Err(err) = self.secure_area.create_key(&alias, &spec) {
            warn!(alias, %err, "hardware key creation failed");
            return None;
        }
        let signature = match self.secure_area.sign(&alias, &digest) {
            Ok(signature) => signature,
            Err(err) => {
                warn!(alias, %err, "signing the challenge digest failed");
                return None;
            }
        };
        let info = match self.secure_area.key_info(&alias) {
            Ok(info) => info,
            Err(err) => {
                warn!(alias, %err, "reading key attestation info failed");
                return None;
            }
        };
        let Some(key_attestation) = encode_attestation(&signature, &info.certificate_chain)
        else {
            warn!(alias, "attestation envelope encoding failed");
            return None;
        };

        Some(AttestationFields {
            challenge: challenge.to_owned(),
            key_attestation,
            hardware_key_tag: public_key_tag(&info.public_key),
        })
    }

    /// Returns whether a live, non-invalidated hardware key exists for the
    /// stored alias. Any failure, store or hardware, maps to `false`.
    #[must_use]
    pub fn check_instance(&self) -> bool {
        let alias = match self.prefs.get_string(WALLET_KEY_ALIAS_PREF, "") {
            Ok(alias) if !alias.is_empty() => alias,
            Ok(_) => return false,
            Err(err) => {
                debug!(%err, "could not read stored key alias");
                return false;
            }
        };
        match self.secure_area.key_info(&alias) {
            Ok(_) => true,
            Err(err) => {
                debug!(alias, %err, "hardware key check failed");
                false
            }
        }
    }

    /// Deletes the hardware key for the stored alias and clears the alias.
    ///
    /// Idempotent: an absent or already-invalidated key is not an error;
    /// every failure is logged and swallowed.
    pub fn delete_key(&self) {
        match self.prefs.get_string(WALLET_KEY_ALIAS_PREF, "") {
            Ok(alias) if !alias.is_empty() => {
                match self.secure_area.delete_key(&alias) {
                    Ok(()) => debug!(alias, "hardware key deleted"),
                    Err(err) => debug!(alias, %err, "hardware key already absent"),
                }
            }
            Ok(_) => {}
            Err(err) => debug!(%err, "could not read stored key alias"),
        }
        if let Err(err) = self.prefs.clear(WALLET_KEY_ALIAS_PREF) {
            warn!(%err, "failed to clear stored key alias");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secure_area::SoftwareSecureArea;
    use idwallet_store::MemoryStore;

    const CHALLENGE: &str = "dGVzdC1ub25jZQ";

    fn controller() -> (Arc<SoftwareSecureArea>, Arc<MemoryStore>, SecureAreaController) {
        let area = Arc::new(SoftwareSecureArea::new());
        let prefs = Arc::new(MemoryStore::new());
        let controller = SecureAreaController::new(
            Arc::clone(&area) as Arc<dyn SecureArea>,
            Arc::clone(&prefs) as Arc<dyn PreferencesStore>,
        );
        (area, prefs, controller)
    }

    #[test]
    fn test_attestation_is_all_or_nothing() {
        let (_, _, controller) = controller();
        let fields = controller
            .generate_key_with_attestation(CHALLENGE)
            .expect("attestation");
        assert!(!fields.key_attestation.is_empty());
        assert!(!fields.hardware_key_tag.is_empty());
        // The challenge must round-trip byte-for-byte.
        assert_eq!(fields.challenge, CHALLENGE);
    }

    #[test]
    fn test_malformed_challenge_returns_none_and_creates_nothing() {
        let (area, prefs, controller) = controller();
        assert!(controller.generate_key_with_attestation("%%%not-base64%%%").is_none());
        assert_eq!(area.key_count(), 0);
        assert!(!prefs.contains(WALLET_KEY_ALIAS_PREF).unwrap());
    }

    #[test]
    fn test_stored_alias_points_at_created_key() {
        let (area, prefs, controller) = controller();
        controller.generate_key_with_attestation(CHALLENGE).unwrap();
        let alias = prefs.get_string(WALLET_KEY_ALIAS_PREF, "").unwrap();
        assert!(!alias.is_empty());
        assert!(area.key_info(&alias).is_ok());
    }

    #[test]
    fn test_check_instance_reflects_key_state() {
        let (area, prefs, controller) = controller();
        assert!(!controller.check_instance());

        controller.generate_key_with_attestation(CHALLENGE).unwrap();
        assert!(controller.check_instance());

        let alias = prefs.get_string(WALLET_KEY_ALIAS_PREF, "").unwrap();
        area.invalidate_key(&alias);
        assert!(!controller.check_instance());
    }

    #[test]
    fn test_delete_key_is_idempotent() {
        let (area, prefs, controller) = controller();
        controller.generate_key_with_attestation(CHALLENGE).unwrap();

        controller.delete_key();
        assert_eq!(area.key_count(), 0);
        assert!(!prefs.contains(WALLET_KEY_ALIAS_PREF).unwrap());
        assert!(!controller.check_instance());

        // Second deletion, and deletion with no key at all, are no-ops.
        controller.delete_key();
        assert!(!controller.check_instance());
    }

    #[test]
    fn test_new_attestation_replaces_stored_alias() {
        let (_, prefs, controller) = controller();
        controller.generate_key_with_attestation(CHALLENGE).unwrap();
        let first = prefs.get_string(WALLET_KEY_ALIAS_PREF, "").unwrap();
        controller.generate_key_with_attestation(CHALLENGE).unwrap();
        let second = prefs.get_string(WALLET_KEY_ALIAS_PREF, "").unwrap();
        assert_ne!(first, second);
        assert!(controller.check_instance());
    }
}
