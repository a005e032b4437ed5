//! Hardware-backed key management.
//!
//! The [`SecureArea`] trait is the seam to the platform secure element:
//! - Android: Android Keystore (StrongBox where present), keys created with
//!   `PURPOSE_SIGN` and an attestation challenge
//! - iOS: Secure Enclave via `SecKeyCreateRandomKey` + DeviceCheck/App Attest
//!
//! # Security requirements
//!
//! - Private key material MUST never leave the secure element.
//! - Keys MUST be created with signing purpose only and P-256.
//! - The wallet-instance key MUST NOT require interactive user
//!   authentication (it is distinct from the biometric-gated key used for
//!   PIN/biometric material).
//! - Implementations MUST report key invalidation (biometric re-enrollment,
//!   hardware invalidation) distinctly from key absence.

use thiserror::Error;

mod controller;
mod software;

pub use controller::{AttestationFields, SecureAreaController, WALLET_KEY_ALIAS_PREF};
pub use software::SoftwareSecureArea;

/// Errors raised by the platform secure element.
#[derive(Debug, Error)]
pub enum SecureAreaError {
    /// No key exists under the alias.
    #[error("key not found: {alias}")]
    KeyNotFound {
        /// The alias that was looked up.
        alias: String,
    },
    /// The key exists but was invalidated (e.g. biometric enrollment
    /// changed, hardware policy violation) and can no longer be used.
    #[error("key invalidated: {alias}")]
    KeyInvalidated {
        /// The alias of the invalidated key.
        alias: String,
    },
    /// Any other keystore failure.
    #[error("keystore error: {error}")]
    Keystore {
        /// Platform-level detail.
        error: String,
    },
}

/// EC P-256 public key as affine coordinates (32 bytes each).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EcPublicKey {
    /// X coordinate, big-endian.
    pub x: [u8; 32],
    /// Y coordinate, big-endian.
    pub y: [u8; 32],
}

/// Metadata for one hardware key.
#[derive(Debug, Clone)]
pub struct KeyInfo {
    /// The key's public half.
    pub public_key: EcPublicKey,
    /// Attestation certificate chain, DER-encoded, leaf first.
    pub certificate_chain: Vec<Vec<u8>>,
}

/// Parameters for hardware key creation.
#[derive(Debug, Clone)]
pub struct KeySpec {
    /// Nonce embedded into the key's attestation record.
    pub attestation_challenge: Vec<u8>,
    /// Prefer a dedicated secure element (StrongBox) when available.
    pub strongbox_preferred: bool,
    /// Whether key use requires interactive user authentication.
    pub user_auth_required: bool,
}

impl KeySpec {
    /// Spec for the wallet-instance signing key: strongbox-preferred,
    /// usable without an interactive auth prompt.
    #[must_use]
    pub const fn for_wallet_instance(attestation_challenge: Vec<u8>) -> Self {
        Self {
            attestation_challenge,
            strongbox_preferred: true,
            user_auth_required: false,
        }
    }
}

/// Platform secure element operations.
///
/// Every method is a blocking call into platform APIs and must be issued off
/// the UI thread; callers in async contexts dispatch through
/// `spawn_blocking`.
pub trait SecureArea: Send + Sync {
    /// Creates a new EC P-256 signing key under `alias`.
    ///
    /// # Errors
    ///
    /// Returns an error if a key already exists under `alias` or the
    /// platform keystore rejects the spec.
    fn create_key(&self, alias: &str, spec: &KeySpec) -> Result<(), SecureAreaError>;

    /// Signs `data` with the key under `alias` (ECDSA P-256 / SHA-256),
    /// returning a DER-encoded signature.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is absent, invalidated, or signing fails.
    fn sign(&self, alias: &str, data: &[u8]) -> Result<Vec<u8>, SecureAreaError>;

    /// Returns public key and attestation chain for the key under `alias`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is absent or invalidated.
    fn key_info(&self, alias: &str) -> Result<KeyInfo, SecureAreaError>;

    /// Deletes the key under `alias`.
    ///
    /// # Errors
    ///
    /// Returns [`SecureAreaError::KeyNotFound`] if no key exists; callers
    /// that need idempotent deletion absorb that case.
    fn delete_key(&self, alias: &str) -> Result<(), SecureAreaError>;
}
