//! Sealing primitives for the store file.
//!
//! The whole record map is encrypted as one XChaCha20-Poly1305 message under
//! a key derived from a device-held master secret. The AEAD associated data
//! pins the record to this store's domain label so a sealed blob cannot be
//! replayed into a different consumer.

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    XChaCha20Poly1305, XNonce,
};
use hkdf::Hkdf;
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::StoreError;

/// XChaCha20-Poly1305 nonce size in bytes.
pub(crate) const NONCE_SIZE: usize = 24;

/// Domain separation label mixed into key derivation and AEAD authentication.
const LABEL_PREFS: &[u8] = b"idwallet:prefs:v1";

/// Store encryption key (256-bit).
///
/// Derived from a device-held master secret (platform keystore material on
/// device, random bytes in tests) and never persisted alongside the file.
///
/// # Security
///
/// - The key is zeroized on drop.
/// - The key is never logged or serialized; `Debug` redacts it.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct StoreKey([u8; 32]);

impl StoreKey {
    /// Creates a store key from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Generates a random store key.
    ///
    /// # Panics
    ///
    /// Panics if the system's random number generator fails.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Derives a store key from a master secret and a per-store salt.
    ///
    /// HKDF-SHA256 with the store domain label as info, so keys for
    /// different consumers of the same master secret never collide.
    #[must_use]
    pub fn derive(master: &[u8], salt: &[u8]) -> Self {
        let hk = Hkdf::<Sha256>::new(Some(salt), master);
        let mut okm = [0u8; 32];
        hk.expand(LABEL_PREFS, &mut okm)
            .expect("okm length is always a valid HKDF output length");
        Self(okm)
    }

    pub(crate) const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Debug for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

fn generate_nonce() -> [u8; NONCE_SIZE] {
    let mut nonce = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);
    nonce
}

/// Seals a serialized record map.
///
/// Returns the ciphertext (with auth tag) and the nonce used.
pub(crate) fn seal(
    key: &StoreKey,
    plaintext: &[u8],
) -> Result<(Vec<u8>, [u8; NONCE_SIZE]), StoreError> {
    let cipher = XChaCha20Poly1305::new_from_slice(key.as_bytes())
        .expect("key length is always 32");
    let nonce_bytes = generate_nonce();
    let nonce = XNonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(
            nonce,
            Payload {
                msg: plaintext,
                aad: LABEL_PREFS,
            },
        )
        .map_err(|_| {
            StoreError::EncryptionFailed("XChaCha20-Poly1305 encryption failed".into())
        })?;
    Ok((ciphertext, nonce_bytes))
}

/// Opens a sealed record map.
pub(crate) fn open(
    key: &StoreKey,
    nonce: &[u8; NONCE_SIZE],
    ciphertext: &[u8],
) -> Result<Vec<u8>, StoreError> {
    let cipher = XChaCha20Poly1305::new_from_slice(key.as_bytes())
        .expect("key length is always 32");
    let nonce = XNonce::from_slice(nonce);

    cipher
        .decrypt(
            nonce,
            Payload {
                msg: ciphertext,
                aad: LABEL_PREFS,
            },
        )
        .map_err(|_| {
            StoreError::DecryptionFailed("XChaCha20-Poly1305 decryption failed".into())
        })
}
