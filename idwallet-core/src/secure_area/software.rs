//! Software fallback secure area.
//!
//! Used on targets without a hardware secure element and throughout the test
//! suite. Keys live in process memory only; the "attestation chain" is a
//! single element carrying the SEC1 public key, a stand-in for the X.509
//! chain a hardware keystore would return. The envelope encoder treats the
//! chain as opaque DER blobs either way.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use p256::ecdsa::signature::Signer as _;
use p256::ecdsa::{Signature, SigningKey};
use rand::rngs::OsRng;
use tracing::debug;

use super::{EcPublicKey, KeyInfo, KeySpec, SecureArea, SecureAreaError};

struct SoftwareKey {
    signing_key: SigningKey,
    attestation_challenge: Vec<u8>,
    invalidated: bool,
}

/// In-memory [`SecureArea`] implementation.
#[derive(Default)]
pub struct SoftwareSecureArea {
    keys: Mutex<HashMap<String, SoftwareKey>>,
}

impl SoftwareSecureArea {
    /// Creates an empty secure area.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the key under `alias` as invalidated, as a platform keystore
    /// does after biometric re-enrollment. Subsequent use fails with
    /// [`SecureAreaError::KeyInvalidated`].
    pub fn invalidate_key(&self, alias: &str) {
        if let Some(key) = self.lock().get_mut(alias) {
            key.invalidated = true;
        }
    }

    /// Returns the number of live keys. Test observability.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, SoftwareKey>> {
        self.keys.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn public_key_of(signing_key: &SigningKey) -> Result<EcPublicKey, SecureAreaError> {
        let point = signing_key.verifying_key().to_encoded_point(false);
        let bytes = point.as_bytes();
        if bytes.len() != 65 || bytes[0] != 0x04 {
            return Err(SecureAreaError::Keystore {
                error: "public key is not an uncompressed SEC1 point".to_owned(),
            });
        }
        let mut x = [0u8; 32];
        let mut y = [0u8; 32];
        x.copy_from_slice(&bytes[1..33]);
        y.copy_from_slice(&bytes[33..65]);
        Ok(EcPublicKey { x, y })
    }
}

impl SecureArea for SoftwareSecureArea {
    fn create_key(&self, alias: &str, spec: &KeySpec) -> Result<(), SecureAreaError> {
        let mut keys = self.lock();
        if keys.contains_key(alias) {
            return Err(SecureAreaError::Keystore {
                error: format!("alias already in use: {alias}"),
            });
        }
        keys.insert(
            alias.to_owned(),
            SoftwareKey {
                signing_key: SigningKey::random(&mut OsRng),
                attestation_challenge: spec.attestation_challenge.clone(),
                invalidated: false,
            },
        );
        debug!(alias, strongbox = spec.strongbox_preferred, "software key created");
        Ok(())
    }

    fn sign(&self, alias: &str, data: &[u8]) -> Result<Vec<u8>, SecureAreaError> {
        let keys = self.lock();
        let key = keys.get(alias).ok_or_else(|| SecureAreaError::KeyNotFound {
            alias: alias.to_owned(),
        })?;
        if key.invalidated {
            return Err(SecureAreaError::KeyInvalidated {
                alias: alias.to_owned(),
            });
        }
        let signature: Signature = key.signing_key.sign(data);
        Ok(signature.to_der().as_bytes().to_vec())
    }

    fn key_info(&self, alias: &str) -> Result<KeyInfo, SecureAreaError> {
        let keys = self.lock();
        let key = keys.get(alias).ok_or_else(|| SecureAreaError::KeyNotFound {
            alias: alias.to_owned(),
        })?;
        if key.invalidated {
            return Err(SecureAreaError::KeyInvalidated {
                alias: alias.to_owned(),
            });
        }
        let public_key = Self::public_key_of(&key.signing_key)?;
        // Stand-in chain: SEC1 point plus the challenge is enough for the
        // envelope encoder and for round-trip tests.
        let mut leaf = key
            .signing_key
            .verifying_key()
            .to_encoded_point(false)
            .as_bytes()
            .to_vec();
        leaf.extend_from_slice(&key.attestation_challenge);
        Ok(KeyInfo {
            public_key,
            certificate_chain: vec![leaf],
        })
    }

    fn delete_key(&self, alias: &str) -> Result<(), SecureAreaError> {
        if self.lock().remove(alias).is_none() {
            return Err(SecureAreaError::KeyNotFound {
                alias: alias.to_owned(),
            });
        }
        debug!(alias, "software key deleted");
        Ok(())
    }
}
