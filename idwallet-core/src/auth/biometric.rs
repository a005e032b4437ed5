//! Biometric-gated credential storage.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use idwallet_store::PreferencesStore;
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::debug;

use crate::error::WalletError;

const BIOMETRIC_RANDOM_PREF: &str = "wallet_biometric_random";
const BIOMETRIC_CIPHERTEXT_PREF: &str = "wallet_biometric_ciphertext";
const BIOMETRIC_IV_PREF: &str = "wallet_biometric_iv";
const USE_BIOMETRICS_PREF: &str = "wallet_use_biometrics";

/// Ciphertext and IV produced by one biometric-gated encryption.
#[derive(Debug, Clone)]
pub struct CipherOutput {
    /// Encrypted bytes.
    pub ciphertext: Vec<u8>,
    /// Initialization vector used.
    pub iv: Vec<u8>,
}

/// Seam to the platform's biometric-gated cipher.
///
/// Unlocking the cipher requires a successful platform biometric prompt;
/// the key behind it is invalidated when biometric enrollment changes. The
/// prompt UI itself is presented by the platform layer, not by this crate.
pub trait BiometricCipher: Send + Sync {
    /// Encrypts `plaintext` under the biometric-gated key.
    ///
    /// # Errors
    ///
    /// Returns an error if the user cancels the prompt or the key is
    /// unavailable.
    fn encrypt(&self, plaintext: &[u8]) -> Result<CipherOutput, WalletError>;

    /// Decrypts `ciphertext` under the biometric-gated key.
    ///
    /// # Errors
    ///
    /// Returns an error if the user cancels the prompt, the key was
    /// invalidated, or the data does not authenticate.
    fn decrypt(&self, ciphertext: &[u8], iv: &[u8]) -> Result<Vec<u8>, WalletError>;
}

/// The persisted biometric unlock material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BiometricCredential {
    /// The plaintext probe value.
    pub random: String,
    /// The probe encrypted under the biometric-gated cipher, base64.
    pub ciphertext: String,
    /// The cipher IV, base64.
    pub iv: String,
}

/// Manages the biometric unlock credential and toggle.
pub struct BiometricController {
    prefs: Arc<dyn PreferencesStore>,
    cipher: Arc<dyn BiometricCipher>,
}

impl BiometricController {
    /// Creates a controller over the platform cipher and preferences.
    pub fn new(prefs: Arc<dyn PreferencesStore>, cipher: Arc<dyn BiometricCipher>) -> Self {
        Self { prefs, cipher }
    }

    /// Creates and persists a fresh biometric credential: a random probe
    /// value stored alongside its encryption under the biometric-gated
    /// cipher.
    ///
    /// # Errors
    ///
    /// Returns an error if encryption (user cancel, key unavailable) or
    /// persistence fails.
    pub fn enroll(&self) -> Result<(), WalletError> {
        let mut probe = [0u8; 32];
        OsRng.fill_bytes(&mut probe);
        let random = hex::encode(probe);

        let output = self.cipher.encrypt(random.as_bytes())?;
        self.prefs.set_string(BIOMETRIC_RANDOM_PREF, &random)?;
        self.prefs
            .set_string(BIOMETRIC_CIPHERTEXT_PREF, &STANDARD.encode(&output.ciphertext))?;
        self.prefs
            .set_string(BIOMETRIC_IV_PREF, &STANDARD.encode(&output.iv))?;
        debug!("biometric credential enrolled");
        Ok(())
    }

    /// Returns the persisted credential, if one exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn credential(&self) -> Result<Option<BiometricCredential>, WalletError> {
        if !self.prefs.contains(BIOMETRIC_RANDOM_PREF)? {
            return Ok(None);
        }
        Ok(Some(BiometricCredential {
            random: self.prefs.get_string(BIOMETRIC_RANDOM_PREF, "")?,
            ciphertext: self.prefs.get_string(BIOMETRIC_CIPHERTEXT_PREF, "")?,
            iv: self.prefs.get_string(BIOMETRIC_IV_PREF, "")?,
        }))
    }

    /// Validates a biometric unlock by decrypting the stored probe and
    /// comparing it to the plaintext copy. `false` when no credential is
    /// enrolled or the decrypted value does not match.
    ///
    /// # Errors
    ///
    /// Returns an error if the cipher fails (cancel, invalidation) or the
    /// stored material is unreadable.
    pub fn verify(&self) -> Result<bool, WalletError> {
        let Some(credential) = self.credential()? else {
            return Ok(false);
        };
        let ciphertext = STANDARD.decode(&credential.ciphertext).map_err(|err| {
            WalletError::SerializationError {
                error: format!("stored biometric ciphertext is malformed: {err}"),
            }
        })?;
        let iv = STANDARD
            .decode(&credential.iv)
            .map_err(|err| WalletError::SerializationError {
                error: format!("stored biometric IV is malformed: {err}"),
            })?;
        let plaintext = self.cipher.decrypt(&ciphertext, &iv)?;
        Ok(plaintext == credential.random.as_bytes())
    }

    /// Toggles biometric unlock. Disabling destroys the stored credential
    /// material; the toggle itself is independent of whether material
    /// exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub fn set_use_biometrics(&self, enabled: bool) -> Result<(), WalletError> {
        self.prefs.set_bool(USE_BIOMETRICS_PREF, enabled)?;
        if !enabled {
            self.clear_credential()?;
        }
        Ok(())
    }

    /// Whether biometric unlock is enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn use_biometrics(&self) -> Result<bool, WalletError> {
        Ok(self.prefs.get_bool(USE_BIOMETRICS_PREF, false)?)
    }

    /// Removes the stored credential material, leaving the toggle as-is.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub fn clear_credential(&self) -> Result<(), WalletError> {
        self.prefs.clear(BIOMETRIC_RANDOM_PREF)?;
        self.prefs.clear(BIOMETRIC_CIPHERTEXT_PREF)?;
        self.prefs.clear(BIOMETRIC_IV_PREF)?;
        Ok(())
    }
}
