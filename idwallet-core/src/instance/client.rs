//! Wallet-instance registration client.

use std::sync::Arc;

use idwallet_store::PreferencesStore;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{classify_status, WalletError};
use crate::http_request::Request;
use crate::instance::SecureAreaRepository;
use crate::secure_area::AttestationFields;
use crate::Environment;

/// Preference key holding whether the server acknowledged this instance.
/// Set only after a 2xx registration response; cleared by rollback and
/// wallet deletion.
pub const REGISTRATION_CONFIRMED_PREF: &str = "wallet_instance_registration_confirmed";

#[derive(Debug, Deserialize)]
struct NonceResponse {
    nonce: String,
}

#[derive(Debug, Serialize)]
struct WalletInstanceRequest<'a> {
    challenge: &'a str,
    key_attestation: &'a str,
    hardware_key_tag: &'a str,
}

/// Orchestrates the nonce → attest → register protocol.
///
/// The critical property: the device is never left holding a hardware key
/// without a corresponding server registration. Every failure between key
/// creation and a 2xx registration response tears the key down again, and
/// the teardown runs from a drop guard so task cancellation cannot skip it.
pub struct AttestationApiClient {
    base_url: String,
    request: Request,
    repository: Arc<SecureAreaRepository>,
    prefs: Arc<dyn PreferencesStore>,
    // One in-flight attestation per device: a second concurrent attempt
    // would generate a second alias and orphan the first key.
    attestation_guard: tokio::sync::Mutex<()>,
}

impl AttestationApiClient {
    /// Creates a client for `environment`.
    #[must_use]
    pub fn new(
        environment: &Environment,
        repository: Arc<SecureAreaRepository>,
        prefs: Arc<dyn PreferencesStore>,
    ) -> Self {
        let base_url = match environment {
            Environment::Staging => "https://wallet.stage.idwallet.eu",
            Environment::Production => "https://wallet.idwallet.eu",
        }
        .to_owned();
        Self::with_base_url(&base_url, repository, prefs)
    }

    /// Creates a client against a custom service endpoint (dev and test
    /// builds).
    #[must_use]
    pub fn with_base_url(
        base_url: &str,
        repository: Arc<SecureAreaRepository>,
        prefs: Arc<dyn PreferencesStore>,
    ) -> Self {
        Self {
            base_url: base_url.to_owned(),
            request: Request::new(),
            repository,
            prefs,
            attestation_guard: tokio::sync::Mutex::new(()),
        }
    }

    /// Fetches a fresh attestation nonce from the server.
    ///
    /// # Errors
    ///
    /// Returns a classified error on any non-2xx response or transport
    /// failure. Transient failures are retried with backoff.
    pub async fn get_nonce(&self) -> Result<String, WalletError> {
        let url = format!("{}/wallet-instance/nonce", self.base_url);
        let response = self.request.handle(self.request.get(&url)).await?;
        if !response.status().is_success() {
            return Err(Self::classify(response).await);
        }
        let body: NonceResponse =
            response
                .json()
                .await
                .map_err(|err| WalletError::SerializationError {
                    error: format!("failed to parse nonce response: {err}"),
                })?;
        Ok(body.nonce)
    }

    /// Generates a hardware key attested against `nonce` and registers the
    /// wallet instance with the server.
    ///
    /// Attempts are serialized per client; a concurrent call waits for the
    /// in-flight one to finish.
    ///
    /// # Errors
    ///
    /// Returns a classified error if generation, validation, or
    /// registration fails. In every failure case the freshly created
    /// hardware key is deleted again before the error is returned.
    pub async fn register_instance(&self, nonce: &str) -> Result<(), WalletError> {
        let _flight = self.attestation_guard.lock().await;
        let rollback = RollbackGuard::new(Arc::clone(&self.repository), Arc::clone(&self.prefs));

        let repository = Arc::clone(&self.repository);
        let challenge = nonce.to_owned();
        let fields =
            tokio::task::spawn_blocking(move || repository.generate_key_with_attestation(&challenge))
                .await
                .map_err(|err| WalletError::Generic {
                    error: format!("key generation task failed: {err}"),
                })?;
        let Some(fields) = fields else {
            return Err(WalletError::InvalidAttestation {
                field: "key_attestation",
            });
        };
        Self::validate(&fields)?;

        let url = format!("{}/wallet-instance", self.base_url);
        let body = WalletInstanceRequest {
            challenge: &fields.challenge,
            key_attestation: &fields.key_attestation,
            hardware_key_tag: &fields.hardware_key_tag,
        };
        // Dispatched exactly once: a retried POST could land after the
        // rollback already destroyed the key it attests.
        let response = self
            .request
            .dispatch(self.request.post(&url).json(&body))
            .await?;
        if !response.status().is_success() {
            return Err(Self::classify(response).await);
        }

        rollback.disarm();
        if let Err(err) = self.prefs.set_bool(REGISTRATION_CONFIRMED_PREF, true) {
            warn!(%err, "failed to persist registration confirmation");
        }
        debug!("wallet instance registered");
        Ok(())
    }

    /// Whether this device holds a valid wallet instance: a live hardware
    /// key and a previously confirmed registration. Local-only; the server
    /// is not consulted.
    pub async fn check_instance(&self) -> bool {
        let confirmed = self
            .prefs
            .get_bool(REGISTRATION_CONFIRMED_PREF, false)
            .unwrap_or(false);
        if !confirmed {
            return false;
        }
        let repository = Arc::clone(&self.repository);
        tokio::task::spawn_blocking(move || repository.check_instance())
            .await
            .unwrap_or(false)
    }

    /// A populated envelope has all three fields non-empty; anything less
    /// is a hard failure and never reaches the server.
    fn validate(fields: &AttestationFields) -> Result<(), WalletError> {
        if fields.challenge.is_empty() {
            return Err(WalletError::InvalidAttestation { field: "challenge" });
        }
        if fields.key_attestation.is_empty() {
            return Err(WalletError::InvalidAttestation {
                field: "key_attestation",
            });
        }
        if fields.hardware_key_tag.is_empty() {
            return Err(WalletError::InvalidAttestation {
                field: "hardware_key_tag",
            });
        }
        Ok(())
    }

    async fn classify(response: reqwest::Response) -> WalletError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        classify_status(status, &body)
    }
}

/// Deletes the wallet-instance key unless disarmed by a successful
/// registration. Running from `Drop` keeps the rollback on every exit
/// path, including cancellation of the enclosing task.
struct RollbackGuard {
    repository: Arc<SecureAreaRepository>,
    prefs: Arc<dyn PreferencesStore>,
    armed: bool,
}

impl RollbackGuard {
    fn new(repository: Arc<SecureAreaRepository>, prefs: Arc<dyn PreferencesStore>) -> Self {
        Self {
            repository,
            prefs,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for RollbackGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        warn!("attestation did not complete; deleting wallet instance key");
        self.repository.delete_instance();
        if let Err(err) = self.prefs.set_bool(REGISTRATION_CONFIRMED_PREF, false) {
            debug!(%err, "failed to clear registration confirmation");
        }
    }
}
