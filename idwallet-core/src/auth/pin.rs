//! PIN storage and verification.

use std::sync::Arc;

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use idwallet_store::PreferencesStore;
use rand::rngs::OsRng;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::auth::{LockoutCounters, LockoutPolicy, LockoutState};
use crate::error::WalletError;

const PIN_HASH_PREF: &str = "wallet_pin_hash";
const PIN_ATTEMPTS_PREF: &str = "wallet_pin_failed_attempts";
const PIN_DEADLINE_PREF: &str = "wallet_pin_lockout_deadline";
const PIN_SECOND_PHASE_PREF: &str = "wallet_pin_lockout_second_phase";

/// Outcome of a PIN verification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinCheck {
    /// The PIN matched; counters were reset.
    Valid,
    /// The PIN did not match; the returned state reflects the recorded
    /// failure.
    Invalid {
        /// Gate state after this failure.
        state: LockoutState,
    },
    /// A lockout is active; the attempt was rejected without comparing the
    /// PIN.
    LockedOut {
        /// When the lockout expires, epoch milliseconds.
        until_millis: i64,
    },
}

/// Persists the PIN as an argon2id hash and enforces the lockout policy on
/// verification. The stored value is a PHC string (salt included); the PIN
/// itself is never written anywhere.
pub struct PinController {
    prefs: Arc<dyn PreferencesStore>,
    policy: LockoutPolicy,
}

impl PinController {
    /// Creates a controller with the given policy.
    pub fn new(prefs: Arc<dyn PreferencesStore>, policy: LockoutPolicy) -> Self {
        Self { prefs, policy }
    }

    /// Hashes and stores `pin`, resetting attempt counters.
    ///
    /// # Errors
    ///
    /// Returns an error if hashing or persistence fails.
    pub fn set_pin(&self, pin: &SecretString) -> Result<(), WalletError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(pin.expose_secret().as_bytes(), &salt)
            .map_err(|err| WalletError::Generic {
                error: format!("PIN hashing failed: {err}"),
            })?
            .to_string();
        self.prefs.set_string(PIN_HASH_PREF, &hash)?;
        self.store_counters(&LockoutCounters::default())?;
        Ok(())
    }

    /// Whether a PIN has been enrolled.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn has_pin(&self) -> Result<bool, WalletError> {
        Ok(self.prefs.contains(PIN_HASH_PREF)?)
    }

    /// Verifies `pin` at `now_millis`, enforcing the lockout policy.
    ///
    /// During an active lockout the attempt is rejected regardless of
    /// whether the PIN is correct.
    ///
    /// # Errors
    ///
    /// Returns an error if no PIN is enrolled or the store fails; a
    /// mismatching PIN is an [`Ok`] outcome, not an error.
    pub fn verify_pin(&self, pin: &SecretString, now_millis: i64) -> Result<PinCheck, WalletError> {
        let mut counters = self.load_counters()?;
        match counters.state(&self.policy, now_millis) {
            LockoutState::FirstLockout { until_millis }
            | LockoutState::SecondLockout { until_millis } => {
                debug!(until_millis, "PIN attempt rejected during lockout");
                return Ok(PinCheck::LockedOut { until_millis });
            }
            LockoutState::Normal => {}
        }

        let stored = self.prefs.get_string(PIN_HASH_PREF, "")?;
        if stored.is_empty() {
            return Err(WalletError::SecurityViolation {
                reason: "no PIN enrolled".to_owned(),
            });
        }
        let parsed = PasswordHash::new(&stored).map_err(|err| WalletError::Generic {
            error: format!("stored PIN hash is malformed: {err}"),
        })?;

        if Argon2::default()
            .verify_password(pin.expose_secret().as_bytes(), &parsed)
            .is_ok()
        {
            counters.record_success();
            self.store_counters(&counters)?;
            Ok(PinCheck::Valid)
        } else {
            let state = counters.record_failure(&self.policy, now_millis);
            self.store_counters(&counters)?;
            Ok(PinCheck::Invalid { state })
        }
    }

    /// Current gate state without recording an attempt.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn lockout_state(&self, now_millis: i64) -> Result<LockoutState, WalletError> {
        Ok(self.load_counters()?.state(&self.policy, now_millis))
    }

    fn load_counters(&self) -> Result<LockoutCounters, WalletError> {
        Ok(LockoutCounters {
            failed_attempts: self.prefs.get_int(PIN_ATTEMPTS_PREF, 0)?,
            deadline_millis: self.prefs.get_long(PIN_DEADLINE_PREF, 0)?,
            second_phase: self.prefs.get_bool(PIN_SECOND_PHASE_PREF, false)?,
        })
    }

    fn store_counters(&self, counters: &LockoutCounters) -> Result<(), WalletError> {
        self.prefs.set_int(PIN_ATTEMPTS_PREF, counters.failed_attempts)?;
        self.prefs.set_long(PIN_DEADLINE_PREF, counters.deadline_millis)?;
        self.prefs
            .set_bool(PIN_SECOND_PHASE_PREF, counters.second_phase)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use idwallet_store::MemoryStore;
    use std::time::Duration;

    fn controller() -> PinController {
        let policy = LockoutPolicy {
            max_attempts: 3,
            first_lockout: Duration::from_millis(1_000),
            second_lockout: Duration::from_millis(10_000),
        };
        PinController::new(Arc::new(MemoryStore::new()), policy)
    }

    fn pin(value: &str) -> SecretString {
        SecretString::from(value.to_owned())
    }

    #[test]
    fn test_set_and_verify() {
        let controller = controller();
        controller.set_pin(&pin("1234")).unwrap();
        assert!(controller.has_pin().unwrap());
        assert_eq!(controller.verify_pin(&pin("1234"), 0).unwrap(), PinCheck::Valid);
        assert!(matches!(
            controller.verify_pin(&pin("9999"), 0).unwrap(),
            PinCheck::Invalid { .. }
        ));
    }

    #[test]
    fn test_verify_without_enrollment_fails() {
        let controller = controller();
        assert!(matches!(
            controller.verify_pin(&pin("1234"), 0),
            Err(WalletError::SecurityViolation { .. })
        ));
    }

    #[test]
    fn test_lockout_rejects_correct_pin() {
        let controller = controller();
        controller.set_pin(&pin("1234")).unwrap();

        for _ in 0..3 {
            controller.verify_pin(&pin("0000"), 0).unwrap();
        }
        // Locked: even the right PIN is rejected before the deadline.
        assert_eq!(
            controller.verify_pin(&pin("1234"), 500).unwrap(),
            PinCheck::LockedOut { until_millis: 1_000 }
        );
    }

    #[test]
    fn test_success_after_lockout_expiry_resets_counters() {
        let controller = controller();
        controller.set_pin(&pin("1234")).unwrap();

        for _ in 0..3 {
            controller.verify_pin(&pin("0000"), 0).unwrap();
        }
        assert_eq!(
            controller.verify_pin(&pin("1234"), 2_000).unwrap(),
            PinCheck::Valid
        );
        assert_eq!(controller.lockout_state(2_000).unwrap(), LockoutState::Normal);
        // Counters are back to zero: three fresh failures are needed again.
        assert!(matches!(
            controller.verify_pin(&pin("0000"), 2_000).unwrap(),
            PinCheck::Invalid {
                state: LockoutState::Normal
            }
        ));
    }

    #[test]
    fn test_failure_after_lockout_escalates_to_second_phase() {
        let controller = controller();
        controller.set_pin(&pin("1234")).unwrap();

        for _ in 0..3 {
            controller.verify_pin(&pin("0000"), 0).unwrap();
        }
        match controller.verify_pin(&pin("0000"), 2_000).unwrap() {
            PinCheck::Invalid {
                state: LockoutState::SecondLockout { until_millis },
            } => assert_eq!(until_millis, 12_000),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_stored_value_is_not_the_pin() {
        let prefs = Arc::new(MemoryStore::new());
        let controller =
            PinController::new(Arc::clone(&prefs) as Arc<dyn PreferencesStore>, LockoutPolicy::default());
        controller.set_pin(&pin("1234")).unwrap();
        let stored = prefs.get_string(PIN_HASH_PREF, "").unwrap();
        assert!(stored.starts_with("$argon2id$"));
        assert!(!stored.contains("1234"));
    }

    #[test]
    fn test_reenrollment_clears_lockout() {
        let controller = controller();
        controller.set_pin(&pin("1234")).unwrap();
        for _ in 0..3 {
            controller.verify_pin(&pin("0000"), 0).unwrap();
        }
        controller.set_pin(&pin("5678")).unwrap();
        assert_eq!(controller.verify_pin(&pin("5678"), 0).unwrap(), PinCheck::Valid);
    }
}
