//! Onboarding progress persistence.

use std::sync::Arc;

use idwallet_store::PreferencesStore;

use crate::error::WalletError;

const EMAIL_VERIFIED_PREF: &str = "onboarding_email_verified";
const PHONE_VERIFIED_PREF: &str = "onboarding_phone_verified";
const EMAIL_PREF: &str = "onboarding_email";
const PHONE_PREF: &str = "onboarding_phone";
const REGISTRATION_ID_PREF: &str = "onboarding_registration_id";

/// Progress of the user-onboarding flow. Cleared when the wallet is deleted
/// or onboarding restarts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OnboardingState {
    /// Whether the email address was confirmed.
    pub is_email_verified: bool,
    /// Whether the phone number was confirmed.
    pub is_phone_verified: bool,
    /// Email address entered during onboarding.
    pub email: String,
    /// Phone number entered during onboarding.
    pub phone: String,
    /// Server-assigned registration identifier.
    pub registration_id: String,
}

/// Persists [`OnboardingState`] through the preferences store.
pub struct OnboardingController {
    prefs: Arc<dyn PreferencesStore>,
}

impl OnboardingController {
    /// Creates a controller over the given preferences.
    pub fn new(prefs: Arc<dyn PreferencesStore>) -> Self {
        Self { prefs }
    }

    /// Loads the persisted state; absent fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn load(&self) -> Result<OnboardingState, WalletError> {
        Ok(OnboardingState {
            is_email_verified: self.prefs.get_bool(EMAIL_VERIFIED_PREF, false)?,
            is_phone_verified: self.prefs.get_bool(PHONE_VERIFIED_PREF, false)?,
            email: self.prefs.get_string(EMAIL_PREF, "")?,
            phone: self.prefs.get_string(PHONE_PREF, "")?,
            registration_id: self.prefs.get_string(REGISTRATION_ID_PREF, "")?,
        })
    }

    /// Persists the whole state.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub fn save(&self, state: &OnboardingState) -> Result<(), WalletError> {
        self.prefs.set_bool(EMAIL_VERIFIED_PREF, state.is_email_verified)?;
        self.prefs.set_bool(PHONE_VERIFIED_PREF, state.is_phone_verified)?;
        self.prefs.set_string(EMAIL_PREF, &state.email)?;
        self.prefs.set_string(PHONE_PREF, &state.phone)?;
        self.prefs
            .set_string(REGISTRATION_ID_PREF, &state.registration_id)?;
        Ok(())
    }

    /// Clears all onboarding state, restarting the flow.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub fn clear(&self) -> Result<(), WalletError> {
        for key in [
            EMAIL_VERIFIED_PREF,
            PHONE_VERIFIED_PREF,
            EMAIL_PREF,
            PHONE_PREF,
            REGISTRATION_ID_PREF,
        ] {
            self.prefs.clear(key)?;
        }
        Ok(())
    }
}
