//! Secure credential-lifecycle and key-attestation core for an EUDI-style
//! identity wallet.
//!
//! This crate owns the chain that binds one device installation to the
//! wallet backend: hardware-backed key generation, attestation encoding,
//! server registration with compensating rollback, biometric/PIN-gated local
//! state, and atomic wallet teardown. The UI layer, the JS bridge, and the
//! OpenID4VCI/OpenID4VP protocol engine live elsewhere and talk to this
//! crate through the seams in [`secure_area`], [`auth`], and
//! [`DocumentController`].
#![deny(clippy::all, clippy::pedantic, clippy::nursery)]

use strum::EnumString;

use crate::auth::LockoutPolicy;

/// Deployment environment the wallet talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Environment {
    /// Pre-production backend.
    Staging,
    /// Production backend.
    Production,
}

/// Caller-owned wiring for wallet components.
///
/// Everything configurable is passed explicitly through construction;
/// nothing in this crate reads process-global state.
#[derive(Debug, Clone)]
pub struct WalletConfig {
    /// Backend environment.
    pub environment: Environment,
    /// PIN lockout thresholds and durations.
    pub lockout_policy: LockoutPolicy,
}

impl WalletConfig {
    /// Creates a config for `environment` with the default lockout policy.
    #[must_use]
    pub fn new(environment: Environment) -> Self {
        Self {
            environment,
            lockout_policy: LockoutPolicy::default(),
        }
    }
}

mod error;
pub use error::*;

mod challenge;
pub use challenge::*;

mod key_alias;
pub use key_alias::*;

pub mod attestation;
pub mod auth;
pub mod instance;
pub mod secure_area;

mod documents;
pub use documents::*;

mod deletion;
pub use deletion::*;

mod onboarding;
pub use onboarding::*;

mod session;
pub use session::*;

// private modules
mod http_request;
