//! Local authentication gates.
//!
//! PIN and biometric unlock both persist only what is needed to validate an
//! unlock attempt, never the secret itself in recoverable form: the PIN as
//! an argon2id hash, the biometric credential as a probe value encrypted
//! under a platform biometric-gated cipher.

mod biometric;
mod lockout;
mod pin;

pub use biometric::{BiometricCipher, BiometricController, BiometricCredential, CipherOutput};
pub use lockout::{LockoutCounters, LockoutPolicy, LockoutState};
pub use pin::{PinCheck, PinController};
