//! Wallet-instance management.
//!
//! A wallet instance is the logical pairing of a hardware key and its
//! server-side registration. [`SecureAreaRepository`] hides the hardware
//! layering from upper code; [`AttestationApiClient`] drives the
//! nonce → attest → register round trip and owns the compensating rollback
//! that keeps the two sides consistent.

mod client;
mod repository;

pub use client::{AttestationApiClient, REGISTRATION_CONFIRMED_PREF};
pub use repository::SecureAreaRepository;
