//! Encrypted on-device key-value storage for idwallet.
//!
//! The wallet core persists small pieces of durable state (the hardware key
//! alias, PIN/lockout material, onboarding progress) through the
//! [`PreferencesStore`] trait. The [`FileStore`] implementation seals the
//! whole record map with XChaCha20-Poly1305 under a device-derived key and
//! writes it atomically; [`MemoryStore`] is a drop-in test double.
//!
//! The store lifecycle (`close` / `delete_backing_file` / `reset`) exists for
//! wallet teardown, where the orchestrator must be able to destroy the
//! backing file and leave the handle reusable afterwards. See
//! [`StorageHandle`].

mod crypto;
mod error;
mod file;
mod memory;
mod record;

pub use crypto::StoreKey;
pub use error::{StoreError, StoreResult};
pub use file::FileStore;
pub use memory::MemoryStore;

/// Durable, encrypted, synchronous key-value store.
///
/// All accessors take a default that is returned when the key is absent,
/// matching the preference-store shape the wallet layers were written
/// against. Implementations are internally synchronized; callers do not add
/// their own locking.
pub trait PreferencesStore: Send + Sync {
    /// Returns the string stored under `key`, or `default` if absent.
    fn get_string(&self, key: &str, default: &str) -> StoreResult<String>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set_string(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Returns the boolean stored under `key`, or `default` if absent.
    fn get_bool(&self, key: &str, default: bool) -> StoreResult<bool>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set_bool(&self, key: &str, value: bool) -> StoreResult<()>;

    /// Returns the 32-bit integer stored under `key`, or `default` if absent.
    fn get_int(&self, key: &str, default: i32) -> StoreResult<i32>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set_int(&self, key: &str, value: i32) -> StoreResult<()>;

    /// Returns the 64-bit integer stored under `key`, or `default` if absent.
    fn get_long(&self, key: &str, default: i64) -> StoreResult<i64>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set_long(&self, key: &str, value: i64) -> StoreResult<()>;

    /// Returns whether a value is stored under `key`.
    fn contains(&self, key: &str) -> StoreResult<bool>;

    /// Removes the value stored under `key`. Absent keys are not an error.
    fn clear(&self, key: &str) -> StoreResult<()>;

    /// Removes every stored value.
    fn clear_all(&self) -> StoreResult<()>;
}

/// Lifecycle control for a store backed by an on-disk file.
///
/// Wallet deletion tears stores down in a fixed order (close, delete file,
/// reset); each step must be callable regardless of whether earlier steps
/// succeeded.
pub trait StorageHandle: Send + Sync {
    /// Flushes pending state and closes the handle. Accessors fail with
    /// [`StoreError::Closed`] until [`reset`](Self::reset) is called.
    fn close(&self) -> StoreResult<()>;

    /// Deletes the backing file, if any. Deleting an absent file is not an
    /// error.
    fn delete_backing_file(&self) -> StoreResult<()>;

    /// Re-opens the handle for subsequent use, starting from whatever is on
    /// disk (an empty store if the file was deleted).
    fn reset(&self) -> StoreResult<()>;
}
