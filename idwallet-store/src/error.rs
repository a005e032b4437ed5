//! Error types for the encrypted store.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by the encrypted key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem failure while reading or writing the backing file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization failure of the record map.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// AEAD sealing failed.
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    /// AEAD opening failed: wrong key, tampered file, or truncation.
    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    /// The on-disk record carries a version this build does not understand.
    #[error("unsupported record version: {0}")]
    UnsupportedVersion(u32),

    /// A value exists under the key but with a different type.
    #[error("type mismatch for key `{key}`: expected {expected}")]
    TypeMismatch {
        /// The requested key.
        key: String,
        /// The type the caller asked for.
        expected: &'static str,
    },

    /// The handle was closed and has not been reset.
    #[error("store is closed")]
    Closed,
}
