//! Shared error taxonomy.
//!
//! Hardware and decoding failures never reach this type: they are absorbed
//! at their origin layer and surface as sentinel values (`false`, `None`).
//! Only network/business failures propagate upward, classified here so the
//! UI layer can pick a user-facing message without inspecting raw responses.

use thiserror::Error;

/// Validation tags the server may return that are safe to surface to users.
/// Anything else collapses to the generic `validation_error` tag.
const KNOWN_VALIDATION_TAGS: &[&str] = &[
    "challenge",
    "key_attestation",
    "hardware_key_tag",
    "email",
    "phone",
    "registration_id",
];

/// Tag used when the server's validation detail is unrecognized.
const GENERIC_VALIDATION_TAG: &str = "validation_error";

/// Error outputs from the wallet core.
#[derive(Debug, Error)]
pub enum WalletError {
    /// The presented input is not valid for the requested operation.
    #[error("invalid_input: {attribute}: {reason}")]
    InvalidInput {
        /// The offending attribute.
        attribute: String,
        /// Why it was rejected.
        reason: String,
    },
    /// A generated attestation is missing a required field and was never
    /// submitted to the server.
    #[error("invalid_attestation: missing {field}")]
    InvalidAttestation {
        /// The absent attestation field.
        field: &'static str,
    },
    /// Unexpected error serializing or parsing information.
    #[error("serialization_error: {error}")]
    SerializationError {
        /// Underlying serializer detail.
        error: String,
    },
    /// The server rejected the request as malformed (HTTP 400).
    #[error("bad_request")]
    BadRequest,
    /// The caller is not authenticated for this operation (HTTP 401).
    #[error("unauthorized")]
    Unauthorized,
    /// The caller is authenticated but not allowed (HTTP 403).
    #[error("forbidden")]
    Forbidden,
    /// Field-level validation failure (HTTP 422) with an allow-listed tag.
    #[error("validation_error: {tag}")]
    Validation {
        /// Server-classified failing field, or `validation_error`.
        tag: String,
    },
    /// The server failed (HTTP 5xx).
    #[error("server_error: {status}")]
    Server {
        /// The status code returned.
        status: u16,
    },
    /// Transport-level failure: unknown host, timeout, connection reset.
    #[error("network_error: {url}: {error}")]
    Network {
        /// The request URL, when known.
        url: String,
        /// Transport detail.
        error: String,
    },
    /// Local encrypted store failure.
    #[error("store_error: {0}")]
    Store(#[from] idwallet_store::StoreError),
    /// Device security requirement not met; terminal, not retryable.
    #[error("security_violation: {reason}")]
    SecurityViolation {
        /// Which requirement was violated.
        reason: String,
    },
    /// Unclassified failure.
    #[error("{error}")]
    Generic {
        /// Free-form detail.
        error: String,
    },
}

impl From<reqwest::Error> for WalletError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            url: err
                .url()
                .map_or_else(|| "<unknown>".to_owned(), ToString::to_string),
            error: err.to_string(),
        }
    }
}

/// Classifies a non-success HTTP status into the shared taxonomy.
///
/// `body` is consulted only for 422 responses, where the server's error
/// payload may carry a failing-field tag.
#[must_use]
pub(crate) fn classify_status(status: u16, body: &str) -> WalletError {
    match status {
        400 => WalletError::BadRequest,
        401 => WalletError::Unauthorized,
        403 => WalletError::Forbidden,
        422 => WalletError::Validation {
            tag: extract_validation_tag(body),
        },
        500..=599 => WalletError::Server { status },
        _ => WalletError::Generic {
            error: format!("unexpected status code {status}"),
        },
    }
}

/// Pulls the failing-field tag out of a 422 body.
///
/// Accepts both `{"tag": "..."}` and `{"errors": [{"tag": "..."}]}` shapes;
/// tags outside the allow-list are collapsed so server internals never leak
/// into user-facing messages.
fn extract_validation_tag(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return GENERIC_VALIDATION_TAG.to_owned();
    };
    let tag = value
        .get("tag")
        .or_else(|| value.get("errors").and_then(|e| e.get(0)).and_then(|e| e.get("tag")))
        .and_then(serde_json::Value::as_str);

    match tag {
        Some(tag) if KNOWN_VALIDATION_TAGS.contains(&tag) => tag.to_owned(),
        _ => GENERIC_VALIDATION_TAG.to_owned(),
    }
}
