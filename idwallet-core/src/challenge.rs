//! Server challenge processing.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use sha2::{Digest, Sha256};
use tracing::warn;

/// Decodes a server-issued base64url challenge (no padding) and returns the
/// SHA-256 digest of the decoded bytes, used as the key-creation nonce.
///
/// Malformed input yields `None`; this boundary never panics or errors.
#[must_use]
pub fn decode_challenge_digest(challenge: &str) -> Option<[u8; 32]> {
    match URL_SAFE_NO_PAD.decode(challenge) {
        Ok(decoded) => Some(Sha256::digest(&decoded).into()),
        Err(err) => {
            warn!(%err, "challenge is not valid base64url");
            None
        }
    }
}
