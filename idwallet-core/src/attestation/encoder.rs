//! CBOR attestation envelope.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use ciborium::value::{Integer, Value};
use tracing::warn;

/// Attestation format identifier understood by the verifier.
const ATTESTATION_FORMAT: &str = "android-key";

/// COSE algorithm identifier for ES256.
const ALG_ES256: i64 = -7;

/// Serializes a key attestation into the canonical envelope:
/// `{fmt: "android-key", attStmt: {alg: -7, sig, x5c}}`, CBOR-encoded and
/// base64url-encoded without padding.
///
/// Returns `None` on an empty signature or certificate chain, or if CBOR
/// encoding fails; a partial envelope is never produced. Output is
/// deterministic for fixed inputs (map entries are written in declaration
/// order).
#[must_use]
pub fn encode_attestation(signature: &[u8], certificate_chain: &[Vec<u8>]) -> Option<String> {
    if signature.is_empty() {
        warn!("attestation signature is empty");
        return None;
    }
    if certificate_chain.is_empty() || certificate_chain.iter().any(Vec::is_empty) {
        warn!("attestation certificate chain is empty");
        return None;
    }

    let x5c = Value::Array(
        certificate_chain
            .iter()
            .map(|cert| Value::Bytes(cert.clone()))
            .collect(),
    );
    let att_stmt = Value::Map(vec![
        (Value::Text("alg".into()), Value::Integer(Integer::from(ALG_ES256))),
        (Value::Text("sig".into()), Value::Bytes(signature.to_vec())),
        (Value::Text("x5c".into()), x5c),
    ]);
    let envelope = Value::Map(vec![
        (Value::Text("fmt".into()), Value::Text(ATTESTATION_FORMAT.into())),
        (Value::Text("attStmt".into()), att_stmt),
    ]);

    let mut bytes = Vec::new();
    if let Err(err) = ciborium::ser::into_writer(&envelope, &mut bytes) {
        warn!(%err, "CBOR encoding of attestation envelope failed");
        return None;
    }
    Some(URL_SAFE_NO_PAD.encode(bytes))
}
