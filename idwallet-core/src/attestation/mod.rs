//! Attestation envelope encoding and key fingerprinting.
//!
//! Encoding variants are load-bearing: the envelope is base64url without
//! padding, the key tag is standard base64 with padding. The server-side
//! verifier expects exactly these formats per field.

mod encoder;
mod key_tag;

pub use encoder::encode_attestation;
pub use key_tag::public_key_tag;
