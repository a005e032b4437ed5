//! Hardware public-key fingerprint.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use sha2::{Digest, Sha256};

use crate::secure_area::EcPublicKey;

/// SEC1 uncompressed point marker.
const UNCOMPRESSED_POINT_TAG: u8 = 0x04;

/// Derives the transmittable fingerprint of a hardware public key:
/// SHA-256 over the uncompressed point `0x04 || X || Y`, standard base64
/// with padding.
#[must_use]
pub fn public_key_tag(public_key: &EcPublicKey) -> String {
    let mut point = Vec::with_capacity(65);
    point.push(UNCOMPRESSED_POINT_TAG);
    point.extend_from_slice(&public_key.x);
    point.extend_from_slice(&public_key.y);
    STANDARD.encode(Sha256::digest(&point))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_key() -> EcPublicKey {
        EcPublicKey {
            x: [0x11; 32],
            y: [0x22; 32],
        }
    }

    #[test]
    fn test_known_fingerprint() {
        assert_eq!(
            public_key_tag(&sample_key()),
            "em1mKNc6E3ln6z/i37hKCTCnd8FG0qgVfFvPvrPV1Do="
        );
    }

    #[test]
    fn test_uses_standard_base64_with_padding() {
        // 32 hash bytes always pad; the alphabet is the standard one, not
        // the URL-safe variant used for the envelope.
        let tag = public_key_tag(&sample_key());
        assert!(tag.ends_with('='));
    }

    #[test]
    fn test_coordinates_are_order_sensitive() {
        let swapped = EcPublicKey {
            x: [0x22; 32],
            y: [0x11; 32],
        };
        assert_ne!(public_key_tag(&sample_key()), public_key_tag(&swapped));
    }
}
