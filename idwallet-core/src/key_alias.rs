//! Hardware key alias generation.

use uuid::Uuid;

/// Keystore implementations bound alias length; stay inside it.
const MAX_KEY_ALIAS_LEN: usize = 64;

/// Produces a fresh, process-wide-unique alias for a hardware key.
///
/// Two concatenated UUIDv4s in simple form give 256 bits of randomness in
/// exactly [`MAX_KEY_ALIAS_LEN`] hex characters; an alias is never reused.
#[must_use]
pub fn generate_key_alias() -> String {
    let mut alias = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
    alias.truncate(MAX_KEY_ALIAS_LEN);
    alias
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_alias_length_bound() {
        assert_eq!(generate_key_alias().len(), MAX_KEY_ALIAS_LEN);
    }

    #[test]
    fn test_alias_charset_is_keystore_safe() {
        assert!(generate_key_alias().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_aliases_do_not_repeat() {
        let aliases: HashSet<_> = (0..256).map(|_| generate_key_alias()).collect();
        assert_eq!(aliases.len(), 256);
    }
}
