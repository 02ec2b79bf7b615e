//! # Hashing Utilities
//!
//! The digests Veridet commits to, and refuses to add more of without a
//! very good reason:
//!
//! - **SHA-256**: audit-log entries, log digests, replay-packet hashes.
//!   Everything that forms a chain is 64 lowercase hex characters.
//! - **SHA-512**: the wide digest for the canonical-encoding layer that
//!   higher subsystems key content by. 128 hex characters.
//! - **BLAKE3 `derive_key`**: domain-separated key derivation inside the
//!   mock signature backend. Never used for anything that's chained.
//!
//! ## On keeping them apart
//!
//! Mixing the 256-bit and 512-bit surfaces is the classic way to end up
//! with two implementations that "both hash correctly" and still disagree.
//! The functions here are named for their width on purpose.

use sha2::{Digest, Sha256, Sha512};

use crate::config::{HASH_HEX_LENGTH, WIDE_HASH_HEX_LENGTH};

/// Compute the SHA-256 hash of the input data.
///
/// # Example
///
/// ```
/// use veridet_core::crypto::hash::sha256;
///
/// let hash = sha256(b"veridet");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// SHA-256 as lowercase hex. This is the chain digest.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// SHA-512 as lowercase hex (128 characters).
pub fn sha512_hex(data: &[u8]) -> String {
    let mut hasher = Sha512::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Domain-separated BLAKE3 with caller-chosen output length (XOF mode).
///
/// Uses BLAKE3's `derive_key` mode, which picks a different internal IV per
/// context, so `("keygen", x)` and `("sign", x)` can never collide.
pub fn domain_separated_expand(context: &str, parts: &[&[u8]], length: usize) -> Vec<u8> {
    let mut hasher = blake3::Hasher::new_derive_key(context);
    for part in parts {
        // Length-prefix each part so (ab, c) and (a, bc) differ.
        hasher.update(&(part.len() as u64).to_be_bytes());
        hasher.update(part);
    }
    let mut output = vec![0u8; length];
    hasher.finalize_xof().fill(&mut output);
    output
}

/// `true` when `s` is exactly `len` lowercase hex characters.
pub fn is_hex_digest(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// `true` for a well-formed SHA-256 hex digest.
pub fn is_chain_hash(s: &str) -> bool {
    is_hex_digest(s, HASH_HEX_LENGTH)
}

/// `true` for a well-formed SHA-512 hex digest.
pub fn is_wide_hash(s: &str) -> bool {
    is_hex_digest(s, WIDE_HASH_HEX_LENGTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_vector() {
        // SHA-256 of empty string, the canonical test vector everyone should
        // have memorized by now.
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_sha512_known_vector() {
        assert_eq!(
            sha512_hex(b""),
            "cf83e1357eefb8bdf1542850d66d8007d620e4050b5715dc83f4a921d36ce9ce\
             47d0d13c5d85f2b0ff8318d2877eec2f63b931bd47417a81a538327af927da3e"
        );
    }

    #[test]
    fn test_domain_separation() {
        let data = b"same data";
        assert_ne!(
            domain_separated_expand("context-a", &[data], 32),
            domain_separated_expand("context-b", &[data], 32)
        );
    }

    #[test]
    fn test_expand_length_and_framing() {
        let out = domain_separated_expand("veridet test", &[b"ab", b"c"], 100);
        assert_eq!(out.len(), 100);
        let reframed = domain_separated_expand("veridet test", &[b"a", b"bc"], 100);
        assert_ne!(out, reframed);
        let again = domain_separated_expand("veridet test", &[b"ab", b"c"], 100);
        assert_eq!(out, again);
    }

    #[test]
    fn test_hex_digest_checks() {
        assert!(is_chain_hash(&sha256_hex(b"x")));
        assert!(!is_chain_hash(&sha256_hex(b"x").to_uppercase()));
        assert!(!is_chain_hash("abc"));
        assert!(is_wide_hash(&sha512_hex(b"x")));
        assert!(!is_wide_hash(&sha256_hex(b"x")));
    }
}
