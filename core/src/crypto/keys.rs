//! # Key Material
//!
//! Keypairs produced by a [`SignatureProvider`](super::SignatureProvider)
//! and the interchange formats they travel in: hex, base64, and the
//! structured [`KeyBundle`].
//!
//! ## Security considerations
//!
//! - Private key bytes are zeroized on drop, for both [`Keypair`] and
//!   [`KeyBundle`].
//! - `Debug` never prints private key material. Not even a prefix.
//! - Key bytes are never logged. Provider audit entries record lengths and
//!   public-key digests, nothing more.
//!
//! Zeroization is best effort. The allocator may already have copied the
//! buffer while a `Vec` grew, and the OS may have paged it out. Treat it as
//! hygiene, not a guarantee.

use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::Zeroize;

use super::provider::SignatureAlgorithm;

/// Errors from decoding or validating key material.
///
/// Vague about content on purpose: the bytes that failed to decode may be a
/// private key, and error messages end up in logs.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("invalid hex encoding")]
    InvalidHex,

    #[error("invalid base64 encoding")]
    InvalidBase64,

    #[error("{what} for {algorithm} must be {expected} bytes, got {found}")]
    LengthMismatch {
        what: &'static str,
        algorithm: SignatureAlgorithm,
        expected: usize,
        found: usize,
    },
}

/// A public/private keypair for one signature algorithm.
///
/// Produced deterministically from `(seed, algorithm)` by a provider.
/// Immutable: there is no way to change the bytes after construction.
#[derive(Clone, PartialEq, Eq)]
pub struct Keypair {
    public_key: Vec<u8>,
    private_key: Vec<u8>,
    algorithm: SignatureAlgorithm,
}

impl Keypair {
    /// Wraps raw key bytes after checking both lengths against `algorithm`.
    pub fn new(
        public_key: Vec<u8>,
        private_key: Vec<u8>,
        algorithm: SignatureAlgorithm,
    ) -> Result<Self, KeyError> {
        check_length("public key", algorithm, algorithm.public_key_len(), &public_key)?;
        check_length("private key", algorithm, algorithm.private_key_len(), &private_key)?;
        Ok(Self {
            public_key,
            private_key,
            algorithm,
        })
    }

    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// The private key. Don't log it, don't put it in an error message.
    pub fn private_key(&self) -> &[u8] {
        &self.private_key
    }

    pub fn algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }

    pub fn public_key_hex(&self) -> String {
        encode_hex(&self.public_key)
    }

    /// Exports both halves in the structured interchange form.
    pub fn to_bundle(&self) -> KeyBundle {
        KeyBundle {
            private_key: encode_base64(&self.private_key),
            public_key: encode_base64(&self.public_key),
            algorithm: self.algorithm,
        }
    }
}

impl Drop for Keypair {
    fn drop(&mut self) {
        self.private_key.zeroize();
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Public key is fine to show. The private key is not, even partially.
        let preview = &self.public_key_hex()[..16];
        write!(f, "Keypair({}, pub={preview}…)", self.algorithm)
    }
}

/// `{private_key, public_key, algorithm}` with both keys base64-encoded.
///
/// This is the shape written to disk or handed across a process boundary.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBundle {
    pub private_key: String,
    pub public_key: String,
    pub algorithm: SignatureAlgorithm,
}

impl KeyBundle {
    /// Decodes and length-checks the bundle.
    pub fn to_keypair(&self) -> Result<Keypair, KeyError> {
        let public_key = decode_base64(&self.public_key)?;
        let private_key = decode_base64(&self.private_key)?;
        Keypair::new(public_key, private_key, self.algorithm)
    }
}

impl Drop for KeyBundle {
    fn drop(&mut self) {
        self.private_key.zeroize();
    }
}

impl fmt::Debug for KeyBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyBundle")
            .field("algorithm", &self.algorithm)
            .field("private_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

fn check_length(
    what: &'static str,
    algorithm: SignatureAlgorithm,
    expected: usize,
    bytes: &[u8],
) -> Result<(), KeyError> {
    if bytes.len() == expected {
        Ok(())
    } else {
        Err(KeyError::LengthMismatch {
            what,
            algorithm,
            expected,
            found: bytes.len(),
        })
    }
}

/// Lowercase hex.
pub fn encode_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

pub fn decode_hex(s: &str) -> Result<Vec<u8>, KeyError> {
    hex::decode(s).map_err(|_| KeyError::InvalidHex)
}

/// Standard-alphabet, padded base64.
pub fn encode_base64(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

pub fn decode_base64(s: &str) -> Result<Vec<u8>, KeyError> {
    BASE64.decode(s).map_err(|_| KeyError::InvalidBase64)
}

/// Overwrites `bytes` in place with zeros. Length is unchanged.
pub fn zeroize_bytes(bytes: &mut [u8]) {
    bytes.zeroize();
}
