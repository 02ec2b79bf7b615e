//! Deterministic keyed-hash signature backend.
//!
//! Keys and signatures have the exact lengths of the ML-DSA parameter set
//! they stand in for, so code that sizes buffers or checks lengths behaves
//! the same against either backend.
//!
//! A signature is `BLAKE3-XOF(public_key || message)` under a fixed context.
//! Verification recomputes it, so a signature binds to the exact message
//! and key bytes. It is **not** unforgeable: anyone holding the public key
//! can produce a valid signature. Use it for tests and replay, never for
//! anything facing an adversary.

use tracing::info;

use super::hash::domain_separated_expand;
use super::keys::{KeyError, Keypair};
use super::provider::{check_seed, ProviderAudit, ProviderError, SignatureAlgorithm, SignatureProvider};
use crate::audit::AuditLog;
use crate::canonical::Metadata;
use crate::config::SignatureBackend;

const PRIVATE_KEY_CONTEXT: &str = "veridet 2026 mock signature private key";
const PUBLIC_KEY_CONTEXT: &str = "veridet 2026 mock signature public key";
const SIGNATURE_CONTEXT: &str = "veridet 2026 mock signature";

/// Keyed-hash stand-in for the lattice backend.
#[derive(Clone, Debug, Default)]
pub struct MockSignatureProvider {
    audit: ProviderAudit,
}

impl MockSignatureProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Correlation id stamped onto every subsequent audit entry.
    pub fn with_pqc_cid(mut self, pqc_cid: impl Into<String>) -> Self {
        self.audit.set_pqc_cid(Some(pqc_cid.into()));
        self
    }

    pub fn with_quantum_metadata(mut self, quantum_metadata: Metadata) -> Self {
        self.audit.set_quantum_metadata(Some(quantum_metadata));
        self
    }
}

fn derive_public_key(private_key: &[u8], algorithm: SignatureAlgorithm) -> Vec<u8> {
    domain_separated_expand(
        PUBLIC_KEY_CONTEXT,
        &[algorithm.as_str().as_bytes(), private_key],
        algorithm.public_key_len(),
    )
}

fn expected_signature(public_key: &[u8], message: &[u8], algorithm: SignatureAlgorithm) -> Vec<u8> {
    domain_separated_expand(
        SIGNATURE_CONTEXT,
        &[algorithm.as_str().as_bytes(), public_key, message],
        algorithm.signature_len(),
    )
}

impl SignatureProvider for MockSignatureProvider {
    fn backend(&self) -> SignatureBackend {
        SignatureBackend::Mock
    }

    fn generate_keypair(
        &mut self,
        seed: &[u8],
        algorithm: SignatureAlgorithm,
    ) -> Result<Keypair, ProviderError> {
        check_seed(seed)?;
        let private_key = domain_separated_expand(
            PRIVATE_KEY_CONTEXT,
            &[algorithm.as_str().as_bytes(), seed],
            algorithm.private_key_len(),
        );
        let public_key = derive_public_key(&private_key, algorithm);
        let keypair = Keypair::new(public_key, private_key, algorithm)?;

        info!(backend = "mock", %algorithm, "keypair generated");
        self.audit
            .record_keygen(SignatureBackend::Mock, algorithm, seed, &keypair);
        Ok(keypair)
    }

    fn sign(
        &mut self,
        private_key: &[u8],
        message: &[u8],
        algorithm: SignatureAlgorithm,
    ) -> Result<Vec<u8>, ProviderError> {
        if private_key.len() != algorithm.private_key_len() {
            return Err(KeyError::LengthMismatch {
                what: "private key",
                algorithm,
                expected: algorithm.private_key_len(),
                found: private_key.len(),
            }
            .into());
        }
        let public_key = derive_public_key(private_key, algorithm);
        let signature = expected_signature(&public_key, message, algorithm);
        self.audit
            .record_sign(SignatureBackend::Mock, algorithm, message, &signature);
        Ok(signature)
    }

    fn verify(
        &mut self,
        public_key: &[u8],
        message: &[u8],
        signature: &[u8],
        algorithm: SignatureAlgorithm,
    ) -> bool {
        let valid = public_key.len() == algorithm.public_key_len()
            && signature.len() == algorithm.signature_len()
            && expected_signature(public_key, message, algorithm) == signature;
        self.audit.record_verify(
            SignatureBackend::Mock,
            algorithm,
            public_key,
            message,
            signature,
            valid,
        );
        valid
    }

    fn audit_log(&self) -> &AuditLog {
        self.audit.log()
    }
}
