//! ML-DSA (FIPS 204) backend on top of the `fips204` crate.
//!
//! Keygen and signing both draw randomness from a [`StdRng`] seeded by a
//! SHA-256 derivation, never from the OS. That keeps keygen a pure function
//! of `(seed, algorithm)` and makes signatures reproducible for a given
//! `(private_key, message)`, which replay comparison depends on.

use fips204::traits::{KeyGen, SerDes, Signer, Verifier};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};
use zeroize::Zeroize;

use super::hash::sha256;
use super::keys::{KeyError, Keypair};
use super::provider::{check_seed, ProviderAudit, ProviderError, SignatureAlgorithm, SignatureProvider};
use crate::audit::AuditLog;
use crate::canonical::Metadata;
use crate::config::SignatureBackend;

const KEYGEN_DOMAIN: &[u8] = b"veridet/ml-dsa/keygen";
const SIGNING_DOMAIN: &[u8] = b"veridet/ml-dsa/sign";

/// Runs `$body` with `$m` bound to the `fips204` module for `$algorithm`.
macro_rules! with_parameter_set {
    ($algorithm:expr, $m:ident => $body:block) => {
        match $algorithm {
            SignatureAlgorithm::MlDsa44 => {
                use fips204::ml_dsa_44 as $m;
                $body
            }
            SignatureAlgorithm::MlDsa65 => {
                use fips204::ml_dsa_65 as $m;
                $body
            }
            SignatureAlgorithm::MlDsa87 => {
                use fips204::ml_dsa_87 as $m;
                $body
            }
        }
    };
}

/// Real post-quantum signatures.
#[derive(Clone, Debug, Default)]
pub struct LatticeSignatureProvider {
    audit: ProviderAudit,
}

impl LatticeSignatureProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pqc_cid(mut self, pqc_cid: impl Into<String>) -> Self {
        self.audit.set_pqc_cid(Some(pqc_cid.into()));
        self
    }

    pub fn with_quantum_metadata(mut self, quantum_metadata: Metadata) -> Self {
        self.audit.set_quantum_metadata(Some(quantum_metadata));
        self
    }
}

fn rng_from(domain: &[u8], parts: &[&[u8]]) -> StdRng {
    let mut material = domain.to_vec();
    for part in parts {
        material.extend_from_slice(&(part.len() as u64).to_be_bytes());
        material.extend_from_slice(part);
    }
    let rng = StdRng::from_seed(sha256(&material));
    material.zeroize();
    rng
}

fn private_key_mismatch(algorithm: SignatureAlgorithm, found: usize) -> ProviderError {
    KeyError::LengthMismatch {
        what: "private key",
        algorithm,
        expected: algorithm.private_key_len(),
        found,
    }
    .into()
}

impl SignatureProvider for LatticeSignatureProvider {
    fn backend(&self) -> SignatureBackend {
        SignatureBackend::Lattice
    }

    fn generate_keypair(
        &mut self,
        seed: &[u8],
        algorithm: SignatureAlgorithm,
    ) -> Result<Keypair, ProviderError> {
        check_seed(seed)?;
        let mut rng = rng_from(KEYGEN_DOMAIN, &[algorithm.as_str().as_bytes(), seed]);
        let keypair = with_parameter_set!(algorithm, m => {
            let (pk, sk) = m::KG::try_keygen_with_rng(&mut rng).map_err(ProviderError::Backend)?;
            Keypair::new(pk.into_bytes().to_vec(), sk.into_bytes().to_vec(), algorithm)?
        });

        info!(backend = "lattice", %algorithm, "keypair generated");
        self.audit
            .record_keygen(SignatureBackend::Lattice, algorithm, seed, &keypair);
        Ok(keypair)
    }

    fn sign(
        &mut self,
        private_key: &[u8],
        message: &[u8],
        algorithm: SignatureAlgorithm,
    ) -> Result<Vec<u8>, ProviderError> {
        let mut rng = rng_from(SIGNING_DOMAIN, &[private_key, message]);
        let signature = with_parameter_set!(algorithm, m => {
            let mut bytes = <[u8; m::SK_LEN]>::try_from(private_key)
                .map_err(|_| private_key_mismatch(algorithm, private_key.len()))?;
            let sk = m::PrivateKey::try_from_bytes(bytes);
            bytes.zeroize();
            let sk = sk.map_err(ProviderError::Backend)?;
            sk.try_sign_with_rng(&mut rng, message, &[])
                .map_err(ProviderError::Backend)?
                .to_vec()
        });

        self.audit
            .record_sign(SignatureBackend::Lattice, algorithm, message, &signature);
        Ok(signature)
    }

    fn verify(
        &mut self,
        public_key: &[u8],
        message: &[u8],
        signature: &[u8],
        algorithm: SignatureAlgorithm,
    ) -> bool {
        let valid = with_parameter_set!(algorithm, m => {
            match (
                <[u8; m::PK_LEN]>::try_from(public_key),
                <[u8; m::SIG_LEN]>::try_from(signature),
            ) {
                (Ok(pk_bytes), Ok(sig)) => match m::PublicKey::try_from_bytes(pk_bytes) {
                    Ok(pk) => pk.verify(message, &sig, &[]),
                    Err(reason) => {
                        debug!(%algorithm, reason, "rejected malformed public key");
                        false
                    }
                },
                _ => false,
            }
        });

        self.audit.record_verify(
            SignatureBackend::Lattice,
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
