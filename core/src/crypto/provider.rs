//! # Signature Providers
//!
//! The pluggable keygen/sign/verify surface. Two backends implement it:
//!
//! - [`MockSignatureProvider`](super::mock::MockSignatureProvider):
//!   keyed-hash signatures for development and deterministic replay.
//! - [`LatticeSignatureProvider`](super::lattice::LatticeSignatureProvider):
//!   real ML-DSA (FIPS 204) signatures.
//!
//! [`create_provider`] picks one from a [`ProviderConfig`]. Mock is the
//! default, because a test suite that silently needs a lattice library is a
//! test suite that silently doesn't run.
//!
//! Every provider keeps its own audit log and appends one entry per call.
//! Entries summarize (algorithm, lengths, digests). Key bytes never go in.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::hash::sha256_hex;
use super::keys::{KeyError, Keypair};
use super::lattice::LatticeSignatureProvider;
use super::mock::MockSignatureProvider;
use crate::audit::{AuditLog, AuditRecord};
use crate::canonical::{CanonicalValue, Metadata};
use crate::config::{ProviderConfig, SignatureBackend, MIN_SEED_LENGTH};

/// Errors from provider operations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("seed must be at least {min} bytes, got {found}")]
    SeedTooShort { min: usize, found: usize },

    #[error("unknown signature algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error("signature backend failure: {0}")]
    Backend(&'static str),
}

/// ML-DSA parameter sets, by FIPS 204 name.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SignatureAlgorithm {
    /// Security category 2. Also known as Dilithium2.
    MlDsa44,
    /// Security category 3. Also known as Dilithium3.
    #[default]
    MlDsa65,
    /// Security category 5. Also known as Dilithium5.
    MlDsa87,
}

impl SignatureAlgorithm {
    pub const ALL: [Self; 3] = [Self::MlDsa44, Self::MlDsa65, Self::MlDsa87];

    /// Parses `ML-DSA-44`, `ml_dsa_65`, `Dilithium5`, etc.
    pub fn parse(s: &str) -> Result<Self, ProviderError> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_uppercase();
        match normalized.as_str() {
            "MLDSA44" | "DILITHIUM2" => Ok(Self::MlDsa44),
            "MLDSA65" | "DILITHIUM3" => Ok(Self::MlDsa65),
            "MLDSA87" | "DILITHIUM5" => Ok(Self::MlDsa87),
            _ => Err(ProviderError::UnknownAlgorithm(s.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MlDsa44 => "ML-DSA-44",
            Self::MlDsa65 => "ML-DSA-65",
            Self::MlDsa87 => "ML-DSA-87",
        }
    }

    pub fn public_key_len(&self) -> usize {
        match self {
            Self::MlDsa44 => fips204::ml_dsa_44::PK_LEN,
            Self::MlDsa65 => fips204::ml_dsa_65::PK_LEN,
            Self::MlDsa87 => fips204::ml_dsa_87::PK_LEN,
        }
    }

    pub fn private_key_len(&self) -> usize {
        match self {
            Self::MlDsa44 => fips204::ml_dsa_44::SK_LEN,
            Self::MlDsa65 => fips204::ml_dsa_65::SK_LEN,
            Self::MlDsa87 => fips204::ml_dsa_87::SK_LEN,
        }
    }

    pub fn signature_len(&self) -> usize {
        match self {
            Self::MlDsa44 => fips204::ml_dsa_44::SIG_LEN,
            Self::MlDsa65 => fips204::ml_dsa_65::SIG_LEN,
            Self::MlDsa87 => fips204::ml_dsa_87::SIG_LEN,
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SignatureAlgorithm {
    type Error = ProviderError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<SignatureAlgorithm> for String {
    fn from(algorithm: SignatureAlgorithm) -> Self {
        algorithm.as_str().to_string()
    }
}

/// Key generation, signing, and verification behind one object-safe trait.
///
/// Methods take `&mut self` because every call appends to the provider's
/// audit log.
pub trait SignatureProvider: Send {
    fn backend(&self) -> SignatureBackend;

    /// Derives a keypair. A pure function of `(seed, algorithm)`.
    ///
    /// # Errors
    ///
    /// [`ProviderError::SeedTooShort`] below [`MIN_SEED_LENGTH`] bytes.
    fn generate_keypair(
        &mut self,
        seed: &[u8],
        algorithm: SignatureAlgorithm,
    ) -> Result<Keypair, ProviderError>;

    fn sign(
        &mut self,
        private_key: &[u8],
        message: &[u8],
        algorithm: SignatureAlgorithm,
    ) -> Result<Vec<u8>, ProviderError>;

    /// `false` for any malformed input rather than an error. Callers want a
    /// yes/no answer.
    fn verify(
        &mut self,
        public_key: &[u8],
        message: &[u8],
        signature: &[u8],
        algorithm: SignatureAlgorithm,
    ) -> bool;

    /// The provider-level log of every successful call.
    fn audit_log(&self) -> &AuditLog;
}

/// Builds the provider selected by `config`.
pub fn create_provider(config: &ProviderConfig) -> Box<dyn SignatureProvider> {
    match config.backend {
        SignatureBackend::Mock => Box::new(MockSignatureProvider::new()),
        SignatureBackend::Lattice => Box::new(LatticeSignatureProvider::new()),
    }
}

pub(crate) fn check_seed(seed: &[u8]) -> Result<(), ProviderError> {
    if seed.len() < MIN_SEED_LENGTH {
        return Err(ProviderError::SeedTooShort {
            min: MIN_SEED_LENGTH,
            found: seed.len(),
        });
    }
    Ok(())
}

/// The audit log every backend carries, plus the correlation fields stamped
/// onto its entries.
#[derive(Clone, Debug, Default)]
pub(crate) struct ProviderAudit {
    log: AuditLog,
    pqc_cid: Option<String>,
    quantum_metadata: Option<Metadata>,
}

impl ProviderAudit {
    pub(crate) fn log(&self) -> &AuditLog {
        &self.log
    }

    pub(crate) fn set_pqc_cid(&mut self, pqc_cid: Option<String>) {
        self.pqc_cid = pqc_cid;
    }

    pub(crate) fn set_quantum_metadata(&mut self, quantum_metadata: Option<Metadata>) {
        self.quantum_metadata = quantum_metadata;
    }

    fn append(&mut self, op: &str, inputs: Metadata, result: CanonicalValue) {
        let record = AuditRecord::new(op, inputs, result)
            .with_pqc_cid(self.pqc_cid.clone())
            .with_quantum_metadata(self.quantum_metadata.clone());
        self.log.append(record);
    }

    pub(crate) fn record_keygen(
        &mut self,
        backend: SignatureBackend,
        algorithm: SignatureAlgorithm,
        seed: &[u8],
        keypair: &Keypair,
    ) {
        let inputs = summary([
            ("algorithm", algorithm.as_str().into()),
            ("backend", backend.as_str().into()),
            ("seed_length", seed.len().into()),
        ]);
        let result = CanonicalValue::map([
            ("private_key_length", CanonicalValue::from(keypair.private_key().len())),
            ("public_key_digest", sha256_hex(keypair.public_key()).into()),
            ("public_key_length", keypair.public_key().len().into()),
        ]);
        self.append("keygen", inputs, result);
    }

    pub(crate) fn record_sign(
        &mut self,
        backend: SignatureBackend,
        algorithm: SignatureAlgorithm,
        message: &[u8],
        signature: &[u8],
    ) {
        let inputs = summary([
            ("algorithm", algorithm.as_str().into()),
            ("backend", backend.as_str().into()),
            ("message_digest", sha256_hex(message).into()),
            ("message_length", message.len().into()),
        ]);
        let result = CanonicalValue::map([
            ("signature_digest", CanonicalValue::from(sha256_hex(signature))),
            ("signature_length", signature.len().into()),
        ]);
        self.append("sign", inputs, result);
    }

    pub(crate) fn record_verify(
        &mut self,
        backend: SignatureBackend,
        algorithm: SignatureAlgorithm,
        public_key: &[u8],
        message: &[u8],
        signature: &[u8],
        valid: bool,
    ) {
        let inputs = summary([
            ("algorithm", algorithm.as_str().into()),
            ("backend", backend.as_str().into()),
            ("message_digest", sha256_hex(message).into()),
            ("public_key_digest", sha256_hex(public_key).into()),
            ("signature_length", signature.len().into()),
        ]);
        self.append("verify", inputs, CanonicalValue::map([("valid", valid)]));
    }
}

fn summary<const N: usize>(pairs: [(&str, CanonicalValue); N]) -> Metadata {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithm_parsing_and_aliases() {
        assert_eq!("ML-DSA-44".parse::<SignatureAlgorithm>(), Ok(SignatureAlgorithm::MlDsa44));
        assert_eq!("ml_dsa_65".parse::<SignatureAlgorithm>(), Ok(SignatureAlgorithm::MlDsa65));
        assert_eq!("Dilithium5".parse::<SignatureAlgorithm>(), Ok(SignatureAlgorithm::MlDsa87));
        assert_eq!("dilithium2".parse::<SignatureAlgorithm>(), Ok(SignatureAlgorithm::MlDsa44));
        assert!(matches!(
            "RSA-2048".parse::<SignatureAlgorithm>(),
            Err(ProviderError::UnknownAlgorithm(_))
        ));
    }

    #[test]
    fn test_default_matches_config_constant() {
        assert_eq!(
            SignatureAlgorithm::default().as_str(),
            crate::config::DEFAULT_SIGNATURE_ALGORITHM
        );
    }

    #[test]
    fn test_fips204_sizes() {
        assert_eq!(SignatureAlgorithm::MlDsa44.public_key_len(), 1312);
        assert_eq!(SignatureAlgorithm::MlDsa44.signature_len(), 2420);
        assert_eq!(SignatureAlgorithm::MlDsa65.public_key_len(), 1952);
        assert_eq!(SignatureAlgorithm::MlDsa65.signature_len(), 3309);
        assert_eq!(SignatureAlgorithm::MlDsa87.public_key_len(), 2592);
        assert_eq!(SignatureAlgorithm::MlDsa87.signature_len(), 4627);
    }

    #[test]
    fn test_serde_uses_canonical_name() {
        let json = serde_json::to_string(&SignatureAlgorithm::MlDsa87).unwrap();
        assert_eq!(json, r#""ML-DSA-87""#);
        let parsed: SignatureAlgorithm = serde_json::from_str(r#""Dilithium3""#).unwrap();
        assert_eq!(parsed, SignatureAlgorithm::MlDsa65);
    }

    #[test]
    fn test_factory_defaults_to_mock() {
        let provider = create_provider(&ProviderConfig::default());
        assert_eq!(provider.backend(), SignatureBackend::Mock);

        let lattice = create_provider(&ProviderConfig {
            backend: SignatureBackend::Lattice,
        });
        assert_eq!(lattice.backend(), SignatureBackend::Lattice);
    }

    #[test]
    fn test_seed_floor() {
        assert_eq!(
            check_seed(&[0u8; 15]),
            Err(ProviderError::SeedTooShort { min: 16, found: 15 })
        );
        assert!(check_seed(&[0u8; 16]).is_ok());
    }
}
