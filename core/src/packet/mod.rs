//! # Replay Packets
//!
//! A replay packet is the atomic unit of state transition: a timestamped,
//! sequence-numbered, hash-linked, signed bundle of metadata.
//!
//! ```text
//!   constructed (unsigned) ──sign()──▶ signed ──is_valid()──▶ ValidationResult
//!                                        │            ▲
//!                                        └────────────┘  (repeatable)
//! ```
//!
//! ## Identity
//!
//! [`ReplayPacket::hash`] covers the signature. The next packet's
//! `previous_hash` must therefore be taken *after* its predecessor was
//! signed, and an unsigned packet can never anchor a chain: validation
//! against an unsigned predecessor fails with `InvalidChain`.
//!
//! ## Errors vs results
//!
//! Malformed fields are a [`PacketError`] at construction. A well-formed
//! packet that breaks a chain rule is a [`ValidationResult`] with
//! `is_valid == false`, so policy code can branch without unwinding.

pub mod chain;
pub mod validation;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::audit::{AuditLog, AuditRecord};
use crate::canonical::{CanonicalValue, Canonicalize, Metadata};
use crate::crypto::hash::{is_chain_hash, sha256_hex};
use crate::crypto::{ProviderError, SignatureAlgorithm, SignatureProvider};
use crate::config::{MAX_PACKET_TIMESTAMP, PACKET_VERSION};

pub use chain::PacketChain;
pub use validation::{ValidationContext, ValidationErrorCode, ValidationResult};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Structural problems with a packet, or a refused state transition.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PacketError {
    #[error("timestamp {timestamp} must be below 2^63")]
    TimestampOutOfRange { timestamp: u64 },

    #[error("seed must not be empty")]
    EmptySeed,

    #[error("previous_hash must be 64 lowercase hex characters, got {0:?}")]
    MalformedPreviousHash(String),

    #[error("unsupported packet version {found}, expected {expected}")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("signature must be non-empty lowercase hex")]
    MalformedSignature,

    #[error("packet is already signed")]
    AlreadySigned,

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

// ---------------------------------------------------------------------------
// Packet
// ---------------------------------------------------------------------------

/// Caller-supplied fields of a new packet. Version and signature are not
/// caller-settable.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PacketFields {
    pub timestamp: u64,
    pub sequence: u64,
    pub seed: String,
    pub metadata: Option<Metadata>,
    pub previous_hash: Option<String>,
}

/// A validated replay packet. There is no way to observe one with invalid
/// fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PacketRecord")]
pub struct ReplayPacket {
    timestamp: u64,
    sequence: u64,
    seed: String,
    metadata: Option<Metadata>,
    previous_hash: Option<String>,
    version: u32,
    signature: Option<String>,
}

/// Wire shape accepted by `Deserialize`, validated into a [`ReplayPacket`].
#[derive(Deserialize)]
struct PacketRecord {
    timestamp: u64,
    sequence: u64,
    seed: String,
    #[serde(default)]
    metadata: Option<Metadata>,
    #[serde(default)]
    previous_hash: Option<String>,
    version: u32,
    #[serde(default)]
    signature: Option<String>,
}

impl TryFrom<PacketRecord> for ReplayPacket {
    type Error = PacketError;

    fn try_from(record: PacketRecord) -> Result<Self, Self::Error> {
        if record.version != PACKET_VERSION {
            return Err(PacketError::UnsupportedVersion {
                found: record.version,
                expected: PACKET_VERSION,
            });
        }
        let mut packet = Self::new(PacketFields {
            timestamp: record.timestamp,
            sequence: record.sequence,
            seed: record.seed,
            metadata: record.metadata,
            previous_hash: record.previous_hash,
        })?;
        if let Some(signature) = record.signature {
            if signature.is_empty() || !is_lower_hex(&signature) {
                return Err(PacketError::MalformedSignature);
            }
            packet.signature = Some(signature);
        }
        Ok(packet)
    }
}

fn is_lower_hex(s: &str) -> bool {
    s.len() % 2 == 0 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

impl ReplayPacket {
    /// Validates every field and builds an unsigned packet.
    ///
    /// # Errors
    ///
    /// - [`PacketError::TimestampOutOfRange`] for `timestamp >= 2^63`.
    /// - [`PacketError::EmptySeed`] for an empty seed.
    /// - [`PacketError::MalformedPreviousHash`] unless the link is 64
    ///   lowercase hex characters.
    pub fn new(fields: PacketFields) -> Result<Self, PacketError> {
        if fields.timestamp >= MAX_PACKET_TIMESTAMP {
            return Err(PacketError::TimestampOutOfRange {
                timestamp: fields.timestamp,
            });
        }
        if fields.seed.is_empty() {
            return Err(PacketError::EmptySeed);
        }
        if let Some(prev) = &fields.previous_hash {
            if !is_chain_hash(prev) {
                return Err(PacketError::MalformedPreviousHash(prev.clone()));
            }
        }
        Ok(Self {
            timestamp: fields.timestamp,
            sequence: fields.sequence,
            seed: fields.seed,
            metadata: fields.metadata,
            previous_hash: fields.previous_hash,
            version: PACKET_VERSION,
            signature: None,
        })
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    pub fn previous_hash(&self) -> Option<&str> {
        self.previous_hash.as_deref()
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Hex signature, once signed.
    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    fn canonical_value(&self, include_signature: bool) -> CanonicalValue {
        let mut value = CanonicalValue::map([
            ("metadata", CanonicalValue::from(self.metadata.clone())),
            ("previous_hash", CanonicalValue::from(self.previous_hash.clone())),
            ("seed", CanonicalValue::from(self.seed.as_str())),
            ("sequence", CanonicalValue::from(self.sequence)),
            ("timestamp", CanonicalValue::from(self.timestamp)),
            ("version", CanonicalValue::from(self.version)),
        ]);
        if include_signature {
            if let CanonicalValue::Map(map) = &mut value {
                map.insert(
                    "signature".to_string(),
                    CanonicalValue::from(self.signature.clone()),
                );
            }
        }
        value
    }

    /// Canonical JSON of the packet. `include_signature = false` is the
    /// exact byte string that gets signed.
    pub fn serialize_canonical(&self, include_signature: bool) -> String {
        self.canonical_value(include_signature).to_canonical_string()
    }

    /// SHA-256 hex of `serialize_canonical(true)`: the post-signature
    /// fingerprint.
    pub fn hash(&self) -> String {
        sha256_hex(self.serialize_canonical(true).as_bytes())
    }

    /// Signs the signature-free serialization and stores the result.
    ///
    /// Appends a `sign` entry to `log`. Signing twice is refused and leaves
    /// both the packet and the log untouched.
    pub fn sign(
        &mut self,
        provider: &mut dyn SignatureProvider,
        private_key: &[u8],
        algorithm: SignatureAlgorithm,
        log: &mut AuditLog,
    ) -> Result<(), PacketError> {
        if self.signature.is_some() {
            return Err(PacketError::AlreadySigned);
        }
        let content = self.serialize_canonical(false);
        let signature = provider.sign(private_key, content.as_bytes(), algorithm)?;
        self.signature = Some(hex::encode(&signature));

        let inputs = [
            ("algorithm", CanonicalValue::from(algorithm.as_str())),
            ("content_digest", sha256_hex(content.as_bytes()).into()),
            ("sequence", self.sequence.into()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        let result = CanonicalValue::map([
            ("packet_hash", CanonicalValue::from(self.hash())),
            ("signature_length", signature.len().into()),
        ]);
        log.append(AuditRecord::new("sign", inputs, result));
        debug!(sequence = self.sequence, %algorithm, "packet signed");
        Ok(())
    }

    /// `true` when the stored signature verifies under `public_key`.
    /// Unsigned packets never verify.
    pub fn verify_signature(
        &self,
        provider: &mut dyn SignatureProvider,
        public_key: &[u8],
        algorithm: SignatureAlgorithm,
    ) -> bool {
        let Some(signature) = self.signature.as_deref() else {
            return false;
        };
        let Ok(signature) = hex::decode(signature) else {
            return false;
        };
        provider.verify(
            public_key,
            self.serialize_canonical(false).as_bytes(),
            &signature,
            algorithm,
        )
    }
}

impl Canonicalize for ReplayPacket {
    fn to_canonical_value(&self) -> CanonicalValue {
        self.canonical_value(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::MockSignatureProvider;

    fn fields(sequence: u64) -> PacketFields {
        PacketFields {
            timestamp: 1_700_000_000 + sequence,
            sequence,
            seed: format!("seed-{sequence}"),
            metadata: None,
            previous_hash: None,
        }
    }

    #[test]
    fn construction_validates_fields() {
        assert_eq!(
            ReplayPacket::new(PacketFields {
                timestamp: MAX_PACKET_TIMESTAMP,
                ..fields(0)
            }),
            Err(PacketError::TimestampOutOfRange {
                timestamp: MAX_PACKET_TIMESTAMP
            })
        );
        assert!(ReplayPacket::new(PacketFields {
            timestamp: MAX_PACKET_TIMESTAMP - 1,
            ..fields(0)
        })
        .is_ok());
        assert_eq!(
            ReplayPacket::new(PacketFields {
                seed: String::new(),
                ..fields(0)
            }),
            Err(PacketError::EmptySeed)
        );
        let upper = "A".repeat(64);
        assert_eq!(
            ReplayPacket::new(PacketFields {
                previous_hash: Some(upper.clone()),
                ..fields(0)
            }),
            Err(PacketError::MalformedPreviousHash(upper))
        );
    }

    #[test]
    fn serialization_is_canonical() {
        let mut meta = Metadata::new();
        meta.insert("z".into(), 1u64.into());
        meta.insert("a".into(), "x".into());
        let packet = ReplayPacket::new(PacketFields {
            metadata: Some(meta),
            ..fields(3)
        })
        .unwrap();
        assert_eq!(
            packet.serialize_canonical(false),
            r#"{"metadata":{"a":"x","z":1},"previous_hash":null,"seed":"seed-3","sequence":3,"timestamp":1700000003,"version":1}"#
        );
        assert!(packet.serialize_canonical(true).ends_with(r#""signature":null,"timestamp":1700000003,"version":1}"#));
    }

    #[test]
    fn signing_changes_hash_and_is_final() {
        let algorithm = SignatureAlgorithm::MlDsa44;
        let mut provider = MockSignatureProvider::new();
        let kp = provider
            .generate_keypair(b"packet-test-seed-0001", algorithm)
            .unwrap();
        let mut log = AuditLog::new();

        let mut packet = ReplayPacket::new(fields(0)).unwrap();
        let unsigned_hash = packet.hash();
        packet
            .sign(&mut provider, kp.private_key(), algorithm, &mut log)
            .unwrap();
        assert_ne!(packet.hash(), unsigned_hash);
        assert_eq!(log.len(), 1);
        assert_eq!(log.entries()[0].op_name(), "sign");

        let signed_hash = packet.hash();
        assert_eq!(
            packet.sign(&mut provider, kp.private_key(), algorithm, &mut log),
            Err(PacketError::AlreadySigned)
        );
        assert_eq!(packet.hash(), signed_hash);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn signature_binds_to_key() {
        let algorithm = SignatureAlgorithm::MlDsa65;
        let mut provider = MockSignatureProvider::new();
        let key_a = provider.generate_keypair(b"key-a-seed-000000000", algorithm).unwrap();
        let key_b = provider.generate_keypair(b"key-b-seed-000000000", algorithm).unwrap();
        let mut log = AuditLog::new();

        let mut packet = ReplayPacket::new(fields(0)).unwrap();
        assert!(!packet.verify_signature(&mut provider, key_a.public_key(), algorithm));
        packet
            .sign(&mut provider, key_a.private_key(), algorithm, &mut log)
            .unwrap();
        assert!(packet.verify_signature(&mut provider, key_a.public_key(), algorithm));
        assert!(!packet.verify_signature(&mut provider, key_b.public_key(), algorithm));
    }

    #[test]
    fn json_round_trip_validates() {
        let packet = ReplayPacket::new(PacketFields {
            previous_hash: Some("ab".repeat(32)),
            ..fields(1)
        })
        .unwrap();
        let json = serde_json::to_string(&packet).unwrap();
        let back: ReplayPacket = serde_json::from_str(&json).unwrap();
        assert_eq!(back.hash(), packet.hash());

        let bad_version = json.replace(r#""version":1"#, r#""version":2"#);
        assert!(serde_json::from_str::<ReplayPacket>(&bad_version).is_err());
        let empty_seed = json.replace(r#""seed":"seed-1""#, r#""seed":"""#);
        assert!(serde_json::from_str::<ReplayPacket>(&empty_seed).is_err());
    }

    #[test]
    fn wire_round_trip_keeps_hash_for_integer_extremes() {
        let mut meta = Metadata::new();
        meta.insert("hi".into(), u64::MAX.into());
        meta.insert("lo".into(), i64::MIN.into());
        let packet = ReplayPacket::new(PacketFields {
            metadata: Some(meta),
            ..fields(2)
        })
        .unwrap();

        let json = serde_json::to_string(&packet).unwrap();
        let back: ReplayPacket = serde_json::from_str(&json).unwrap();
        assert_eq!(back, packet);
        assert_eq!(back.hash(), packet.hash());
        assert!(packet
            .serialize_canonical(false)
            .contains(r#""hi":18446744073709551615,"lo":-9223372036854775808"#));

        // Wider integers never reach a packet.
        assert!(CanonicalValue::try_from(1i128 << 70).is_err());
    }
}
