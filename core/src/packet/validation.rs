//! Packet validation: the ordered checks a packet must pass before its
//! state transition is accepted.
//!
//! The checks, in order:
//!
//! 1. **Signature**: when a public key is supplied, the packet must be
//!    signed and verify under it.
//! 2. **Chain**: when a predecessor is supplied, it must be signed and
//!    `previous_hash` must equal its hash.
//! 3. **Sequence**: `predecessor.sequence + 1` and `expected_sequence`,
//!    each when supplied. Supplying both requires both to hold.
//! 4. **Timestamp**: never earlier than the predecessor's.
//!
//! The first failing check decides the error code. Callers branch on that
//! code, so the order is part of the contract.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::ReplayPacket;
use crate::audit::{AuditLog, AuditRecord};
use crate::canonical::{CanonicalValue, Metadata};
use crate::crypto::{SignatureAlgorithm, SignatureProvider};

/// Why a packet was refused, or `None` when it wasn't.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationErrorCode {
    InvalidSignature,
    InvalidChain,
    InvalidSequence,
    InvalidTtsTimestamp,
    None,
}

impl ValidationErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::InvalidChain => "INVALID_CHAIN",
            Self::InvalidSequence => "INVALID_SEQUENCE",
            Self::InvalidTtsTimestamp => "INVALID_TTS_TIMESTAMP",
            Self::None => "NONE",
        }
    }
}

impl fmt::Display for ValidationErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one validation call. Computed fresh every time; never stored
/// on the packet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub error_code: ValidationErrorCode,
    pub error_message: String,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            is_valid: true,
            error_code: ValidationErrorCode::None,
            error_message: String::new(),
        }
    }

    pub fn fail(error_code: ValidationErrorCode, error_message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            error_code,
            error_message: error_message.into(),
        }
    }
}

/// Everything a packet is validated against.
///
/// Leave a field unset to skip its check: no public key, no signature
/// check; no predecessor, no chain or timestamp check. `expected_sequence`
/// and a predecessor are independent constraints on the sequence, so a
/// packet passes only if it satisfies every one supplied.
#[derive(Default)]
pub struct ValidationContext<'a> {
    pub expected_sequence: Option<u64>,
    pub public_key: Option<&'a [u8]>,
    pub algorithm: SignatureAlgorithm,
    pub previous_packet: Option<&'a ReplayPacket>,
    pub provider: Option<&'a mut dyn SignatureProvider>,
}

impl<'a> ValidationContext<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expect_sequence(mut self, sequence: u64) -> Self {
        self.expected_sequence = Some(sequence);
        self
    }

    /// Requires a signature that verifies under `public_key`.
    pub fn signed_by(
        mut self,
        provider: &'a mut dyn SignatureProvider,
        public_key: &'a [u8],
        algorithm: SignatureAlgorithm,
    ) -> Self {
        self.provider = Some(provider);
        self.public_key = Some(public_key);
        self.algorithm = algorithm;
        self
    }

    pub fn after(mut self, previous_packet: &'a ReplayPacket) -> Self {
        self.previous_packet = Some(previous_packet);
        self
    }
}

impl ReplayPacket {
    /// Runs the ordered checks and appends one `validate` entry to `log`.
    pub fn is_valid(&self, ctx: ValidationContext<'_>, log: &mut AuditLog) -> ValidationResult {
        let ValidationContext {
            expected_sequence,
            public_key,
            algorithm,
            previous_packet,
            provider,
        } = ctx;

        let result = self
            .check_signature(provider, public_key, algorithm)
            .and_then(|()| self.check_chain(previous_packet))
            .and_then(|()| self.check_sequence(previous_packet, expected_sequence))
            .and_then(|()| self.check_timestamp(previous_packet))
            .map_or_else(|failure| failure, |()| ValidationResult::ok());

        if !result.is_valid {
            warn!(
                sequence = self.sequence(),
                code = %result.error_code,
                reason = %result.error_message,
                "packet validation failed"
            );
        }

        let inputs: Metadata = [
            ("checked_signature", CanonicalValue::from(public_key.is_some())),
            ("packet_hash", self.hash().into()),
            (
                "previous_packet_hash",
                previous_packet.map(ReplayPacket::hash).into(),
            ),
            ("sequence", self.sequence().into()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        let outcome = CanonicalValue::map([
            ("error_code", CanonicalValue::from(result.error_code.as_str())),
            ("is_valid", result.is_valid.into()),
        ]);
        log.append(AuditRecord::new("validate", inputs, outcome));

        result
    }

    fn check_signature(
        &self,
        provider: Option<&mut dyn SignatureProvider>,
        public_key: Option<&[u8]>,
        algorithm: SignatureAlgorithm,
    ) -> Result<(), ValidationResult> {
        let Some(public_key) = public_key else {
            return Ok(());
        };
        let fail = |msg: &str| Err(ValidationResult::fail(ValidationErrorCode::InvalidSignature, msg));
        let Some(provider) = provider else {
            return fail("a public key was supplied without a signature provider");
        };
        if !self.is_signed() {
            return fail("packet is unsigned");
        }
        if !self.verify_signature(provider, public_key, algorithm) {
            return fail("signature does not verify under the supplied public key");
        }
        Ok(())
    }

    fn check_chain(&self, previous: Option<&ReplayPacket>) -> Result<(), ValidationResult> {
        let Some(previous) = previous else {
            return Ok(());
        };
        if !previous.is_signed() {
            return Err(ValidationResult::fail(
                ValidationErrorCode::InvalidChain,
                "predecessor is unsigned and cannot anchor a chain",
            ));
        }
        let expected = previous.hash();
        match self.previous_hash() {
            Some(link) if link == expected => Ok(()),
            Some(link) => Err(ValidationResult::fail(
                ValidationErrorCode::InvalidChain,
                format!("previous_hash {link} does not match predecessor hash {expected}"),
            )),
            None => Err(ValidationResult::fail(
                ValidationErrorCode::InvalidChain,
                "packet has no previous_hash but a predecessor was supplied",
            )),
        }
    }

    fn check_sequence(
        &self,
        previous: Option<&ReplayPacket>,
        expected_sequence: Option<u64>,
    ) -> Result<(), ValidationResult> {
        let fail = |msg: String| Err(ValidationResult::fail(ValidationErrorCode::InvalidSequence, msg));
        if let Some(previous) = previous {
            match previous.sequence().checked_add(1) {
                Some(next) if next == self.sequence() => {}
                Some(next) => {
                    return fail(format!("expected sequence {next}, got {}", self.sequence()));
                }
                None => return fail("predecessor sequence is already at the maximum".into()),
            }
        }
        match expected_sequence {
            Some(expected) if expected != self.sequence() => fail(format!(
                "expected sequence {expected} from context, got {}",
                self.sequence()
            )),
            _ => Ok(()),
        }
    }

    fn check_timestamp(&self, previous: Option<&ReplayPacket>) -> Result<(), ValidationResult> {
        match previous {
            Some(previous) if self.timestamp() < previous.timestamp() => {
                Err(ValidationResult::fail(
                    ValidationErrorCode::InvalidTtsTimestamp,
                    format!(
                        "timestamp {} is earlier than predecessor timestamp {}",
                        self.timestamp(),
                        previous.timestamp()
                    ),
                ))
            }
            _ => Ok(()),
        }
    }
}
