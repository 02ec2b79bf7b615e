//! In-memory chain of accepted packets.

use super::{PacketFields, ReplayPacket};
use crate::audit::AuditLog;
use crate::canonical::Metadata;
use crate::crypto::{SignatureAlgorithm, SignatureProvider};

use super::validation::{ValidationContext, ValidationResult};

/// Ordered list of packets from a single signer, each validated against
/// the tip before it was accepted.
#[derive(Debug, Clone)]
pub struct PacketChain {
    packets: Vec<ReplayPacket>,
    public_key: Vec<u8>,
    algorithm: SignatureAlgorithm,
    genesis_sequence: u64,
}

impl PacketChain {
    /// An empty chain whose first packet must carry sequence 0.
    pub fn new(public_key: Vec<u8>, algorithm: SignatureAlgorithm) -> Self {
        Self::starting_at(public_key, algorithm, 0)
    }

    pub fn starting_at(public_key: Vec<u8>, algorithm: SignatureAlgorithm, genesis_sequence: u64) -> Self {
        Self {
            packets: Vec::new(),
            public_key,
            algorithm,
            genesis_sequence,
        }
    }

    /// Validates `packet` against the tip and appends it on success.
    ///
    /// A rejected packet is dropped; the result says why. Either way one
    /// `validate` entry lands in `log`.
    pub fn append(
        &mut self,
        packet: ReplayPacket,
        provider: &mut dyn SignatureProvider,
        log: &mut AuditLog,
    ) -> ValidationResult {
        let mut ctx = ValidationContext::new().signed_by(provider, &self.public_key, self.algorithm);
        ctx = match self.packets.last() {
            Some(tip) => ctx.after(tip),
            None => ctx.expect_sequence(self.genesis_sequence),
        };
        let result = packet.is_valid(ctx, log);
        if result.is_valid {
            self.packets.push(packet);
        }
        result
    }

    /// Fields for the next packet: sequence and link filled in from the tip.
    ///
    /// `None` once the tip sits at `u64::MAX`; no successor can validate.
    pub fn next_fields(
        &self,
        timestamp: u64,
        seed: impl Into<String>,
        metadata: Option<Metadata>,
    ) -> Option<PacketFields> {
        let sequence = match self.tip() {
            Some(tip) => tip.sequence().checked_add(1)?,
            None => self.genesis_sequence,
        };
        Some(PacketFields {
            timestamp,
            sequence,
            seed: seed.into(),
            metadata,
            previous_hash: self.tip_hash(),
        })
    }

    /// Returns the latest packet, if any.
    pub fn tip(&self) -> Option<&ReplayPacket> {
        self.packets.last()
    }

    pub fn tip_hash(&self) -> Option<String> {
        self.tip().map(ReplayPacket::hash)
    }

    /// Returns the chain height (number of packets).
    pub fn height(&self) -> u64 {
        self.packets.len() as u64
    }

    pub fn packets(&self) -> &[ReplayPacket] {
        &self.packets
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::MockSignatureProvider;
    use crate::packet::ValidationErrorCode;

    const ALG: SignatureAlgorithm = SignatureAlgorithm::MlDsa65;

    #[test]
    fn builds_and_rejects() {
        let mut provider = MockSignatureProvider::new();
        let key = provider.generate_keypair(b"chain-owner-seed-1234", ALG).unwrap();
        let mut log = AuditLog::new();
        let mut chain = PacketChain::new(key.public_key().to_vec(), ALG);

        for t in 0..3u64 {
            let mut packet = ReplayPacket::new(chain.next_fields(100 + t, "seed", None).unwrap()).unwrap();
            packet
                .sign(&mut provider, key.private_key(), ALG, &mut log)
                .unwrap();
            assert!(chain.append(packet, &mut provider, &mut log).is_valid);
        }
        assert_eq!(chain.height(), 3);
        assert_eq!(chain.tip().map(ReplayPacket::sequence), Some(2));

        // Replaying the tip's own fields is a sequence violation.
        let mut replay = ReplayPacket::new(PacketFields {
            sequence: 2,
            ..chain.next_fields(200, "seed", None).unwrap()
        })
        .unwrap();
        replay
            .sign(&mut provider, key.private_key(), ALG, &mut log)
            .unwrap();
        let result = chain.append(replay, &mut provider, &mut log);
        assert_eq!(result.error_code, ValidationErrorCode::InvalidSequence);
        assert_eq!(chain.height(), 3);
    }

    #[test]
    fn unsigned_packet_never_enters() {
        let mut provider = MockSignatureProvider::new();
        let key = provider.generate_keypair(b"chain-owner-seed-1234", ALG).unwrap();
        let mut log = AuditLog::new();
        let mut chain = PacketChain::starting_at(key.public_key().to_vec(), ALG, 10);

        let packet = ReplayPacket::new(chain.next_fields(1, "seed", None).unwrap()).unwrap();
        assert_eq!(packet.sequence(), 10);
        let result = chain.append(packet, &mut provider, &mut log);
        assert_eq!(result.error_code, ValidationErrorCode::InvalidSignature);
        assert!(chain.is_empty());
    }

    #[test]
    fn no_successor_after_maximum_sequence() {
        let mut provider = MockSignatureProvider::new();
        let key = provider.generate_keypair(b"chain-owner-seed-1234", ALG).unwrap();
        let mut log = AuditLog::new();
        let mut chain = PacketChain::starting_at(key.public_key().to_vec(), ALG, u64::MAX);

        let mut last = ReplayPacket::new(chain.next_fields(1, "seed", None).unwrap()).unwrap();
        last.sign(&mut provider, key.private_key(), ALG, &mut log).unwrap();
        assert!(chain.append(last, &mut provider, &mut log).is_valid);
        assert_eq!(chain.next_fields(2, "seed", None), None);
    }
}
