//! # Audit Log
//!
//! The append-only, hash-chained record shared by every certified
//! subsystem: the arithmetic engine, the signature providers, and replay
//! packets all write into an [`AuditLog`] the caller owns.
//!
//! ```text
//!  entry 0                 entry 1                 entry 2
//! ┌──────────────────┐    ┌──────────────────┐    ┌──────────────────┐
//! │ prev = 000…000   │ ┌─▶│ prev = h0        │ ┌─▶│ prev = h1        │
//! │ hash = h0 ───────┼─┘  │ hash = h1 ───────┼─┘  │ hash = h2        │
//! └──────────────────┘    └──────────────────┘    └──────────────────┘
//! ```
//!
//! ## Ownership
//!
//! There is no global log. Whoever needs a record passes `&mut AuditLog`
//! into the call that should be recorded. The borrow checker then enforces
//! the single-writer rule: sharing a log across threads means wrapping it in
//! a lock yourself, or giving each thread its own log and comparing digests.
//!
//! ## Failures leave no trace
//!
//! Nothing calls [`AuditLog::append`] until an operation has succeeded.
//! Two replays that both attempt and fail the same bad operation end with
//! identical logs and identical digests.

pub mod entry;

use std::path::Path;

use thiserror::Error;
use tracing::debug;

use crate::canonical::{canonical_hash, CanonicalError, CanonicalValue, Canonicalize};
use crate::config::ZERO_HASH;

pub use entry::{AuditLogEntry, AuditRecord};

/// Errors from log verification, export, and import.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("audit log I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("audit log is not valid canonical JSON: {0}")]
    Parse(String),

    #[error(transparent)]
    Canonical(#[from] CanonicalError),

    #[error("entry at position {position} has log_index {found}")]
    IndexMismatch { position: usize, found: u64 },

    #[error("entry {index} does not link to its predecessor")]
    BrokenLink { index: u64 },

    #[error("entry {index} hash does not match its content")]
    HashMismatch { index: u64 },
}

/// Append-only hash-chained log.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuditLog {
    entries: Vec<AuditLogEntry>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seals `record` onto the end of the chain and returns the new entry.
    pub fn append(&mut self, record: AuditRecord) -> &AuditLogEntry {
        let log_index = self.entries.len() as u64;
        let prev_hash = self.last_hash().to_string();
        let entry = AuditLogEntry::seal(log_index, prev_hash, record);
        debug!(
            log_index,
            op = entry.op_name(),
            entry_hash = entry.entry_hash(),
            "audit entry appended"
        );
        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[AuditLogEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&AuditLogEntry> {
        self.entries.get(index)
    }

    pub fn last(&self) -> Option<&AuditLogEntry> {
        self.entries.last()
    }

    /// Hash the next entry will link to: the tip's hash, or [`ZERO_HASH`].
    pub fn last_hash(&self) -> &str {
        self.entries
            .last()
            .map_or(ZERO_HASH, AuditLogEntry::entry_hash)
    }

    /// SHA-256 of the canonical log, 64 lowercase hex characters.
    ///
    /// Identical content gives an identical digest on any machine.
    pub fn log_hash(&self) -> String {
        canonical_hash(self)
    }

    /// Walks the chain checking indices, links, and content hashes.
    ///
    /// # Errors
    ///
    /// Reports the first inconsistency found, in index order.
    pub fn verify_chain(&self) -> Result<(), AuditError> {
        let mut expected_prev = ZERO_HASH;
        for (position, entry) in self.entries.iter().enumerate() {
            if entry.log_index() != position as u64 {
                return Err(AuditError::IndexMismatch {
                    position,
                    found: entry.log_index(),
                });
            }
            if entry.prev_hash() != expected_prev {
                return Err(AuditError::BrokenLink {
                    index: entry.log_index(),
                });
            }
            if entry.compute_hash() != entry.entry_hash() {
                return Err(AuditError::HashMismatch {
                    index: entry.log_index(),
                });
            }
            expected_prev = entry.entry_hash();
        }
        Ok(())
    }

    /// The canonical JSON array used for both hashing and export.
    pub fn to_canonical_json(&self) -> String {
        self.to_canonical_string()
    }

    /// Rebuilds a log from its canonical JSON and verifies the chain.
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON, float values anywhere, or a broken chain.
    pub fn from_canonical_json(input: &str) -> Result<Self, AuditError> {
        let entries: Vec<AuditLogEntry> =
            serde_json::from_str(input).map_err(|e| AuditError::Parse(e.to_string()))?;
        let log = Self { entries };
        log.verify_chain()?;
        Ok(log)
    }

    /// Writes the canonical log to `path`. The only durable checkpoint.
    pub fn export(&self, path: impl AsRef<Path>) -> Result<(), AuditError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_canonical_json())?;
        debug!(
            path = %path.display(),
            entries = self.len(),
            "audit log exported"
        );
        Ok(())
    }

    /// Reads a log written by [`export`](Self::export) and verifies it.
    pub fn import(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_canonical_json(&text)
    }
}

impl Canonicalize for AuditLog {
    fn to_canonical_value(&self) -> CanonicalValue {
        // Entries are stored in log_index order, which is the required order.
        CanonicalValue::List(
            self.entries
                .iter()
                .map(Canonicalize::to_canonical_value)
                .collect(),
        )
    }
}
