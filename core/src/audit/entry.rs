//! A single audit-log entry and the record it is built from.

use serde::{Deserialize, Serialize};

use crate::canonical::{canonical_hash, CanonicalValue, Canonicalize, Metadata};

/// What a caller hands to [`AuditLog::append`](super::AuditLog::append).
///
/// Index and hashes are assigned by the log, never by the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditRecord {
    pub op_name: String,
    pub inputs: Metadata,
    pub result: CanonicalValue,
    pub pqc_cid: Option<String>,
    pub quantum_metadata: Option<Metadata>,
}

impl AuditRecord {
    pub fn new(op_name: impl Into<String>, inputs: Metadata, result: CanonicalValue) -> Self {
        Self {
            op_name: op_name.into(),
            inputs,
            result,
            pqc_cid: None,
            quantum_metadata: None,
        }
    }

    pub fn with_pqc_cid(mut self, pqc_cid: Option<String>) -> Self {
        self.pqc_cid = pqc_cid;
        self
    }

    pub fn with_quantum_metadata(mut self, quantum_metadata: Option<Metadata>) -> Self {
        self.quantum_metadata = quantum_metadata;
        self
    }
}

/// One link of the chain.
///
/// `entry_hash` is the SHA-256 of the canonical form of every other field,
/// `prev_hash` included, so rewriting any earlier entry breaks every later
/// link.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    log_index: u64,
    op_name: String,
    inputs: Metadata,
    result: CanonicalValue,
    pqc_cid: Option<String>,
    quantum_metadata: Option<Metadata>,
    entry_hash: String,
    prev_hash: String,
}

impl AuditLogEntry {
    pub(crate) fn seal(log_index: u64, prev_hash: String, record: AuditRecord) -> Self {
        let mut entry = Self {
            log_index,
            op_name: record.op_name,
            inputs: record.inputs,
            result: record.result,
            pqc_cid: record.pqc_cid,
            quantum_metadata: record.quantum_metadata,
            entry_hash: String::new(),
            prev_hash,
        };
        entry.entry_hash = entry.compute_hash();
        entry
    }

    /// Recomputes the hash from content. Equal to `entry_hash()` unless the
    /// entry was tampered with after sealing.
    pub fn compute_hash(&self) -> String {
        canonical_hash(&self.content_value())
    }

    fn content_value(&self) -> CanonicalValue {
        CanonicalValue::map([
            ("inputs", CanonicalValue::Map(self.inputs.clone())),
            ("log_index", CanonicalValue::from(self.log_index)),
            ("op_name", CanonicalValue::from(self.op_name.as_str())),
            ("pqc_cid", CanonicalValue::from(self.pqc_cid.clone())),
            ("prev_hash", CanonicalValue::from(self.prev_hash.as_str())),
            (
                "quantum_metadata",
                CanonicalValue::from(self.quantum_metadata.clone()),
            ),
            ("result", self.result.clone()),
        ])
    }

    pub fn log_index(&self) -> u64 {
        self.log_index
    }

    pub fn op_name(&self) -> &str {
        &self.op_name
    }

    pub fn inputs(&self) -> &Metadata {
        &self.inputs
    }

    pub fn result(&self) -> &CanonicalValue {
        &self.result
    }

    pub fn pqc_cid(&self) -> Option<&str> {
        self.pqc_cid.as_deref()
    }

    pub fn quantum_metadata(&self) -> Option<&Metadata> {
        self.quantum_metadata.as_ref()
    }

    pub fn entry_hash(&self) -> &str {
        &self.entry_hash
    }

    pub fn prev_hash(&self) -> &str {
        &self.prev_hash
    }
}

impl Canonicalize for AuditLogEntry {
    fn to_canonical_value(&self) -> CanonicalValue {
        let mut value = self.content_value();
        if let CanonicalValue::Map(map) = &mut value {
            map.insert(
                "entry_hash".to_string(),
                CanonicalValue::from(self.entry_hash.as_str()),
            );
        }
        value
    }
}
