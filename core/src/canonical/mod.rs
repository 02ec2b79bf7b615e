//! # Canonical Encoding
//!
//! One byte-exact serialization rule for everything that gets hashed:
//! operation logs, provider logs, replay packets. Two implementations that
//! disagree on a single byte here disagree on every hash downstream, so the
//! rule is small and strict:
//!
//! 1. Object keys sorted lexicographically by byte.
//! 2. No whitespace between tokens.
//! 3. Integers in plain decimal, within `i64::MIN..=u64::MAX`; no floats,
//!    ever.
//! 4. Strings use the minimal RFC 8785 escaping.
//! 5. Byte strings as lowercase hex, fixed-point as its 18-decimal string.
//!
//! The emitter mirrors RFC 8785 (JCS) restricted to integers.
//!
//! # Example
//!
//! ```
//! use veridet_core::canonical::{canonicalize_json, CanonicalError};
//!
//! assert_eq!(canonicalize_json(r#"{ "b": 1, "a": 2 }"#).unwrap(), r#"{"a":2,"b":1}"#);
//! assert_eq!(canonicalize_json(r#"{"x": 1.5}"#), Err(CanonicalError::FloatNotAllowed));
//! ```

pub mod value;

use std::fmt::Write as _;

use thiserror::Error;

use crate::crypto::hash::{sha256_hex, sha512_hex};
use crate::numeric::FixedPoint;

pub use value::{CanonicalInt, CanonicalValue, Metadata, MAX_DEPTH};

/// Errors raised while bringing foreign data into canonical form.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CanonicalError {
    #[error("float not allowed: canonical form requires integer-only numbers")]
    FloatNotAllowed,

    #[error("integer {0} is outside the JSON-exact range i64::MIN..=u64::MAX")]
    IntegerOutOfRange(i128),

    #[error("max depth exceeded: nested deeper than {max_depth} levels")]
    MaxDepthExceeded { max_depth: usize },

    #[error("JSON parse error: {0}")]
    Parse(String),
}

/// Types with a single canonical representation.
///
/// Implementors describe themselves as a [`CanonicalValue`]; encoding and
/// hashing come for free and are identical for every implementor.
pub trait Canonicalize {
    fn to_canonical_value(&self) -> CanonicalValue;

    fn to_canonical_string(&self) -> String {
        encode(&self.to_canonical_value())
    }

    fn to_canonical_bytes(&self) -> Vec<u8> {
        self.to_canonical_string().into_bytes()
    }
}

impl Canonicalize for CanonicalValue {
    fn to_canonical_value(&self) -> CanonicalValue {
        self.clone()
    }
}

impl Canonicalize for Metadata {
    fn to_canonical_value(&self) -> CanonicalValue {
        CanonicalValue::Map(self.clone())
    }
}

impl Canonicalize for FixedPoint {
    fn to_canonical_value(&self) -> CanonicalValue {
        CanonicalValue::Fixed(*self)
    }
}

/// SHA-256 (64 hex chars) of the canonical form. Used for logs and packets.
pub fn canonical_hash<T: Canonicalize + ?Sized>(value: &T) -> String {
    sha256_hex(&value.to_canonical_bytes())
}

/// SHA-512 (128 hex chars) of the canonical form, for higher subsystems that
/// key content by the wide digest. Don't mix this up with [`canonical_hash`].
pub fn canonical_digest_512<T: Canonicalize + ?Sized>(value: &T) -> String {
    sha512_hex(&value.to_canonical_bytes())
}

/// Parses arbitrary JSON text and re-emits it canonically.
///
/// # Errors
///
/// Fails on malformed JSON, any non-integer number, or excessive nesting.
pub fn canonicalize_json(input: &str) -> Result<String, CanonicalError> {
    let parsed: serde_json::Value =
        serde_json::from_str(input).map_err(|e| CanonicalError::Parse(e.to_string()))?;
    let value = CanonicalValue::try_from(parsed)?;
    Ok(encode(&value))
}

/// Encodes a value in canonical form.
pub fn encode(value: &CanonicalValue) -> String {
    let mut output = String::new();
    emit_value(value, &mut output);
    output
}

fn emit_value(value: &CanonicalValue, output: &mut String) {
    match value {
        CanonicalValue::Null => output.push_str("null"),
        CanonicalValue::Bool(b) => output.push_str(if *b { "true" } else { "false" }),
        CanonicalValue::Integer(n) => {
            let _ = write!(output, "{n}");
        }
        CanonicalValue::String(s) => emit_string(s, output),
        CanonicalValue::Bytes(bytes) => emit_string(&hex::encode(bytes), output),
        CanonicalValue::List(items) => {
            output.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    output.push(',');
                }
                emit_value(item, output);
            }
            output.push(']');
        }
        CanonicalValue::Map(map) => {
            // BTreeMap<String, _> iterates in byte order already.
            output.push('{');
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    output.push(',');
                }
                emit_string(key, output);
                output.push(':');
                emit_value(item, output);
            }
            output.push('}');
        }
        CanonicalValue::Fixed(x) => emit_string(&x.to_decimal_string(), output),
    }
}

fn emit_string(s: &str, output: &mut String) {
    output.push('"');
    for c in s.chars() {
        match c {
            '"' => output.push_str("\\\""),
            '\\' => output.push_str("\\\\"),
            '\u{0008}' => output.push_str("\\b"),
            '\u{000C}' => output.push_str("\\f"),
            '\n' => output.push_str("\\n"),
            '\r' => output.push_str("\\r"),
            '\t' => output.push_str("\\t"),
            c if ('\u{0000}'..='\u{001F}').contains(&c) => {
                let _ = write!(output, "\\u{:04x}", c as u32);
            }
            c => output.push(c),
        }
    }
    output.push('"');
}
