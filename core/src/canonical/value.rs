//! The value model accepted by canonicalization.
//!
//! [`CanonicalValue`] is a JSON-shaped tree with two extra leaves (byte
//! strings and fixed-point numbers) and one missing one: there is no float
//! variant. Foreign JSON passes through [`TryFrom<serde_json::Value>`], which
//! is where a stray `1.5` gets turned away.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::CanonicalError;
use crate::numeric::FixedPoint;

/// Maximum nesting accepted from foreign JSON.
pub const MAX_DEPTH: usize = 128;

/// Open, string-keyed metadata map. Keys iterate in byte order.
pub type Metadata = BTreeMap<String, CanonicalValue>;

/// An integer JSON carries exactly: anything in `i64::MIN..=u64::MAX`.
///
/// Wider values have no number form that survives a `serde_json` round trip,
/// so they are refused when the value is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CanonicalInt(i128);

impl CanonicalInt {
    pub const MIN: i128 = i64::MIN as i128;
    pub const MAX: i128 = u64::MAX as i128;

    pub fn new(n: i128) -> Result<Self, CanonicalError> {
        if (Self::MIN..=Self::MAX).contains(&n) {
            Ok(Self(n))
        } else {
            Err(CanonicalError::IntegerOutOfRange(n))
        }
    }

    pub fn get(self) -> i128 {
        self.0
    }

    fn to_json(self) -> Value {
        match i64::try_from(self.0) {
            Ok(signed) => Value::from(signed),
            // Above i64::MAX and at most u64::MAX by construction.
            Err(_) => Value::from(self.0 as u64),
        }
    }
}

impl fmt::Display for CanonicalInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for CanonicalInt {
    fn from(n: i64) -> Self {
        Self(i128::from(n))
    }
}

impl From<u64> for CanonicalInt {
    fn from(n: u64) -> Self {
        Self(i128::from(n))
    }
}

/// A value that has exactly one canonical encoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CanonicalValue {
    Null,
    Bool(bool),
    Integer(CanonicalInt),
    String(String),
    /// Encoded as a lowercase hex string.
    Bytes(Vec<u8>),
    List(Vec<CanonicalValue>),
    Map(BTreeMap<String, CanonicalValue>),
    /// Encoded as its 18-decimal string.
    Fixed(FixedPoint),
}

impl CanonicalValue {
    /// Convenience for building maps from literal pairs.
    pub fn map<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<CanonicalValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::Map(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i128> {
        match self {
            Self::Integer(n) => Some(n.get()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, CanonicalValue>> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Converts to a `serde_json::Value` with the same canonical shape.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Integer(n) => n.to_json(),
            Self::String(s) => Value::String(s.clone()),
            Self::Bytes(b) => Value::String(hex::encode(b)),
            Self::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Self::Fixed(x) => Value::String(x.to_decimal_string()),
        }
    }

    fn from_json(value: Value, depth: usize) -> Result<Self, CanonicalError> {
        if depth > MAX_DEPTH {
            return Err(CanonicalError::MaxDepthExceeded { max_depth: MAX_DEPTH });
        }
        Ok(match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Integer(i.into())
                } else if let Some(u) = n.as_u64() {
                    Self::Integer(u.into())
                } else {
                    return Err(CanonicalError::FloatNotAllowed);
                }
            }
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::List(
                items
                    .into_iter()
                    .map(|item| Self::from_json(item, depth + 1))
                    .collect::<Result<_, _>>()?,
            ),
            Value::Object(map) => Self::Map(
                map.into_iter()
                    .map(|(k, v)| Ok((k, Self::from_json(v, depth + 1)?)))
                    .collect::<Result<_, CanonicalError>>()?,
            ),
        })
    }
}

impl TryFrom<Value> for CanonicalValue {
    type Error = CanonicalError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_json(value, 0)
    }
}

impl From<bool> for CanonicalValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for CanonicalValue {
    fn from(n: i64) -> Self {
        Self::Integer(n.into())
    }
}

impl From<u64> for CanonicalValue {
    fn from(n: u64) -> Self {
        Self::Integer(n.into())
    }
}

impl From<u32> for CanonicalValue {
    fn from(n: u32) -> Self {
        Self::Integer(u64::from(n).into())
    }
}

impl From<usize> for CanonicalValue {
    fn from(n: usize) -> Self {
        // usize is at most 64 bits on every supported target.
        Self::Integer((n as u64).into())
    }
}

impl From<CanonicalInt> for CanonicalValue {
    fn from(n: CanonicalInt) -> Self {
        Self::Integer(n)
    }
}

impl TryFrom<i128> for CanonicalValue {
    type Error = CanonicalError;

    fn try_from(n: i128) -> Result<Self, Self::Error> {
        CanonicalInt::new(n).map(Self::Integer)
    }
}

impl From<&str> for CanonicalValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for CanonicalValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&[u8]> for CanonicalValue {
    fn from(b: &[u8]) -> Self {
        Self::Bytes(b.to_vec())
    }
}

impl From<Vec<u8>> for CanonicalValue {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

impl From<FixedPoint> for CanonicalValue {
    fn from(x: FixedPoint) -> Self {
        Self::Fixed(x)
    }
}

impl From<Vec<CanonicalValue>> for CanonicalValue {
    fn from(items: Vec<CanonicalValue>) -> Self {
        Self::List(items)
    }
}

impl From<Metadata> for CanonicalValue {
    fn from(map: Metadata) -> Self {
        Self::Map(map)
    }
}

impl<T: Into<CanonicalValue>> From<Option<T>> for CanonicalValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl Serialize for CanonicalValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CanonicalValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::try_from(value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_float_rejected_at_boundary() {
        assert_eq!(
            CanonicalValue::try_from(json!({"weight": 0.5})),
            Err(CanonicalError::FloatNotAllowed)
        );
        assert_eq!(
            CanonicalValue::try_from(json!([1, 2, [3, 4.0]])),
            Err(CanonicalError::FloatNotAllowed)
        );
    }

    #[test]
    fn test_integers_accepted() {
        let value = CanonicalValue::try_from(json!({"n": -5, "big": u64::MAX})).unwrap();
        let map = value.as_map().unwrap();
        assert_eq!(map["n"].as_integer(), Some(-5));
        assert_eq!(map["big"].as_integer(), Some(i128::from(u64::MAX)));
    }

    #[test]
    fn test_integer_range_is_json_exact() {
        assert_eq!(
            CanonicalValue::try_from(1i128 << 70),
            Err(CanonicalError::IntegerOutOfRange(1i128 << 70))
        );
        assert!(CanonicalValue::try_from(i128::from(i64::MIN) - 1).is_err());
        assert!(CanonicalInt::new(CanonicalInt::MAX + 1).is_err());

        let edges = CanonicalValue::map([
            ("hi", CanonicalValue::try_from(CanonicalInt::MAX).unwrap()),
            ("lo", CanonicalValue::try_from(CanonicalInt::MIN).unwrap()),
        ]);
        let json = serde_json::to_string(&edges).unwrap();
        assert_eq!(json, r#"{"hi":18446744073709551615,"lo":-9223372036854775808}"#);
        let back: CanonicalValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, edges);
    }

    #[test]
    fn test_depth_limit() {
        let mut nested = json!(0);
        for _ in 0..(MAX_DEPTH + 2) {
            nested = json!([nested]);
        }
        assert!(matches!(
            CanonicalValue::try_from(nested),
            Err(CanonicalError::MaxDepthExceeded { .. })
        ));
    }

    #[test]
    fn test_bytes_and_fixed_become_strings_in_json() {
        let value = CanonicalValue::map([
            ("key", CanonicalValue::from(vec![0xde_u8, 0xad])),
            ("amount", CanonicalValue::from(FixedPoint::ONE)),
        ]);
        assert_eq!(
            value.to_json(),
            json!({"key": "dead", "amount": "1.000000000000000000"})
        );
    }

    #[test]
    fn test_option_maps_to_null() {
        assert_eq!(CanonicalValue::from(None::<String>), CanonicalValue::Null);
        assert_eq!(
            CanonicalValue::from(Some("cid")),
            CanonicalValue::String("cid".into())
        );
    }

    #[test]
    fn test_deserialize_rejects_float() {
        assert!(serde_json::from_str::<CanonicalValue>(r#"{"x":1.25}"#).is_err());
        let ok: CanonicalValue = serde_json::from_str(r#"{"x":[true,null,"s"]}"#).unwrap();
        assert!(ok.as_map().is_some());
    }
}
