//! # Fixed-Point Numbers
//!
//! [`FixedPoint`] is an unsigned 128-bit integer scaled by `10^18`. It's the
//! only numeric type that crosses a certified boundary in Veridet: money,
//! metrics, weights, everything.
//!
//! There is deliberately no way to build one from `f32` or `f64`. Floating
//! point is where bit-identical results go to die, so the type simply has
//! no door for it. Text interchange is the 18-decimal string produced by
//! [`FixedPoint::to_decimal_string`] and nothing else.
//!
//! ## Rounding
//!
//! Every division truncates toward zero. Not banker's rounding, not
//! half-up. Reference hashes depend on this, so don't "fix" it.
//!
//! ## Wide intermediates
//!
//! `mul` and `div` go through a 256-bit intermediate (`primitive_types::U256`)
//! so an operation only fails when its *result* doesn't fit, never because
//! an intermediate product spilled past 128 bits.

use std::fmt;
use std::str::FromStr;

use primitive_types::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::{ArithmeticError, ConstructionError, DomainError};
use crate::config::{DECIMALS, SCALE};

/// An unsigned fixed-point number with 18 decimal places.
///
/// `Copy` and immutable: every operation returns a new value.
///
/// # Examples
///
/// ```
/// use veridet_core::numeric::FixedPoint;
///
/// let a: FixedPoint = "10.5".parse().unwrap();
/// let b: FixedPoint = "5.25".parse().unwrap();
/// let sum = a.checked_add(b).unwrap();
/// assert_eq!(sum.to_decimal_string(), "15.750000000000000000");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FixedPoint {
    value: u128,
}

impl FixedPoint {
    pub const ZERO: Self = Self { value: 0 };
    pub const ONE: Self = Self { value: SCALE };
    pub const MAX: Self = Self { value: u128::MAX };

    /// Wraps a raw scaled magnitude. Every `u128` is a valid raw value.
    pub const fn from_raw(value: u128) -> Self {
        Self { value }
    }

    /// The raw scaled magnitude.
    pub const fn raw(self) -> u128 {
        self.value
    }

    /// Builds a number from whole units.
    ///
    /// # Errors
    ///
    /// [`ConstructionError::OutOfRange`] when `units * 10^18` exceeds 128 bits.
    pub fn from_integer(units: u128) -> Result<Self, ConstructionError> {
        units
            .checked_mul(SCALE)
            .map(Self::from_raw)
            .ok_or_else(|| ConstructionError::OutOfRange(units.to_string()))
    }

    /// Builds a number from signed whole units, rejecting negatives.
    pub fn from_signed(units: i128) -> Result<Self, ConstructionError> {
        if units < 0 {
            return Err(ConstructionError::Negative(units.to_string()));
        }
        Self::from_integer(units.unsigned_abs())
    }

    /// Parses the decimal text form: ASCII digits with at most one `.`.
    ///
    /// Signs, exponents, whitespace, and empty integer or fraction parts are
    /// rejected. Fraction digits past the 18th must all be zero; anything
    /// else would need rounding, and we don't round on input.
    pub fn from_decimal_str(input: &str) -> Result<Self, ConstructionError> {
        if input.is_empty() {
            return Err(ConstructionError::Empty);
        }
        if input.starts_with('-') {
            return Err(ConstructionError::Negative(input.to_string()));
        }
        if let Some((position, found)) = input
            .char_indices()
            .find(|(_, c)| !(c.is_ascii_digit() || *c == '.'))
        {
            return Err(ConstructionError::InvalidCharacter { found, position });
        }

        let (int_part, frac_part) = match input.split_once('.') {
            Some((_, frac)) if frac.contains('.') => {
                return Err(ConstructionError::Malformed {
                    input: input.to_string(),
                    reason: "more than one decimal point",
                });
            }
            Some((int, frac)) => (int, frac),
            None => (input, ""),
        };
        if int_part.is_empty() {
            return Err(ConstructionError::Malformed {
                input: input.to_string(),
                reason: "missing integer digits",
            });
        }
        if input.ends_with('.') {
            return Err(ConstructionError::Malformed {
                input: input.to_string(),
                reason: "missing fractional digits",
            });
        }

        let max_decimals = DECIMALS as usize;
        let (kept, excess) = if frac_part.len() > max_decimals {
            frac_part.split_at(max_decimals)
        } else {
            (frac_part, "")
        };
        if excess.bytes().any(|b| b != b'0') {
            return Err(ConstructionError::ExcessPrecision {
                input: input.to_string(),
                max_decimals: DECIMALS,
            });
        }

        let out_of_range = || ConstructionError::OutOfRange(input.to_string());
        let whole = accumulate_digits(int_part).ok_or_else(out_of_range)?;
        let mut fraction = accumulate_digits(kept).ok_or_else(out_of_range)?;
        for _ in kept.len()..max_decimals {
            fraction *= 10;
        }

        whole
            .checked_mul(SCALE)
            .and_then(|scaled| scaled.checked_add(fraction))
            .map(Self::from_raw)
            .ok_or_else(out_of_range)
    }

    /// Renders `"<integer>.<18 digits>"`. The only textual form we emit.
    pub fn to_decimal_string(&self) -> String {
        format!(
            "{}.{:0width$}",
            self.value / SCALE,
            self.value % SCALE,
            width = DECIMALS as usize
        )
    }

    /// Whole units, truncated.
    pub const fn integer_part(self) -> u128 {
        self.value / SCALE
    }

    /// Raw value of the fractional part, in `[0, SCALE)`.
    pub const fn fractional_raw(self) -> u128 {
        self.value % SCALE
    }

    pub const fn is_zero(self) -> bool {
        self.value == 0
    }

    /// `true` when the value has no fractional part.
    pub const fn is_integral(self) -> bool {
        self.value % SCALE == 0
    }

    pub fn checked_add(self, rhs: Self) -> Result<Self, ArithmeticError> {
        self.value
            .checked_add(rhs.value)
            .map(Self::from_raw)
            .ok_or_else(|| ArithmeticError::overflow("add"))
    }

    pub fn checked_sub(self, rhs: Self) -> Result<Self, ArithmeticError> {
        self.value
            .checked_sub(rhs.value)
            .map(Self::from_raw)
            .ok_or_else(|| ArithmeticError::underflow("sub"))
    }

    /// `a * b / 10^18`, truncated. Overflow is checked after the rescale.
    pub fn checked_mul(self, rhs: Self) -> Result<Self, ArithmeticError> {
        let product = U256::from(self.value) * U256::from(rhs.value) / U256::from(SCALE);
        narrow(product)
            .map(Self::from_raw)
            .ok_or_else(|| ArithmeticError::overflow("mul"))
    }

    /// `a * 10^18 / b`, truncated. Division by zero fails before any rescale.
    pub fn checked_div(self, rhs: Self) -> Result<Self, ArithmeticError> {
        if rhs.is_zero() {
            return Err(ArithmeticError::domain("div", DomainError::DivisionByZero));
        }
        let quotient = U256::from(self.value) * U256::from(SCALE) / U256::from(rhs.value);
        narrow(quotient)
            .map(Self::from_raw)
            .ok_or_else(|| ArithmeticError::overflow("div"))
    }
}

/// Narrows a 256-bit intermediate back to `u128`, or `None` if it won't fit.
pub(crate) fn narrow(value: U256) -> Option<u128> {
    if value > U256::from(u128::MAX) {
        None
    } else {
        Some(value.low_u128())
    }
}

/// Base-10 accumulation with overflow detection. Caller guarantees ASCII digits.
fn accumulate_digits(digits: &str) -> Option<u128> {
    digits.bytes().try_fold(0u128, |acc, b| {
        acc.checked_mul(10)?.checked_add(u128::from(b - b'0'))
    })
}

impl From<u64> for FixedPoint {
    /// Whole units. `u64::MAX * 10^18` fits comfortably in 128 bits.
    fn from(units: u64) -> Self {
        Self::from_raw(u128::from(units) * SCALE)
    }
}

impl FromStr for FixedPoint {
    type Err = ConstructionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_decimal_str(s)
    }
}

impl fmt::Display for FixedPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_decimal_string())
    }
}

impl fmt::Debug for FixedPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FixedPoint({})", self.to_decimal_string())
    }
}

impl Serialize for FixedPoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_decimal_string())
    }
}

impl<'de> Deserialize<'de> for FixedPoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_decimal_str(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fp(s: &str) -> FixedPoint {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_integer_and_fraction() {
        assert_eq!(fp("1").raw(), SCALE);
        assert_eq!(fp("0.5").raw(), SCALE / 2);
        assert_eq!(fp("10.25").raw(), 10 * SCALE + SCALE / 4);
        assert_eq!(fp("0.000000000000000001").raw(), 1);
    }

    #[test]
    fn test_trailing_zeros_past_scale_are_accepted() {
        assert_eq!(fp("1.50000000000000000000000").raw(), fp("1.5").raw());
    }

    #[test]
    fn test_excess_precision_rejected() {
        let err = FixedPoint::from_decimal_str("0.0000000000000000001").unwrap_err();
        assert!(matches!(err, ConstructionError::ExcessPrecision { .. }));
    }

    #[test]
    fn test_malformed_inputs_rejected() {
        assert_eq!(FixedPoint::from_decimal_str(""), Err(ConstructionError::Empty));
        assert!(matches!(
            FixedPoint::from_decimal_str("-1"),
            Err(ConstructionError::Negative(_))
        ));
        assert!(matches!(
            FixedPoint::from_decimal_str("1e5"),
            Err(ConstructionError::InvalidCharacter { found: 'e', position: 1 })
        ));
        assert!(matches!(
            FixedPoint::from_decimal_str(" 1"),
            Err(ConstructionError::InvalidCharacter { found: ' ', position: 0 })
        ));
        assert!(matches!(
            FixedPoint::from_decimal_str("1.2.3"),
            Err(ConstructionError::Malformed { .. })
        ));
        assert!(matches!(
            FixedPoint::from_decimal_str(".5"),
            Err(ConstructionError::Malformed { .. })
        ));
        assert!(matches!(
            FixedPoint::from_decimal_str("5."),
            Err(ConstructionError::Malformed { .. })
        ));
        assert!(matches!(
            FixedPoint::from_decimal_str("+5"),
            Err(ConstructionError::InvalidCharacter { found: '+', .. })
        ));
    }

    #[test]
    fn test_out_of_range_rejected() {
        // u128::MAX / 10^18 is 340282366920938463463.374607431768211455.
        assert!(FixedPoint::from_decimal_str("340282366920938463463.374607431768211455").is_ok());
        assert!(matches!(
            FixedPoint::from_decimal_str("340282366920938463463.374607431768211456"),
            Err(ConstructionError::OutOfRange(_))
        ));
        assert!(matches!(
            FixedPoint::from_decimal_str("99999999999999999999999999999999999999999999"),
            Err(ConstructionError::OutOfRange(_))
        ));
        assert!(FixedPoint::from_integer(u128::MAX).is_err());
    }

    #[test]
    fn test_signed_construction() {
        assert_eq!(FixedPoint::from_signed(3).unwrap(), FixedPoint::from(3u64));
        assert!(matches!(
            FixedPoint::from_signed(-3),
            Err(ConstructionError::Negative(_))
        ));
    }

    #[test]
    fn test_decimal_string_always_has_eighteen_places() {
        assert_eq!(FixedPoint::ZERO.to_decimal_string(), "0.000000000000000000");
        assert_eq!(fp("42").to_decimal_string(), "42.000000000000000000");
        assert_eq!(FixedPoint::from_raw(1).to_string(), "0.000000000000000001");
    }

    #[test]
    fn test_add_sub_bounds() {
        assert_eq!(fp("10.5").checked_add(fp("5.25")).unwrap(), fp("15.75"));
        assert_eq!(
            FixedPoint::MAX.checked_add(FixedPoint::from_raw(1)),
            Err(ArithmeticError::Overflow { op: "add" })
        );
        assert_eq!(
            fp("1").checked_sub(fp("2")),
            Err(ArithmeticError::Underflow { op: "sub" })
        );
    }

    #[test]
    fn test_mul_rescales_and_truncates() {
        assert_eq!(fp("15.75").checked_mul(fp("0.5")).unwrap(), fp("7.875"));
        // 1e-18 * 0.5 truncates to zero rather than rounding up.
        assert_eq!(
            FixedPoint::from_raw(1).checked_mul(fp("0.5")).unwrap(),
            FixedPoint::ZERO
        );
    }

    #[test]
    fn test_mul_wide_intermediate_does_not_overflow_early() {
        // raw * raw exceeds 128 bits, but the rescaled result fits.
        let big = fp("100000000000000000000"); // 1e20
        let tiny = fp("0.000000000000000001");
        assert_eq!(big.checked_mul(tiny).unwrap(), fp("100"));
    }

    #[test]
    fn test_mul_overflow_after_rescale() {
        let big = fp("100000000000000000000");
        assert_eq!(
            big.checked_mul(big),
            Err(ArithmeticError::Overflow { op: "mul" })
        );
    }

    #[test]
    fn test_div_truncates() {
        let third = fp("1").checked_div(fp("3")).unwrap();
        assert_eq!(third.to_decimal_string(), "0.333333333333333333");
        let two_thirds = fp("2").checked_div(fp("3")).unwrap();
        assert_eq!(two_thirds.to_decimal_string(), "0.666666666666666666");
    }

    #[test]
    fn test_div_by_zero_is_domain_error() {
        assert_eq!(
            fp("1").checked_div(FixedPoint::ZERO),
            Err(ArithmeticError::Domain {
                op: "div",
                kind: DomainError::DivisionByZero
            })
        );
    }

    #[test]
    fn test_div_overflow() {
        assert_eq!(
            FixedPoint::MAX.checked_div(fp("0.5")),
            Err(ArithmeticError::Overflow { op: "div" })
        );
    }

    #[test]
    fn test_serde_uses_decimal_string() {
        let json = serde_json::to_string(&fp("2.5")).unwrap();
        assert_eq!(json, "\"2.500000000000000000\"");
        let back: FixedPoint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fp("2.5"));
        assert!(serde_json::from_str::<FixedPoint>("\"1.5e3\"").is_err());
    }

    proptest! {
        #[test]
        fn decimal_string_round_trips(raw in any::<u128>()) {
            let x = FixedPoint::from_raw(raw);
            let parsed = FixedPoint::from_decimal_str(&x.to_decimal_string()).unwrap();
            prop_assert_eq!(parsed.raw(), x.raw());
        }
    }
}
