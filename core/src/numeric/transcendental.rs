//! # Fixed-Iteration Transcendental Functions
//!
//! `sqrt`, `exp`, `ln`, `pow` and the golden-ratio series, computed entirely
//! in integer arithmetic over 256-bit intermediates.
//!
//! The rule that makes these deterministic: every loop runs a count taken
//! from [`ArithmeticConfig`] (or bounded by the bit-width of the input),
//! never "until it converges". A convergence test compares two values that
//! might differ by one raw unit on some exotic platform; a fixed count does
//! the same amount of work everywhere and lands on the same bits.
//!
//! Inputs are unsigned, so "negative sqrt" and "negative base with a
//! fractional exponent" can't be expressed at all. Results that would be
//! negative (`ln` of a value below one) fail with an underflow.

use primitive_types::U256;

use super::error::{ArithmeticError, DomainError};
use super::fixed::{narrow, FixedPoint};
use crate::config::{ArithmeticConfig, E_RAW, INV_PHI_RAW, LN2_RAW, SCALE};

fn wide(value: u128) -> U256 {
    U256::from(value)
}

/// Square root by integer Newton iteration on `x · 10^18`.
///
/// The start is a power of two at or above the true root, so the iterates
/// decrease monotonically; we keep the smallest one seen, which settles on
/// the floor of the root. The denominator is floored at 1.
pub fn sqrt(x: FixedPoint, config: &ArithmeticConfig) -> Result<FixedPoint, ArithmeticError> {
    let target = wide(x.raw()) * wide(SCALE);
    if target.is_zero() {
        return Ok(FixedPoint::ZERO);
    }

    let two = U256::from(2u8);
    let half_bits = (target.bits() + 1) / 2;
    let mut guess = two.pow(U256::from(half_bits as u64));

    for _ in 0..config.sqrt_iterations {
        let denominator = guess.max(U256::one());
        let next = (guess + target / denominator) / two;
        if next < guess {
            guess = next;
        }
    }

    narrow(guess)
        .map(FixedPoint::from_raw)
        .ok_or_else(|| ArithmeticError::overflow("sqrt"))
}

/// `e^x`, split as `e^⌊x⌋ · e^{frac(x)}`.
///
/// The fractional factor is a Taylor series of exactly `exp_terms` terms;
/// the integer factor is square-and-multiply over the fixed constant `e`.
pub fn exp(x: FixedPoint, config: &ArithmeticConfig) -> Result<FixedPoint, ArithmeticError> {
    let scale = wide(SCALE);
    let fraction = wide(x.fractional_raw());

    let mut term = scale;
    let mut sum = scale;
    for i in 1..=config.exp_terms {
        term = term * fraction / (U256::from(i) * scale);
        sum += term;
    }
    // sum < e · SCALE, always fits.
    let mut result = FixedPoint::from_raw(sum.low_u128());

    let mut base = FixedPoint::from_raw(E_RAW);
    let mut remaining = x.integer_part();
    while remaining > 0 {
        if remaining & 1 == 1 {
            result = result.checked_mul(base).map_err(|e| e.within("exp"))?;
        }
        remaining >>= 1;
        if remaining > 0 {
            base = base.checked_mul(base).map_err(|e| e.within("exp"))?;
        }
    }
    Ok(result)
}

/// Natural logarithm for `x ≥ 1`.
///
/// Reduces by powers of two to `m ∈ [1, 2)`, then evaluates
/// `ln m = 2 · Σ y^(2i+1) / (2i+1)` with `y = (m − 1)/(m + 1)` for exactly
/// `ln_terms` terms.
pub fn ln(x: FixedPoint, config: &ArithmeticConfig) -> Result<FixedPoint, ArithmeticError> {
    if x.is_zero() {
        return Err(ArithmeticError::domain("ln", DomainError::LogOfZero));
    }
    if x < FixedPoint::ONE {
        return Err(ArithmeticError::underflow("ln"));
    }

    // At most 128 halvings for a 128-bit input.
    let mut reduced = x.raw();
    let mut halvings: u128 = 0;
    while reduced >= 2 * SCALE {
        reduced /= 2;
        halvings += 1;
    }

    let scale = wide(SCALE);
    let m = wide(reduced);
    let y = (m - scale) * scale / (m + scale);
    let y_squared = y * y / scale;

    let mut power = y;
    let mut series = U256::zero();
    for i in 0..config.ln_terms {
        series += power / U256::from(2 * u64::from(i) + 1);
        power = power * y_squared / scale;
    }
    let ln_mantissa = series * U256::from(2u8);

    let total = wide(halvings) * wide(LN2_RAW) + ln_mantissa;
    narrow(total)
        .map(FixedPoint::from_raw)
        .ok_or_else(|| ArithmeticError::overflow("ln"))
}

/// `base^exponent`.
///
/// - `0^0` is a domain error; `0^y` is zero; `b^0` is one.
/// - Integral exponents use square-and-multiply, no logarithms involved.
/// - Fractional exponents use `exp(y · ln b)` for `b ≥ 1`, and
///   `1 / exp(y · ln(1/b))` for `b < 1`. When that denominator overflows the
///   true result is below one raw unit, so it truncates to zero.
pub fn pow(
    base: FixedPoint,
    exponent: FixedPoint,
    config: &ArithmeticConfig,
) -> Result<FixedPoint, ArithmeticError> {
    if base.is_zero() {
        if exponent.is_zero() {
            return Err(ArithmeticError::domain("pow", DomainError::ZeroToZeroPower));
        }
        return Ok(FixedPoint::ZERO);
    }
    if exponent.is_zero() {
        return Ok(FixedPoint::ONE);
    }
    if exponent.is_integral() {
        return powi(base, exponent.integer_part());
    }

    if base >= FixedPoint::ONE {
        let log = ln(base, config).map_err(|e| e.within("pow"))?;
        let scaled = exponent.checked_mul(log).map_err(|e| e.within("pow"))?;
        return exp(scaled, config).map_err(|e| e.within("pow"));
    }

    let inverse = FixedPoint::ONE
        .checked_div(base)
        .map_err(|e| e.within("pow"))?;
    let log = ln(inverse, config).map_err(|e| e.within("pow"))?;
    let scaled = match exponent.checked_mul(log) {
        Ok(scaled) => scaled,
        Err(e) if e.is_overflow() => return Ok(FixedPoint::ZERO),
        Err(e) => return Err(e.within("pow")),
    };
    match exp(scaled, config) {
        Ok(denominator) => FixedPoint::ONE
            .checked_div(denominator)
            .map_err(|e| e.within("pow")),
        Err(e) if e.is_overflow() => Ok(FixedPoint::ZERO),
        Err(e) => Err(e.within("pow")),
    }
}

/// Integer power by square-and-multiply. Loop count is the bit-length of `n`.
fn powi(base: FixedPoint, mut n: u128) -> Result<FixedPoint, ArithmeticError> {
    let mut result = FixedPoint::ONE;
    let mut square = base;
    while n > 0 {
        if n & 1 == 1 {
            result = result.checked_mul(square).map_err(|e| e.within("pow"))?;
        }
        n >>= 1;
        if n > 0 {
            square = square.checked_mul(square).map_err(|e| e.within("pow"))?;
        }
    }
    Ok(result)
}

/// Golden-ratio decay series: `Σ_{k=1..phi_terms} x · φ^{-k}`.
///
/// Each term is the previous one times `φ^{-1}`, truncated. The sum tends to
/// `x · φ` as the term count grows.
pub fn phi_series(x: FixedPoint, config: &ArithmeticConfig) -> Result<FixedPoint, ArithmeticError> {
    let scale = wide(SCALE);
    let ratio = wide(INV_PHI_RAW);

    let mut term = wide(x.raw());
    let mut sum = U256::zero();
    for _ in 0..config.phi_terms {
        term = term * ratio / scale;
        sum += term;
    }
    narrow(sum)
        .map(FixedPoint::from_raw)
        .ok_or_else(|| ArithmeticError::overflow("phi_series"))
}
