//! Error types for fixed-point construction and arithmetic.
//!
//! Construction failures happen before a number exists; arithmetic failures
//! happen when an operation's true result can't be represented. Both carry
//! enough context to be reproduced exactly, and both are deterministic
//! functions of their inputs.

use thiserror::Error;

/// Malformed or out-of-range input to a `FixedPoint` constructor.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConstructionError {
    #[error("empty decimal string")]
    Empty,

    #[error("invalid character {found:?} at byte {position} in decimal string")]
    InvalidCharacter { found: char, position: usize },

    #[error("malformed decimal string {input:?}: {reason}")]
    Malformed { input: String, reason: &'static str },

    #[error("negative values are not representable: {0}")]
    Negative(String),

    #[error("{input} has non-zero digits beyond {max_decimals} decimal places")]
    ExcessPrecision { input: String, max_decimals: u32 },

    #[error("{0} exceeds the 128-bit fixed-point range")]
    OutOfRange(String),
}

/// Mathematically undefined (or unrepresentable-by-definition) inputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("logarithm of zero")]
    LogOfZero,

    #[error("zero raised to the zero power")]
    ZeroToZeroPower,
}

/// Failure of a fixed-point operation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ArithmeticError {
    #[error("arithmetic overflow in {op}")]
    Overflow { op: &'static str },

    #[error("arithmetic underflow in {op}")]
    Underflow { op: &'static str },

    #[error("domain error in {op}: {kind}")]
    Domain { op: &'static str, kind: DomainError },
}

impl ArithmeticError {
    pub(crate) fn overflow(op: &'static str) -> Self {
        Self::Overflow { op }
    }

    pub(crate) fn underflow(op: &'static str) -> Self {
        Self::Underflow { op }
    }

    pub(crate) fn domain(op: &'static str, kind: DomainError) -> Self {
        Self::Domain { op, kind }
    }

    /// Re-attributes an error raised by an inner step to the outer
    /// operation the caller actually invoked.
    pub(crate) fn within(self, op: &'static str) -> Self {
        match self {
            Self::Overflow { .. } => Self::Overflow { op },
            Self::Underflow { .. } => Self::Underflow { op },
            Self::Domain { kind, .. } => Self::Domain { op, kind },
        }
    }

    /// Name of the operation that failed.
    pub fn op(&self) -> &'static str {
        match self {
            Self::Overflow { op } | Self::Underflow { op } | Self::Domain { op, .. } => op,
        }
    }

    pub fn is_overflow(&self) -> bool {
        matches!(self, Self::Overflow { .. })
    }
}
