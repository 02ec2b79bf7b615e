//! # Deterministic Numerics
//!
//! The fixed-point number type and the integer-only math built on it.
//!
//! ```text
//! fixed.rs            FixedPoint: construction, text form, add/sub/mul/div
//! transcendental.rs   sqrt, exp, ln, pow, phi_series (fixed iteration counts)
//! error.rs            ConstructionError, ArithmeticError, DomainError
//! ```
//!
//! Nothing in here knows about audit logs. [`crate::certified`] wraps these
//! functions and records what they did.

pub mod error;
pub mod fixed;
pub mod transcendental;

pub use error::{ArithmeticError, ConstructionError, DomainError};
pub use fixed::FixedPoint;
