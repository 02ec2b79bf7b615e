//! # Certified Arithmetic
//!
//! The audited front door to the fixed-point engine. Every successful call
//! appends exactly one entry to a log the caller owns; every failed call
//! appends nothing.
//!
//! The engine never owns a log. It borrows one for as long as it lives:
//!
//! ```
//! use veridet_core::audit::AuditLog;
//! use veridet_core::certified::CertifiedArithmetic;
//! use veridet_core::numeric::FixedPoint;
//!
//! let mut log = AuditLog::new();
//! let mut engine = CertifiedArithmetic::new(&mut log);
//! let two = FixedPoint::from(2u64);
//! let four = engine.mul(two, two).unwrap();
//! assert_eq!(four.to_decimal_string(), "4.000000000000000000");
//! assert!(engine.div(four, FixedPoint::ZERO).is_err());
//! drop(engine);
//!
//! assert_eq!(log.len(), 1);
//! ```

use std::path::Path;

use crate::audit::{AuditError, AuditLog, AuditRecord};
use crate::canonical::{CanonicalValue, Metadata};
use crate::config::{ArithmeticConfig, ConfigError};
use crate::numeric::transcendental;
use crate::numeric::{ArithmeticError, FixedPoint};

/// Fixed-point operations that leave an audit trail.
#[derive(Debug)]
pub struct CertifiedArithmetic<'log> {
    log: &'log mut AuditLog,
    config: ArithmeticConfig,
    pqc_cid: Option<String>,
    quantum_metadata: Option<Metadata>,
}

impl<'log> CertifiedArithmetic<'log> {
    pub fn new(log: &'log mut AuditLog) -> Self {
        Self {
            log,
            config: ArithmeticConfig::default(),
            pqc_cid: None,
            quantum_metadata: None,
        }
    }

    /// Iteration counts for the transcendental functions. Two engines only
    /// agree bit-for-bit when they share this.
    ///
    /// # Errors
    ///
    /// [`ConfigError::IterationsOutOfRange`] when any count is zero or above
    /// [`MAX_ITERATIONS`](crate::config::MAX_ITERATIONS).
    pub fn with_config(mut self, config: ArithmeticConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// Correlation id stamped onto every entry this engine writes.
    pub fn with_pqc_cid(mut self, pqc_cid: impl Into<String>) -> Self {
        self.pqc_cid = Some(pqc_cid.into());
        self
    }

    pub fn with_quantum_metadata(mut self, quantum_metadata: Metadata) -> Self {
        self.quantum_metadata = Some(quantum_metadata);
        self
    }

    pub fn config(&self) -> &ArithmeticConfig {
        &self.config
    }

    pub fn log(&self) -> &AuditLog {
        self.log
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    pub fn add(&mut self, a: FixedPoint, b: FixedPoint) -> Result<FixedPoint, ArithmeticError> {
        let result = a.checked_add(b)?;
        Ok(self.record("add", [("a", a), ("b", b)], result))
    }

    pub fn sub(&mut self, a: FixedPoint, b: FixedPoint) -> Result<FixedPoint, ArithmeticError> {
        let result = a.checked_sub(b)?;
        Ok(self.record("sub", [("a", a), ("b", b)], result))
    }

    pub fn mul(&mut self, a: FixedPoint, b: FixedPoint) -> Result<FixedPoint, ArithmeticError> {
        let result = a.checked_mul(b)?;
        Ok(self.record("mul", [("a", a), ("b", b)], result))
    }

    pub fn div(&mut self, a: FixedPoint, b: FixedPoint) -> Result<FixedPoint, ArithmeticError> {
        let result = a.checked_div(b)?;
        Ok(self.record("div", [("a", a), ("b", b)], result))
    }

    pub fn sqrt(&mut self, x: FixedPoint) -> Result<FixedPoint, ArithmeticError> {
        let result = transcendental::sqrt(x, &self.config)?;
        Ok(self.record("sqrt", [("x", x)], result))
    }

    pub fn exp(&mut self, x: FixedPoint) -> Result<FixedPoint, ArithmeticError> {
        let result = transcendental::exp(x, &self.config)?;
        Ok(self.record("exp", [("x", x)], result))
    }

    pub fn ln(&mut self, x: FixedPoint) -> Result<FixedPoint, ArithmeticError> {
        let result = transcendental::ln(x, &self.config)?;
        Ok(self.record("ln", [("x", x)], result))
    }

    pub fn pow(
        &mut self,
        base: FixedPoint,
        exponent: FixedPoint,
    ) -> Result<FixedPoint, ArithmeticError> {
        let result = transcendental::pow(base, exponent, &self.config)?;
        Ok(self.record("pow", [("base", base), ("exponent", exponent)], result))
    }

    pub fn phi_series(&mut self, x: FixedPoint) -> Result<FixedPoint, ArithmeticError> {
        let result = transcendental::phi_series(x, &self.config)?;
        Ok(self.record("phi_series", [("x", x)], result))
    }

    // -----------------------------------------------------------------------
    // Log access
    // -----------------------------------------------------------------------

    /// SHA-256 hex of the canonical log.
    pub fn get_log_hash(&self) -> String {
        self.log.log_hash()
    }

    /// Writes the canonical log to `path` for offline replay comparison.
    pub fn export_log(&self, path: impl AsRef<Path>) -> Result<(), AuditError> {
        self.log.export(path)
    }

    fn record<const N: usize>(
        &mut self,
        op: &'static str,
        inputs: [(&'static str, FixedPoint); N],
        result: FixedPoint,
    ) -> FixedPoint {
        let inputs: Metadata = inputs
            .into_iter()
            .map(|(name, value)| (name.to_string(), CanonicalValue::Fixed(value)))
            .collect();
        let record = AuditRecord::new(op, inputs, CanonicalValue::Fixed(result))
            .with_pqc_cid(self.pqc_cid.clone())
            .with_quantum_metadata(self.quantum_metadata.clone());
        self.log.append(record);
        result
    }
}
