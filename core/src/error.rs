//! Crate-level error type.
//!
//! Each module owns its error enum. [`CoreError`] exists for callers that
//! drive several modules and want one `?`-compatible type.

use thiserror::Error;

use crate::audit::AuditError;
use crate::canonical::CanonicalError;
use crate::config::ConfigError;
use crate::crypto::{KeyError, ProviderError};
use crate::numeric::{ArithmeticError, ConstructionError};
use crate::packet::PacketError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Construction(#[from] ConstructionError),

    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),

    #[error(transparent)]
    Canonical(#[from] CanonicalError),

    #[error(transparent)]
    Audit(#[from] AuditError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Packet(#[from] PacketError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Shorthand used across the crate's public helpers.
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::FixedPoint;

    fn parse_and_divide(a: &str, b: &str) -> Result<FixedPoint> {
        let a: FixedPoint = a.parse()?;
        let b: FixedPoint = b.parse()?;
        Ok(a.checked_div(b)?)
    }

    #[test]
    fn question_mark_lifts_module_errors() {
        assert!(matches!(
            parse_and_divide("-1", "2"),
            Err(CoreError::Construction(ConstructionError::Negative(_)))
        ));
        assert!(matches!(
            parse_and_divide("1", "0"),
            Err(CoreError::Arithmetic(ArithmeticError::Domain { .. }))
        ));
        assert_eq!(
            parse_and_divide("1", "4").unwrap().to_decimal_string(),
            "0.250000000000000000"
        );
    }

    #[test]
    fn messages_pass_through() {
        let err = CoreError::from(PacketError::EmptySeed);
        assert_eq!(err.to_string(), "seed must not be empty");
    }
}
