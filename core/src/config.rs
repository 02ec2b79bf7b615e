//! # Core Configuration & Constants
//!
//! Every magic number in Veridet lives here. If you're hardcoding a constant
//! somewhere else, you're doing it wrong and you owe the team coffee.
//!
//! Most of these values feed directly into hashes. Changing one after logs
//! have been exported means old logs no longer replay to the same digest,
//! which is the one thing this crate exists to prevent. Choose wisely.
//!
//! Runtime-tunable knobs (iteration counts, signature backend) live in
//! [`ArithmeticConfig`], [`ProviderConfig`] and the umbrella [`CoreConfig`].
//! They are plain data: two processes with the same config produce the same
//! bytes, no matter the hardware underneath.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Fixed-Point Parameters
// ---------------------------------------------------------------------------

/// Number of fractional decimal digits carried by a fixed-point number.
pub const DECIMALS: u32 = 18;

/// The fixed-point scale, `10^18`. One whole unit is `SCALE` raw units.
pub const SCALE: u128 = 1_000_000_000_000_000_000;

/// Euler's number truncated to 18 decimals: 2.718281828459045235.
pub const E_RAW: u128 = 2_718_281_828_459_045_235;

/// Natural log of two truncated to 18 decimals: 0.693147180559945309.
pub const LN2_RAW: u128 = 693_147_180_559_945_309;

/// Reciprocal of the golden ratio (`φ − 1`) truncated to 18 decimals.
pub const INV_PHI_RAW: u128 = 618_033_988_749_894_848;

// ---------------------------------------------------------------------------
// Iteration Budgets
// ---------------------------------------------------------------------------

/// Newton steps for `sqrt`. A bit-length starting guess converges on the
/// widest 256-bit input in well under this many steps.
pub const DEFAULT_SQRT_ITERATIONS: u32 = 64;

/// Taylor terms for the fractional part of `exp`. `1/30!` is far below one
/// raw unit, so the tail contributes exactly zero.
pub const DEFAULT_EXP_TERMS: u32 = 30;

/// atanh-series terms for `ln` on the reduced range `[1, 2)`.
pub const DEFAULT_LN_TERMS: u32 = 40;

/// Terms summed by the golden-ratio series.
pub const DEFAULT_PHI_TERMS: u32 = 32;

/// Upper bound on any configured iteration count. Keeps every certified
/// operation bounded even with a hostile config file.
pub const MAX_ITERATIONS: u32 = 4_096;

// ---------------------------------------------------------------------------
// Hashing
// ---------------------------------------------------------------------------

/// Hex length of a SHA-256 digest. Logs and packets use this one.
pub const HASH_HEX_LENGTH: usize = 64;

/// Hex length of a SHA-512 digest, used by the canonical-encoding layer.
pub const WIDE_HASH_HEX_LENGTH: usize = 128;

/// `prev_hash` of the first entry in every audit log.
pub const ZERO_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

// ---------------------------------------------------------------------------
// Signatures
// ---------------------------------------------------------------------------

/// Seeds shorter than this are rejected by every provider. 16 bytes is the
/// floor; real deployments should use 32.
pub const MIN_SEED_LENGTH: usize = 16;

/// Algorithm used when a caller doesn't care.
pub const DEFAULT_SIGNATURE_ALGORITHM: &str = "ML-DSA-65";

/// Environment variable consulted by [`ProviderConfig::from_env`].
pub const SIGNATURE_BACKEND_ENV: &str = "VERIDET_SIGNATURE_BACKEND";

// ---------------------------------------------------------------------------
// Packets
// ---------------------------------------------------------------------------

/// Serialization version stamped into every replay packet.
pub const PACKET_VERSION: u32 = 1;

/// Exclusive upper bound for packet timestamps (`2^63`).
pub const MAX_PACKET_TIMESTAMP: u64 = 1 << 63;

// ---------------------------------------------------------------------------
// Runtime configuration
// ---------------------------------------------------------------------------

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{field} must be between 1 and {max}, got {value}")]
    IterationsOutOfRange {
        field: &'static str,
        value: u32,
        max: u32,
    },

    #[error("unknown signature backend: {0}")]
    UnknownBackend(String),
}

/// Fixed iteration and term counts for the transcendental functions.
///
/// These are part of the determinism contract: two engines only agree
/// bit-for-bit when they run with identical values here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArithmeticConfig {
    pub sqrt_iterations: u32,
    pub exp_terms: u32,
    pub ln_terms: u32,
    pub phi_terms: u32,
}

impl Default for ArithmeticConfig {
    fn default() -> Self {
        Self {
            sqrt_iterations: DEFAULT_SQRT_ITERATIONS,
            exp_terms: DEFAULT_EXP_TERMS,
            ln_terms: DEFAULT_LN_TERMS,
            phi_terms: DEFAULT_PHI_TERMS,
        }
    }
}

impl ArithmeticConfig {
    /// Rejects zero or absurdly large iteration counts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("sqrt_iterations", self.sqrt_iterations),
            ("exp_terms", self.exp_terms),
            ("ln_terms", self.ln_terms),
            ("phi_terms", self.phi_terms),
        ];
        for (field, value) in fields {
            if value == 0 || value > MAX_ITERATIONS {
                return Err(ConfigError::IterationsOutOfRange {
                    field,
                    value,
                    max: MAX_ITERATIONS,
                });
            }
        }
        Ok(())
    }
}

/// Which signature implementation backs a provider.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureBackend {
    /// Deterministic keyed-hash signatures. Fine for tests and replay,
    /// worthless against an adversary.
    #[default]
    Mock,
    /// ML-DSA lattice signatures.
    Lattice,
}

impl SignatureBackend {
    /// Parses `"mock"` or `"lattice"` (case-insensitive). `"real"` and
    /// `"dilithium"` are accepted as aliases for the lattice backend.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(Self::Mock),
            "lattice" | "real" | "dilithium" => Ok(Self::Lattice),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mock => "mock",
            Self::Lattice => "lattice",
        }
    }
}

/// Signature provider selection.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub backend: SignatureBackend,
}

impl ProviderConfig {
    /// Reads [`SIGNATURE_BACKEND_ENV`]. Unset means mock; a set but
    /// unrecognized value is an error rather than a silent fallback.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(SIGNATURE_BACKEND_ENV) {
            Ok(value) => Ok(Self {
                backend: SignatureBackend::parse(&value)?,
            }),
            Err(_) => Ok(Self::default()),
        }
    }
}

/// Everything a host needs to stand up the core, in one document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub arithmetic: ArithmeticConfig,
    pub provider: ProviderConfig,
}

impl CoreConfig {
    /// Parses and validates a JSON config document. Missing sections fall
    /// back to their defaults.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.arithmetic.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_matches_decimals() {
        assert_eq!(SCALE, 10u128.pow(DECIMALS));
    }

    #[test]
    fn test_constants_are_below_scale_where_fractional() {
        assert!(LN2_RAW < SCALE);
        assert!(INV_PHI_RAW < SCALE);
        assert!(E_RAW > 2 * SCALE && E_RAW < 3 * SCALE);
    }

    #[test]
    fn test_zero_hash_shape() {
        assert_eq!(ZERO_HASH.len(), HASH_HEX_LENGTH);
        assert!(ZERO_HASH.chars().all(|c| c == '0'));
    }

    #[test]
    fn test_timestamp_bound_is_two_to_the_63() {
        assert_eq!(MAX_PACKET_TIMESTAMP, 9_223_372_036_854_775_808);
    }

    #[test]
    fn test_default_config_validates() {
        assert!(ArithmeticConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let config = ArithmeticConfig {
            exp_terms: 0,
            ..ArithmeticConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::IterationsOutOfRange { field: "exp_terms", .. })
        ));
    }

    #[test]
    fn test_backend_parsing() {
        assert_eq!(SignatureBackend::parse("mock").unwrap(), SignatureBackend::Mock);
        assert_eq!(SignatureBackend::parse("LATTICE").unwrap(), SignatureBackend::Lattice);
        assert_eq!(SignatureBackend::parse("real").unwrap(), SignatureBackend::Lattice);
        assert!(SignatureBackend::parse("rsa").is_err());
    }

    #[test]
    fn test_core_config_defaults_when_sections_missing() {
        let config = CoreConfig::from_json_str("{}").unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.provider.backend, SignatureBackend::Mock);
    }

    #[test]
    fn test_core_config_partial_override() {
        let config = CoreConfig::from_json_str(
            r#"{"arithmetic":{"sqrt_iterations":12},"provider":{"backend":"lattice"}}"#,
        )
        .unwrap();
        assert_eq!(config.arithmetic.sqrt_iterations, 12);
        assert_eq!(config.arithmetic.exp_terms, DEFAULT_EXP_TERMS);
        assert_eq!(config.provider.backend, SignatureBackend::Lattice);
    }

    #[test]
    fn test_core_config_rejects_bad_iterations() {
        let err = CoreConfig::from_json_str(r#"{"arithmetic":{"ln_terms":100000}}"#);
        assert!(err.is_err());
    }
}
