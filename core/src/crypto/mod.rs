//! # Cryptographic Primitives for Veridet
//!
//! Every digest that ends up in a chain and every signature that
//! authenticates a packet flows through here.
//!
//! We deliberately chose boring, well-audited cryptography:
//!
//! - **SHA-256** for chain digests. Everyone can reproduce it.
//! - **SHA-512** for the wide canonical digest.
//! - **BLAKE3** for domain-separated derivation in the mock backend.
//! - **ML-DSA (FIPS 204)** for signatures that should survive a quantum
//!   computer, via the `fips204` crate.
//!
//! ## A note on "rolling your own crypto"
//!
//! We don't. The lattice backend is a thin wrapper around an audited
//! implementation. The mock backend is not crypto at all and says so in
//! its name.

pub mod hash;
pub mod keys;
pub mod lattice;
pub mod mock;
pub mod provider;

pub use hash::{sha256, sha256_hex, sha512_hex};
pub use keys::{KeyBundle, KeyError, Keypair};
pub use lattice::LatticeSignatureProvider;
pub use mock::MockSignatureProvider;
pub use provider::{create_provider, ProviderError, SignatureAlgorithm, SignatureProvider};
