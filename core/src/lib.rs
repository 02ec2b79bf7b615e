// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Veridet Core
//!
//! Deterministic computation you can prove after the fact. Every number is
//! fixed-point, every operation that matters lands in a hash chain, and
//! every state transition is a signed packet linked to the one before it.
//! Two machines replaying the same calls end up with the same bytes. If
//! they don't, something is wrong, and the log tells you where.
//!
//! ## Architecture
//!
//! Leaves first:
//!
//! - **numeric**: `FixedPoint` (u128 at 18 decimals) and the integer-only
//!   transcendental functions. No floats were harmed, or used.
//! - **canonical**: one byte-exact JSON encoding for everything hashed.
//! - **audit**: the append-only, hash-chained log shared by every
//!   subsystem. You own it; we only borrow it.
//! - **certified**: fixed-point operations that write to that log.
//! - **crypto**: digests, key material, and the signature providers (a
//!   mock for tests, ML-DSA for real).
//! - **packet**: replay packets and their validation state machine.
//! - **config**: every constant and the runtime knobs.
//! - **logging**: `tracing` subscriber setup for hosts and tests.
//!
//! ## Design Philosophy
//!
//! 1. Same inputs, same bytes. On every machine, every time.
//! 2. Failures leave no trace in the log.
//! 3. No clocks, no OS randomness, no globals.
//! 4. If it feeds a hash, it has tests. Plural.

pub mod audit;
pub mod canonical;
pub mod certified;
pub mod config;
pub mod crypto;
pub mod error;
pub mod logging;
pub mod numeric;
pub mod packet;

pub use audit::{AuditLog, AuditLogEntry};
pub use certified::CertifiedArithmetic;
pub use error::CoreError;
pub use numeric::FixedPoint;
pub use packet::{ReplayPacket, ValidationResult};
