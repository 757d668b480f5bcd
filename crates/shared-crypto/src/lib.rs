//! # Shared Crypto - Client Identity
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `identity` | secp256k1 + SHA-256 | Request signing, transaction ids |
//! | `ecdsa` | secp256k1 | Key material and signature verification |
//! | `hashing` | SHA-256 | Transaction ids, TLS certificate hashes |
//!
//! ## Security Properties
//!
//! - **secp256k1**: RFC 6979 deterministic signatures
//! - **Nonces**: 24 random bytes per transaction id
//! - Secret key bytes are zeroized on drop

#![warn(missing_docs)]
#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod ecdsa;
pub mod errors;
pub mod hashing;
#[allow(missing_docs)]
pub mod identity;

pub use ecdsa::{Secp256k1KeyPair, Secp256k1PublicKey};
pub use errors::CryptoError;
pub use hashing::{sha256, sha256_many};
pub use identity::{EcdsaIdentity, Identity, IdentityContext, TransactionId};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
