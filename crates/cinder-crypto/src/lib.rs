//! # Cinder Crypto
//!
//! Cryptographic primitives shared by the Cinderchain core crates.
//!
//! ## Components
//!
//! - **Keccak-256**: the canonical hash of the chain (headers, seal hashes,
//!   transaction ids, the PoW dataset seed chain).
//! - **Witness keys**: ed25519 keypairs used by DPoS witnesses to sign
//!   acknowledgments. Signing is deterministic; verification is byte-oriented
//!   so callers never touch curve types directly.
//!
//! Transaction/wallet signing lives outside the core and is intentionally
//! absent here.

pub mod hashing;
pub mod keys;

mod errors;

pub use errors::CryptoError;
pub use hashing::{keccak256, keccak256_concat, Hash256};
pub use keys::{WitnessKeypair, WitnessPublicKey, WitnessSignature};
