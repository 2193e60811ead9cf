//! # Cinder Types
//!
//! Domain entities shared across the Cinderchain core crates. This is the
//! single source of truth for cross-crate type definitions.
//!
//! ## Clusters
//!
//! - **Chain**: [`Header`], [`Block`], [`SignedTransaction`], [`Receipt`]
//! - **Consensus**: [`PowAnswer`], [`WitnessAck`], [`AckKind`], [`AckCount`]
//!
//! ## Framing
//!
//! Blocks, answers, and ACKs carry `serde` derives and are framed with
//! `bincode`; [`Block::encode`] / [`Block::decode`] is the canonical
//! round-trip used by gossip and persistence.

pub mod ack;
pub mod answer;
pub mod block;
pub mod header;
pub mod receipt;
pub mod transaction;

mod errors;

pub use ack::{empty_ack_hash, AckCount, AckKind, WitnessAck};
pub use answer::PowAnswer;
pub use block::{ordered_root, Block, VIRTUAL_BLOCK_EXTRA};
pub use errors::CodecError;
pub use header::{empty_uncle_hash, Header};
pub use receipt::{Bloom, Log, Receipt};
pub use transaction::{SignedTransaction, TxKind, GAS_FOR_EMPTY_TX};

/// A 20-byte account address.
pub type Address = [u8; 20];

/// A 32-byte hash.
pub type Hash = primitive_types::H256;

/// The all-zero address, used as `coinbase` on witness-produced blocks.
pub const ZERO_ADDRESS: Address = [0u8; 20];
