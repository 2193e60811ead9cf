//! # Cinder Consensus
//!
//! The DPoS half of the hybrid consensus: witness committees, quorum
//! arithmetic, the per-round ACK and answer pools, difficulty and gas-limit
//! rules, and the engine that finalizes and signs blocks.
//!
//! Quorum thresholds are never global state: they derive on demand from an
//! immutable [`Committee`] value snapshotted per height, so the hot path
//! reads no mutable configuration.

pub mod ack_pool;
pub mod answer_pool;
pub mod committee;
pub mod difficulty;
pub mod engine;

mod errors;

pub use ack_pool::AckPool;
pub use answer_pool::AnswerPool;
pub use committee::{
    address_from_pubkey, Committee, CommitteeProvider, StaticCommitteeProvider, Witness,
};
pub use difficulty::{calc_difficulty, calc_gas_limit, MIN_DIFFICULTY, MIN_GAS_LIMIT};
pub use engine::{DposEngine, BLOCK_REWARD, POW_ANSWER_REWARD};
pub use errors::ConsensusError;
