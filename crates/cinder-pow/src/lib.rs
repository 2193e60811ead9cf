//! # Cinder PoW: Leader-Selection Ticket Engine
//!
//! The PoW side of the hybrid consensus: miners race to find a nonce whose
//! dataset-backed hash lands under the round's difficulty target. A winning
//! nonce is not a block but an *answer*, the ticket that lets the
//! round's DPoS proposer assemble a block embedding it.
//!
//! ## Components
//!
//! - [`dataset`]: the epoch-indexed lookup table behind the hash.
//! - [`hasher`]: the pure `hashimoto` function and target arithmetic.
//! - [`sealer`]: CPU worker fan-out with cooperative abort; at most one
//!   answer per seal call.
//! - [`remote`]: the external-miner interface (get work / submit work /
//!   hashrate tracking, HTTP work notifications).
//! - [`verify`]: seal verification for answers and committed headers.
//!
//! ## Concurrency
//!
//! Nonce search runs on plain threads (it never yields); orchestration and
//! the remote-sealer actor run on tokio. The dataset is shared behind `Arc`
//! and stays rooted until every worker has exited.

pub mod config;
pub mod dataset;
pub mod hasher;
pub mod meter;
pub mod remote;
pub mod sealer;
pub mod verify;

mod errors;

pub use config::{PowConfig, SealMode};
pub use dataset::{Dataset, DatasetCache, EPOCH_LENGTH};
pub use errors::PowError;
pub use hasher::{hashimoto, meets_target, seal_input, target_from_difficulty};
pub use meter::HashrateMeter;
pub use remote::{RemoteHandle, RemoteSealer, WorkPackage};
pub use sealer::Sealer;
pub use verify::{verify_answer, verify_seal};
