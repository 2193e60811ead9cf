//! # Cinder Worker: Block Production State Machine
//!
//! The central control loop of a Cinderchain node. One long-running actor
//! per node collects PoW answers and witness ACKs for each round, decides
//! whether this node is the round's proposer or a co-validator, and drives
//! block assembly, propagation, or timeout-driven oppose/re-propose.
//!
//! ## Subsystems
//!
//! - [`txpool`]: pending transactions ordered `(gas tip desc, nonce asc)`,
//!   locals first.
//! - [`applier`]: ordered execution with snapshot/revert per transaction
//!   and per-error iterator classification.
//! - [`chain`]: the canonical view and the atomic block writer.
//! - [`worker`]: the state machine itself.
//!
//! ## Ownership
//!
//! The worker is single-owner: every role decision, quorum count, and
//! timer runs in one task. Inbound gossip and chain heads arrive through
//! one bus subscription, so per-round events are processed in arrival
//! order. The chain writer runs as its own serial task fed over a bounded
//! channel (must-deliver).

pub mod applier;
pub mod chain;
pub mod config;
pub mod metrics;
pub mod txpool;
pub mod worker;

mod errors;

pub use applier::{
    commit_transactions, ApplyBackend, ApplyError, CommitOutcome, ExecutionEnv, GasPool,
    Interrupt, TransferBackend,
};
pub use chain::{Chain, ChainConfig, WriteOutcome};
pub use config::WorkerConfig;
pub use errors::WorkerError;
pub use txpool::{PendingOrdered, TxPool, TxPoolError};
pub use worker::{BlockKind, Worker, WorkerDependencies, WorkerStatus};
