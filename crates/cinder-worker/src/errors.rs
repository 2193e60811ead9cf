//! Error types for the worker crate.

use thiserror::Error;

/// Errors raised by the chain writer and the worker loop.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// Parent of a written block is not in the canonical view.
    #[error("parent {parent} of block {number} is unknown")]
    ParentMissing {
        /// Hex-encoded parent hash.
        parent: String,
        /// Height of the orphaned block.
        number: u64,
    },

    /// Committed state root does not match the header.
    #[error("state root mismatch at block {number}: header {header}, computed {computed}")]
    StateRootMismatch {
        /// Height of the offending block.
        number: u64,
        /// Root claimed by the header.
        header: String,
        /// Root the commit produced.
        computed: String,
    },

    /// Block assembly aborted for the round.
    #[error("round {round} aborted: {reason}")]
    RoundAborted {
        /// The abandoned round.
        round: u64,
        /// Why assembly stopped.
        reason: String,
    },

    /// Backing database failure. Fatal to the worker lifecycle.
    #[error("database failure: {0}")]
    Database(#[from] cinder_state::StateError),

    /// Consensus-level rejection.
    #[error(transparent)]
    Consensus(#[from] cinder_consensus::ConsensusError),
}
