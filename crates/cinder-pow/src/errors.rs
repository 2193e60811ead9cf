//! Error types for the PoW engine.

use thiserror::Error;

/// Errors raised by sealing and remote-work handling.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PowError {
    /// No pending work to hand to a remote miner.
    #[error("no mining work available")]
    NoMiningWork,

    /// Submitted seal hash is not in the pending-work map.
    #[error("unknown seal hash {seal_hash}")]
    SealMismatch {
        /// Hex-encoded submitted seal hash.
        seal_hash: String,
    },

    /// Submitted nonce does not satisfy the target or mix check.
    #[error("invalid seal result for round {number}")]
    InvalidSealResult {
        /// Round the submission was for.
        number: u64,
    },

    /// Solution arrived after the round went stale.
    #[error("stale seal: round {number} is {behind} behind the head")]
    StaleSeal {
        /// Round the solution was for.
        number: u64,
        /// How far behind the current head it is.
        behind: u64,
    },

    /// Header carries a zero difficulty.
    #[error("header difficulty is zero")]
    ZeroDifficulty,

    /// Header embeds no PoW answer where one is required.
    #[error("header for round {number} embeds no pow answer")]
    MissingAnswer {
        /// Round of the offending header.
        number: u64,
    },

    /// The remote sealer actor is gone.
    #[error("remote sealer unavailable")]
    RemoteUnavailable,
}
