//! Error types for the consensus crate.

use thiserror::Error;

/// Errors raised by pools, committees, and the engine.
#[derive(Debug, Error)]
pub enum ConsensusError {
    /// A committee must seat at least one witness.
    #[error("committee has no members")]
    EmptyCommittee,

    /// ACK claims a seat outside the committee.
    #[error("ack for round {round} claims seat {position} in a committee of {committee_size}")]
    AckBadPosition {
        /// Round of the offending ACK.
        round: u64,
        /// Claimed seat.
        position: u32,
        /// Size of the round's committee.
        committee_size: usize,
    },

    /// ACK signature does not verify under the claimed seat's key.
    #[error("ack for round {round} seat {position} carries a bad signature")]
    AckBadSignature {
        /// Round of the offending ACK.
        round: u64,
        /// Claimed seat.
        position: u32,
    },

    /// A block's ACK set is below the simple majority.
    #[error("quorum not reached for round {round}: have {have}, need {need}")]
    QuorumNotReached {
        /// The round lacking quorum.
        round: u64,
        /// Admitted votes.
        have: usize,
        /// Required votes.
        need: usize,
    },

    /// A block's ACK set mixes agree and oppose votes.
    #[error("ack set for round {round} mixes vote kinds")]
    MixedAckKinds {
        /// The offending round.
        round: u64,
    },

    /// A block carries the wrong vote kind for its parent.
    #[error("round {round} attached {got} acks where {expected} were required")]
    WrongAckKind {
        /// The offending round.
        round: u64,
        /// Kind found.
        got: &'static str,
        /// Kind required by the parent.
        expected: &'static str,
    },

    /// Header producer is not seated in the round's committee.
    #[error("producer of round {round} is not a committee member")]
    UnknownProducer {
        /// The offending round.
        round: u64,
    },

    /// Header carries no producer signature.
    #[error("header for round {round} is unsigned")]
    MissingSignature {
        /// The offending round.
        round: u64,
    },

    /// Producer signature does not verify.
    #[error("producer signature for round {round} is invalid")]
    InvalidProducerSignature {
        /// The offending round.
        round: u64,
    },

    /// Engine asked to sign without a witness key.
    #[error("node has no witness key")]
    NoSigningKey,
}
