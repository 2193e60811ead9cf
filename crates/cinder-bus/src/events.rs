//! Core event types.

use cinder_types::{Block, Log, PowAnswer, WitnessAck};
use std::sync::Arc;

/// Events flowing between the core subsystems.
///
/// Blocks travel behind `Arc`: a head event fans out to every subscriber
/// and the body can be large.
#[derive(Clone, Debug)]
pub enum CoreEvent {
    /// The canonical head advanced (or a virtual placeholder was recorded).
    /// Source: chain writer. Consumed by the worker loop and the sealer.
    ChainHead {
        /// The newly written block.
        block: Arc<Block>,
    },

    /// A freshly written block produced by this node, for gossip.
    /// Source: chain writer. Consumed by the P2P handler.
    NewMinedBlock {
        /// The block to announce.
        block: Arc<Block>,
    },

    /// A PoW answer, locally found or received from a peer.
    /// Consumed by the worker loop.
    PowAnswer(PowAnswer),

    /// A witness acknowledgment, locally signed or received from a peer.
    /// Consumed by the worker loop.
    WitnessAck(WitnessAck),

    /// Logs of not-yet-committed transactions, published for filter RPCs.
    /// Only emitted while the node is not actively mining; a mining node's
    /// logs get their block hash at commit and go out with the head event.
    PendingLogs(Vec<Log>),
}

impl CoreEvent {
    /// Short topic label used in logs.
    pub fn topic(&self) -> &'static str {
        match self {
            Self::ChainHead { .. } => "chain_head",
            Self::NewMinedBlock { .. } => "new_mined_block",
            Self::PowAnswer(_) => "pow_answer",
            Self::WitnessAck(_) => "witness_ack",
            Self::PendingLogs(_) => "pending_logs",
        }
    }
}
