//! Network broadcast port.
//!
//! The worker publishes blocks, answers, and ACKs to peers through this
//! thin port. The real P2P transport implements it outside the core; the
//! bus-backed adapter here covers single-process wiring and tests, where
//! "the network" is every other subscriber on the same bus.

use crate::events::CoreEvent;
use crate::publisher::EventPublisher;
use async_trait::async_trait;
use cinder_types::{Block, PowAnswer, WitnessAck};
use std::sync::Arc;

/// Outbound gossip surface consumed by the worker loop.
#[async_trait]
pub trait NetworkBroadcaster: Send + Sync {
    /// Announce a freshly mined block.
    async fn broadcast_block(&self, block: Arc<Block>);

    /// Gossip a PoW answer.
    async fn broadcast_answer(&self, answer: PowAnswer);

    /// Gossip a witness ACK.
    async fn broadcast_ack(&self, ack: WitnessAck);
}

/// Broadcast adapter backed by an in-memory bus.
pub struct BusBroadcaster<P: EventPublisher> {
    bus: Arc<P>,
}

impl<P: EventPublisher> BusBroadcaster<P> {
    /// Wrap a bus as the gossip surface.
    pub fn new(bus: Arc<P>) -> Self {
        Self { bus }
    }
}

#[async_trait]
impl<P: EventPublisher> NetworkBroadcaster for BusBroadcaster<P> {
    async fn broadcast_block(&self, block: Arc<Block>) {
        self.bus.publish(CoreEvent::NewMinedBlock { block }).await;
    }

    async fn broadcast_answer(&self, answer: PowAnswer) {
        self.bus.publish(CoreEvent::PowAnswer(answer)).await;
    }

    async fn broadcast_ack(&self, ack: WitnessAck) {
        self.bus.publish(CoreEvent::WitnessAck(ack)).await;
    }
}
