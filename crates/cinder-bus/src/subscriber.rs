//! Subscribing side of the event bus.

use crate::events::CoreEvent;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::warn;

/// Errors surfaced to subscribers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The bus was dropped; no more events will arrive.
    #[error("event bus closed")]
    Closed,
}

/// Handle for receiving core events.
///
/// A slow subscriber that overruns its buffer skips the lost events and
/// keeps going: the pools are idempotent and quorum logic acts on
/// accumulated counts, so missed gossip is recovered from later arrivals.
pub struct Subscription {
    receiver: broadcast::Receiver<CoreEvent>,
    lagged: u64,
}

impl Subscription {
    pub(crate) fn new(receiver: broadcast::Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            lagged: 0,
        }
    }

    /// Receive the next event, skipping over any lag gaps.
    pub async fn recv(&mut self) -> Result<CoreEvent, SubscriptionError> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Ok(event),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    self.lagged += missed;
                    warn!(missed, total = self.lagged, "subscriber lagged, events skipped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(SubscriptionError::Closed)
                }
            }
        }
    }

    /// Non-blocking receive; `None` when no event is queued.
    pub fn try_recv(&mut self) -> Option<CoreEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(missed)) => {
                    self.lagged += missed;
                }
                Err(_) => return None,
            }
        }
    }

    /// Total events this subscriber has missed to lag.
    pub fn lagged(&self) -> u64 {
        self.lagged
    }
}
