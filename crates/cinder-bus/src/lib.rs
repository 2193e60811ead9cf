//! # Cinder Bus: Event Bus for Core Subsystems
//!
//! The worker loop, the sealer, and the chain writer never call each other
//! directly; they publish typed events here and subscribe to what they
//! need. The P2P handler feeds inbound gossip (answers, ACKs) through the
//! same surface, so the worker observes one ordered event stream.
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │ Chain writer │                    │ Worker loop  │
//! │              │    publish()       │              │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  Event Bus   │ ─────────┘
//!                  └──────────────┘  subscribe()
//! ```

pub mod broadcast;
pub mod events;
pub mod publisher;
pub mod subscriber;

pub use broadcast::{BusBroadcaster, NetworkBroadcaster};
pub use events::CoreEvent;
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{Subscription, SubscriptionError};

/// Maximum events buffered per subscriber before it observes lag.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capacity() {
        assert_eq!(DEFAULT_CHANNEL_CAPACITY, 1000);
    }
}
