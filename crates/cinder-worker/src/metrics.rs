//! # Worker Metrics
//!
//! Prometheus counters for the block production pipeline.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! cinder-worker = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `worker_blocks_committed_total` - Counter of blocks written to the chain
//! - `worker_answers_admitted_total` - Counter of PoW answers pooled
//! - `worker_acks_admitted_total` - Counter of witness ACKs pooled
//! - `worker_opposes_sent_total` - Counter of oppose votes broadcast

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, IntCounter};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Total blocks written to the canonical chain
    pub static ref BLOCKS_COMMITTED: IntCounter = register_int_counter!(
        "worker_blocks_committed_total",
        "Total number of blocks written to the chain"
    )
    .expect("Failed to create BLOCKS_COMMITTED metric");

    /// Total PoW answers admitted to the pool
    pub static ref ANSWERS_ADMITTED: IntCounter = register_int_counter!(
        "worker_answers_admitted_total",
        "Total number of PoW answers admitted to the pool"
    )
    .expect("Failed to create ANSWERS_ADMITTED metric");

    /// Total witness ACKs admitted to the pool
    pub static ref ACKS_ADMITTED: IntCounter = register_int_counter!(
        "worker_acks_admitted_total",
        "Total number of witness ACKs admitted to the pool"
    )
    .expect("Failed to create ACKS_ADMITTED metric");

    /// Total oppose votes broadcast after deadline expiry
    pub static ref OPPOSES_SENT: IntCounter = register_int_counter!(
        "worker_opposes_sent_total",
        "Total number of oppose votes broadcast"
    )
    .expect("Failed to create OPPOSES_SENT metric");
}

/// Record a committed block
#[cfg(feature = "metrics")]
pub fn record_block_committed() {
    BLOCKS_COMMITTED.inc();
}

/// Record an admitted answer
#[cfg(feature = "metrics")]
pub fn record_answer_admitted() {
    ANSWERS_ADMITTED.inc();
}

/// Record an admitted ACK
#[cfg(feature = "metrics")]
pub fn record_ack_admitted() {
    ACKS_ADMITTED.inc();
}

/// Record a broadcast oppose vote
#[cfg(feature = "metrics")]
pub fn record_oppose_sent() {
    OPPOSES_SENT.inc();
}

// No-op implementations when the metrics feature is disabled

/// Record a committed block
#[cfg(not(feature = "metrics"))]
pub fn record_block_committed() {}

/// Record an admitted answer
#[cfg(not(feature = "metrics"))]
pub fn record_answer_admitted() {}

/// Record an admitted ACK
#[cfg(not(feature = "metrics"))]
pub fn record_ack_admitted() {}

/// Record a broadcast oppose vote
#[cfg(not(feature = "metrics"))]
pub fn record_oppose_sent() {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_recorders_do_not_panic() {
        record_block_committed();
        record_answer_admitted();
        record_ack_admitted();
        record_oppose_sent();
    }
}
