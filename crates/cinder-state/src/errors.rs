//! Error types for state operations.

use primitive_types::U256;
use thiserror::Error;

/// Errors raised by the state database.
#[derive(Debug, Error)]
pub enum StateError {
    /// A debit exceeded the account balance.
    #[error("insufficient balance for {address}: have {have}, need {need}")]
    InsufficientBalance {
        /// The debited account, hex-encoded.
        address: String,
        /// Current balance.
        have: U256,
        /// Requested debit.
        need: U256,
    },

    /// Backing store failure surfaced through the KV port.
    #[error("database error: {0}")]
    Database(String),
}
