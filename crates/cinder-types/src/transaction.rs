//! Transactions.
//!
//! The core treats transaction payloads as opaque; what it needs is the
//! accounting surface: sender, nonce, gas limit, tip, and the kind byte the
//! applier dispatches on. The kind table here is the single authoritative
//! one.

use crate::{Address, Hash};
use cinder_crypto::keccak256;
use primitive_types::{H256, U256};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};

/// Intrinsic gas of a transaction with no payload.
pub const GAS_FOR_EMPTY_TX: u64 = 21_000;

/// Gas charged per payload byte.
pub const GAS_PER_DATA_BYTE: u64 = 16;

/// Transaction kind byte.
///
/// The consensus path only dispatches on this tag; the semantics behind
/// non-transfer kinds live in the embedded VM, which is an external
/// collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TxKind {
    /// Plain value transfer.
    Transfer = 0x01,
    /// Contract invocation, executed by the embedded VM.
    ContractCall = 0x02,
    /// Witness/stake registration, executed by the embedded VM.
    Register = 0x03,
}

/// A signature-checked transaction as admitted to the pool.
///
/// Signature recovery happens at the network boundary; by the time a
/// transaction reaches the core its `from` is authoritative.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    /// Kind byte, see [`TxKind`].
    pub kind: TxKind,
    /// Recovered sender.
    pub from: Address,
    /// Recipient; `None` for VM-create payloads.
    pub to: Option<Address>,
    /// Sender nonce.
    pub nonce: u64,
    /// Transferred value.
    pub value: U256,
    /// Gas ceiling the sender pays for.
    pub gas_limit: u64,
    /// Priority fee per gas.
    pub gas_tip: U256,
    /// Opaque payload.
    #[serde_as(as = "Bytes")]
    pub data: Vec<u8>,
}

impl SignedTransaction {
    /// Transaction hash (identity).
    pub fn hash(&self) -> Hash {
        let encoded = bincode::serialize(self).expect("transaction serialization is infallible");
        H256(keccak256(&encoded))
    }

    /// Gas charged before execution: base cost plus payload bytes.
    pub fn intrinsic_gas(&self) -> u64 {
        GAS_FOR_EMPTY_TX + self.data.len() as u64 * GAS_PER_DATA_BYTE
    }

    /// Maximum fee the sender can be charged.
    pub fn max_fee(&self) -> U256 {
        self.gas_tip * U256::from(self.gas_limit)
    }

    /// Total funds required up front.
    pub fn total_cost(&self) -> U256 {
        self.value + self.max_fee()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(nonce: u64) -> SignedTransaction {
        SignedTransaction {
            kind: TxKind::Transfer,
            from: [1u8; 20],
            to: Some([2u8; 20]),
            nonce,
            value: U256::from(100),
            gas_limit: 30_000,
            gas_tip: U256::from(2),
            data: vec![0xde, 0xad],
        }
    }

    #[test]
    fn hash_is_stable_and_nonce_sensitive() {
        assert_eq!(tx(1).hash(), tx(1).hash());
        assert_ne!(tx(1).hash(), tx(2).hash());
    }

    #[test]
    fn intrinsic_gas_counts_payload() {
        assert_eq!(tx(1).intrinsic_gas(), GAS_FOR_EMPTY_TX + 2 * GAS_PER_DATA_BYTE);
    }

    #[test]
    fn total_cost_includes_fee() {
        let t = tx(1);
        assert_eq!(t.total_cost(), U256::from(100) + U256::from(2) * U256::from(30_000));
    }
}
