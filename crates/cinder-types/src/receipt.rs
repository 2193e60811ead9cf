//! Execution receipts and logs.

use crate::{Address, Hash};
use cinder_crypto::keccak256;
use primitive_types::H256;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};

/// A log emitted during transaction execution.
#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    /// Emitting account.
    pub address: Address,
    /// Indexed topics.
    pub topics: Vec<Hash>,
    /// Opaque payload.
    #[serde_as(as = "Bytes")]
    pub data: Vec<u8>,
}

/// Receipt of one applied transaction.
///
/// `block_hash`, `block_number`, and `tx_index` are filled in by the chain
/// writer at commit time; the applier leaves them zeroed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Hash of the applied transaction.
    pub tx_hash: Hash,
    /// Whether execution succeeded.
    pub success: bool,
    /// Gas consumed by this transaction.
    pub gas_used: u64,
    /// Gas consumed by the block up to and including this transaction.
    pub cumulative_gas_used: u64,
    /// Logs emitted during execution.
    pub logs: Vec<Log>,
    /// Containing block hash, filled by the chain writer.
    pub block_hash: Hash,
    /// Containing block number, filled by the chain writer.
    pub block_number: u64,
    /// Index within the block, filled by the chain writer.
    pub tx_index: u32,
}

impl Receipt {
    /// A fresh receipt with placement fields zeroed.
    pub fn new(tx_hash: Hash, success: bool, gas_used: u64, cumulative_gas_used: u64) -> Self {
        Self {
            tx_hash,
            success,
            gas_used,
            cumulative_gas_used,
            logs: Vec::new(),
            block_hash: H256::zero(),
            block_number: 0,
            tx_index: 0,
        }
    }
}

/// 2048-bit bloom filter over log addresses and topics.
#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bloom(#[serde_as(as = "Bytes")] pub [u8; 256]);

impl Bloom {
    /// Set the three filter bits derived from `input`.
    pub fn accrue(&mut self, input: &[u8]) {
        let digest = keccak256(input);
        for i in 0..3 {
            let bit = ((digest[i * 2] as usize) << 8 | digest[i * 2 + 1] as usize) & 0x7ff;
            self.0[256 - 1 - bit / 8] |= 1 << (bit % 8);
        }
    }

    /// Fold a log's address and topics into the filter.
    pub fn accrue_log(&mut self, log: &Log) {
        self.accrue(&log.address);
        for topic in &log.topics {
            self.accrue(topic.as_bytes());
        }
    }

    /// Build a bloom over all logs of a receipt list.
    pub fn from_receipts(receipts: &[Receipt]) -> Self {
        let mut bloom = Self::default();
        for receipt in receipts {
            for log in &receipt.logs {
                bloom.accrue_log(log);
            }
        }
        bloom
    }

    /// Probabilistic membership test.
    pub fn contains_input(&self, input: &[u8]) -> bool {
        let digest = keccak256(input);
        for i in 0..3 {
            let bit = ((digest[i * 2] as usize) << 8 | digest[i * 2 + 1] as usize) & 0x7ff;
            if self.0[256 - 1 - bit / 8] & (1 << (bit % 8)) == 0 {
                return false;
            }
        }
        true
    }
}

impl Default for Bloom {
    fn default() -> Self {
        Self([0u8; 256])
    }
}

impl std::fmt::Debug for Bloom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let set_bits: usize = self.0.iter().map(|b| b.count_ones() as usize).sum();
        write!(f, "Bloom({set_bits} bits set)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accrued_input_is_contained() {
        let mut bloom = Bloom::default();
        bloom.accrue(b"topic-a");
        assert!(bloom.contains_input(b"topic-a"));
        assert!(!bloom.contains_input(b"topic-b"));
    }

    #[test]
    fn bloom_over_receipts_covers_log_fields() {
        let log = Log {
            address: [7u8; 20],
            topics: vec![H256::repeat_byte(1)],
            data: vec![],
        };
        let mut receipt = Receipt::new(H256::zero(), true, 21_000, 21_000);
        receipt.logs.push(log);

        let bloom = Bloom::from_receipts(&[receipt]);
        assert!(bloom.contains_input(&[7u8; 20]));
        assert!(bloom.contains_input(H256::repeat_byte(1).as_bytes()));
    }
}
