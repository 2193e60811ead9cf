//! Block headers.
//!
//! A header carries the usual chain linkage and accounting fields plus the
//! two consensus-carrying lists of this protocol: the per-round ACK counts
//! and the accepted PoW answers for the height.

use crate::{ack::AckCount, answer::PowAnswer, receipt::Bloom, Address, Hash};
use cinder_crypto::keccak256;
use primitive_types::{H256, U256};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};

/// `keccak256(rlp([]))`, the canonical hash of an empty uncle list. Headers
/// with a different value took extra uncle weight into account when their
/// difficulty was derived.
pub fn empty_uncle_hash() -> Hash {
    H256(keccak256(&[0xc0]))
}

/// A block header.
///
/// `coinbase` is the PoW reward recipient (zero on witness-produced blocks);
/// `producer_addr` is the DPoS signer of the round. They are distinct on
/// purpose: the PoW winner and the round proposer are different roles.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Hash of the parent block.
    pub parent_hash: Hash,
    /// Hash of the uncle list.
    pub uncle_hash: Hash,
    /// PoW reward recipient.
    pub coinbase: Address,
    /// DPoS signer for this round.
    pub producer_addr: Address,
    /// State root after applying this block.
    pub state_root: Hash,
    /// Root over the transaction list.
    pub tx_root: Hash,
    /// Root over the receipt list.
    pub receipt_root: Hash,
    /// Bloom over all log addresses and topics.
    pub logs_bloom: Bloom,
    /// PoW difficulty of this block.
    pub difficulty: U256,
    /// Block height.
    pub number: u64,
    /// Gas ceiling of the block.
    pub gas_limit: u64,
    /// Gas consumed by the block.
    pub gas_used: u64,
    /// Unix timestamp, seconds.
    pub time: u64,
    /// Opaque tag, at most 32 bytes. Distinguishes virtual placeholders
    /// from effective blocks.
    #[serde_as(as = "Bytes")]
    pub extra: Vec<u8>,
    /// PoW mix digest of the embedded winning answer.
    pub mix_digest: Hash,
    /// PoW nonce of the embedded winning answer.
    pub nonce: u64,
    /// Optional EIP-1559-style base fee.
    pub base_fee: Option<U256>,
    /// Per-round ACK counts embedded for audit.
    pub ack_count_list: Vec<AckCount>,
    /// Accepted PoW winners for this height.
    pub pow_answers: Vec<PowAnswer>,
    /// Producer signature over the seal hash. Not part of the seal hash
    /// itself.
    #[serde_as(as = "Option<Bytes>")]
    pub witness_sig: Option<[u8; 64]>,
}

impl Header {
    /// Full header hash: block identity.
    pub fn hash(&self) -> Hash {
        let encoded = bincode::serialize(self).expect("header serialization is infallible");
        H256(keccak256(&encoded))
    }

    /// Seal hash: identity of a block-in-flight. The PoW fields and the
    /// producer signature are masked out so miners and the signer commit to
    /// the same pre-image.
    pub fn seal_hash(&self) -> Hash {
        let mut masked = self.clone();
        masked.mix_digest = H256::zero();
        masked.nonce = 0;
        masked.witness_sig = None;
        let encoded = bincode::serialize(&masked).expect("header serialization is infallible");
        H256(keccak256(&encoded))
    }

    /// True when this header tags a virtual placeholder block.
    pub fn is_virtual(&self) -> bool {
        self.extra == crate::block::VIRTUAL_BLOCK_EXTRA
    }
}

impl Default for Header {
    fn default() -> Self {
        Self {
            parent_hash: H256::zero(),
            uncle_hash: empty_uncle_hash(),
            coinbase: crate::ZERO_ADDRESS,
            producer_addr: crate::ZERO_ADDRESS,
            state_root: H256::zero(),
            tx_root: H256::zero(),
            receipt_root: H256::zero(),
            logs_bloom: Bloom::default(),
            difficulty: U256::one(),
            number: 0,
            gas_limit: 0,
            gas_used: 0,
            time: 0,
            extra: Vec::new(),
            mix_digest: H256::zero(),
            nonce: 0,
            base_fee: None,
            ack_count_list: Vec::new(),
            pow_answers: Vec::new(),
            witness_sig: None,
        }
    }
}
