//! Blocks and the canonical framing.
//!
//! A block is either *effective* (carries transactions and advances the
//! confirmed head) or *virtual* (an empty placeholder at a rejected round's
//! height whose sole job is to record the oppose-majority).

use crate::{
    ack::WitnessAck, answer::PowAnswer, errors::CodecError, header::Header,
    transaction::SignedTransaction, Hash,
};
use cinder_crypto::keccak256_concat;
use primitive_types::H256;
use serde::{Deserialize, Serialize};

/// The `extra` tag marking a virtual placeholder block.
pub const VIRTUAL_BLOCK_EXTRA: &[u8] = b"virtual";

/// A full block: header plus the three body lists.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// The block header.
    pub header: Header,
    /// Transactions; empty for virtual blocks.
    pub transactions: Vec<SignedTransaction>,
    /// Extra PoW answers recorded for the parent round.
    pub pow_answer_uncles: Vec<PowAnswer>,
    /// The quorum ACK set attached at commit time.
    pub acks: Vec<WitnessAck>,
}

impl Block {
    /// Block identity.
    pub fn hash(&self) -> Hash {
        self.header.hash()
    }

    /// Height shortcut.
    pub fn number(&self) -> u64 {
        self.header.number
    }

    /// True for virtual placeholder blocks.
    pub fn is_virtual(&self) -> bool {
        self.header.is_virtual()
    }

    /// Canonical wire framing.
    pub fn encode(&self) -> Vec<u8> {
        bincode::serialize(self).expect("block serialization is infallible")
    }

    /// Decode the canonical framing.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        bincode::deserialize(bytes).map_err(|e| CodecError::Decode(e.to_string()))
    }
}

/// Flat commitment over an ordered list of hashes. Stands in for the trie
/// roots the storage layer maintains; the core only needs the commitment to
/// be order-sensitive and deterministic.
pub fn ordered_root(hashes: impl IntoIterator<Item = Hash>) -> Hash {
    let collected: Vec<Hash> = hashes.into_iter().collect();
    if collected.is_empty() {
        return H256::zero();
    }
    let parts: Vec<&[u8]> = collected.iter().map(|h| h.as_bytes()).collect();
    H256(keccak256_concat(&parts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ack::{empty_ack_hash, AckKind};
    use crate::transaction::TxKind;
    use cinder_crypto::WitnessKeypair;
    use primitive_types::U256;

    fn sample_block() -> Block {
        let keypair = WitnessKeypair::from_seed([3u8; 32]);
        let header = Header {
            number: 4,
            difficulty: U256::from(131_072),
            gas_limit: 30_000_000,
            time: 1_700_000_000,
            nonce: 0xdead_beef,
            mix_digest: H256::repeat_byte(0x42),
            witness_sig: Some([6u8; 64]),
            ..Default::default()
        };
        Block {
            header,
            transactions: vec![SignedTransaction {
                kind: TxKind::Transfer,
                from: [1u8; 20],
                to: Some([2u8; 20]),
                nonce: 0,
                value: U256::from(5),
                gas_limit: 21_000,
                gas_tip: U256::one(),
                data: vec![],
            }],
            pow_answer_uncles: vec![PowAnswer {
                number: 3,
                nonce: 77,
                mix_digest: H256::repeat_byte(0x11),
                miner: [8u8; 20],
            }],
            acks: vec![WitnessAck::signed(
                4,
                1,
                empty_ack_hash(),
                AckKind::Agree,
                &keypair,
            )],
        }
    }

    #[test]
    fn encode_decode_roundtrip() {
        let block = sample_block();
        let decoded = Block::decode(&block.encode()).unwrap();
        assert_eq!(block, decoded);
        assert_eq!(block.hash(), decoded.hash());
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(Block::decode(&[0xff, 0x00, 0x13]).is_err());
    }

    #[test]
    fn ordered_root_is_order_sensitive() {
        let a = H256::repeat_byte(1);
        let b = H256::repeat_byte(2);
        assert_ne!(ordered_root([a, b]), ordered_root([b, a]));
        assert_eq!(ordered_root(Vec::<Hash>::new()), H256::zero());
    }
}
