//! Witness acknowledgments.
//!
//! An ACK is a signed vote from a DPoS witness about one round: `agree`
//! endorses the round going ahead, `oppose` records a reject after the
//! proposer missed its deadline. The signature covers `(number, position,
//! block_hash, kind)` and must verify under the public key seated at
//! `position` in the round's witness set.

use crate::Hash;
use cinder_crypto::{keccak256, WitnessKeypair, WitnessPublicKey, WitnessSignature};
use primitive_types::H256;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};

/// The hash an ACK carries when it does not point at a concrete block:
/// opposes, and agrees for a round whose block does not exist yet.
pub fn empty_ack_hash() -> Hash {
    H256(keccak256(b"empty"))
}

/// Vote kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum AckKind {
    /// Endorse the round.
    Agree = 1,
    /// Reject the round.
    Oppose = 2,
}

/// A signed witness vote for one round.
#[serde_as]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WitnessAck {
    /// The round being voted on.
    pub number: u64,
    /// The signer's slot in the round's witness set.
    pub position: u32,
    /// Hash of the block being acknowledged, or [`empty_ack_hash`].
    pub block_hash: Hash,
    /// Vote kind.
    pub kind: AckKind,
    /// Signature over the other four fields.
    #[serde_as(as = "Bytes")]
    pub signature: [u8; 64],
}

impl WitnessAck {
    /// Build and sign an ACK.
    pub fn signed(
        number: u64,
        position: u32,
        block_hash: Hash,
        kind: AckKind,
        keypair: &WitnessKeypair,
    ) -> Self {
        let mut ack = Self {
            number,
            position,
            block_hash,
            kind,
            signature: [0u8; 64],
        };
        ack.signature = *keypair.sign(&ack.signing_message()).as_bytes();
        ack
    }

    /// The message the signature covers.
    pub fn signing_message(&self) -> Vec<u8> {
        let mut message = Vec::with_capacity(8 + 4 + 32 + 1);
        message.extend_from_slice(&self.number.to_be_bytes());
        message.extend_from_slice(&self.position.to_be_bytes());
        message.extend_from_slice(self.block_hash.as_bytes());
        message.push(self.kind as u8);
        message
    }

    /// Verify the signature under `public_key`.
    pub fn verify(&self, public_key: &WitnessPublicKey) -> bool {
        public_key
            .verify(
                &self.signing_message(),
                &WitnessSignature::from_bytes(self.signature),
            )
            .is_ok()
    }
}

/// Per-round ACK tallies embedded in headers for audit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckCount {
    /// The round the tallies refer to.
    pub number: u64,
    /// Count of agree votes observed.
    pub agree: u32,
    /// Count of oppose votes observed.
    pub oppose: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_ack_verifies() {
        let keypair = WitnessKeypair::from_seed([5u8; 32]);
        let ack = WitnessAck::signed(7, 2, empty_ack_hash(), AckKind::Agree, &keypair);
        assert!(ack.verify(&keypair.public_key()));
    }

    #[test]
    fn signature_covers_kind() {
        let keypair = WitnessKeypair::from_seed([5u8; 32]);
        let mut ack = WitnessAck::signed(7, 2, empty_ack_hash(), AckKind::Agree, &keypair);
        ack.kind = AckKind::Oppose;
        assert!(!ack.verify(&keypair.public_key()));
    }

    #[test]
    fn signature_covers_round() {
        let keypair = WitnessKeypair::from_seed([5u8; 32]);
        let mut ack = WitnessAck::signed(7, 2, empty_ack_hash(), AckKind::Oppose, &keypair);
        ack.number = 8;
        assert!(!ack.verify(&keypair.public_key()));
    }

    #[test]
    fn foreign_key_rejected() {
        let signer = WitnessKeypair::from_seed([5u8; 32]);
        let other = WitnessKeypair::from_seed([6u8; 32]);
        let ack = WitnessAck::signed(7, 2, empty_ack_hash(), AckKind::Agree, &signer);
        assert!(!ack.verify(&other.public_key()));
    }
}
