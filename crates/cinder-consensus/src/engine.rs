//! The DPoS engine: finalization, header signing, and block-level checks.

use crate::{Committee, ConsensusError};
use cinder_crypto::{WitnessKeypair, WitnessSignature};
use cinder_state::StateDb;
use cinder_types::{AckKind, Block, Header};
use primitive_types::U256;
use std::sync::Arc;
use tracing::debug;

/// Default reward credited to the round's producer at finalization.
pub const BLOCK_REWARD: u64 = 2_000_000_000;

/// Reward credited to each embedded PoW answer's miner.
pub const POW_ANSWER_REWARD: u64 = 500_000_000;

/// Block finalization and sealing for the witness committee.
pub struct DposEngine {
    keypair: Option<Arc<WitnessKeypair>>,
    block_reward: U256,
}

impl DposEngine {
    /// Engine for a witness node holding a signing key.
    pub fn new(keypair: Arc<WitnessKeypair>) -> Self {
        Self {
            keypair: Some(keypair),
            block_reward: U256::from(BLOCK_REWARD),
        }
    }

    /// Engine for an observer; it can finalize and verify but not sign.
    pub fn observer() -> Self {
        Self {
            keypair: None,
            block_reward: U256::from(BLOCK_REWARD),
        }
    }

    /// Override the producer reward with the chain config's value.
    pub fn with_reward(mut self, block_reward: U256) -> Self {
        self.block_reward = block_reward;
        self
    }

    /// Apply the round's rewards and bind the resulting state root into
    /// the header.
    pub fn finalize(&self, header: &mut Header, state: &mut StateDb) {
        for answer in &header.pow_answers {
            state.add_balance(&answer.miner, U256::from(POW_ANSWER_REWARD));
        }
        state.add_balance(&header.producer_addr, self.block_reward);
        header.state_root = state.commit();
        debug!(
            number = header.number,
            state_root = %header.state_root,
            answers = header.pow_answers.len(),
            "block finalized"
        );
    }

    /// Seal the header: for DPoS this is signing its seal hash.
    pub fn seal_header(&self, header: &mut Header) -> Result<(), ConsensusError> {
        let keypair = self.keypair.as_ref().ok_or(ConsensusError::NoSigningKey)?;
        let signature = keypair.sign(header.seal_hash().as_bytes());
        header.witness_sig = Some(*signature.as_bytes());
        Ok(())
    }

    /// Check the producer's seat and signature against the round's
    /// committee.
    pub fn verify_producer(
        &self,
        header: &Header,
        committee: &Committee,
    ) -> Result<(), ConsensusError> {
        let Some(position) = committee.position_of(&header.producer_addr) else {
            return Err(ConsensusError::UnknownProducer {
                round: header.number,
            });
        };
        let Some(sig_bytes) = header.witness_sig else {
            return Err(ConsensusError::MissingSignature {
                round: header.number,
            });
        };
        let witness = committee
            .member(position)
            .expect("position came from this committee");
        witness
            .public_key
            .verify(
                header.seal_hash().as_bytes(),
                &WitnessSignature::from_bytes(sig_bytes),
            )
            .map_err(|_| ConsensusError::InvalidProducerSignature {
                round: header.number,
            })
    }

    /// Check a block's attached ACK set: simple majority, uniform kind,
    /// the kind the parent demands, and every signature valid (seat keys
    /// from `committee`, the committee of the ACKs' round).
    pub fn verify_ack_quorum(
        &self,
        block: &Block,
        committee: &Committee,
        parent_is_virtual: bool,
    ) -> Result<(), ConsensusError> {
        let round = block.number();
        let need = committee.least_quorum();
        if block.acks.len() < need {
            return Err(ConsensusError::QuorumNotReached {
                round,
                have: block.acks.len(),
                need,
            });
        }

        let first_kind = block.acks[0].kind;
        if block.acks.iter().any(|a| a.kind != first_kind) {
            return Err(ConsensusError::MixedAckKinds { round });
        }

        let expected = if parent_is_virtual || block.is_virtual() {
            AckKind::Oppose
        } else {
            AckKind::Agree
        };
        if first_kind != expected {
            return Err(ConsensusError::WrongAckKind {
                round,
                got: kind_name(first_kind),
                expected: kind_name(expected),
            });
        }

        for ack in &block.acks {
            let Some(witness) = committee.member(ack.position) else {
                return Err(ConsensusError::AckBadPosition {
                    round: ack.number,
                    position: ack.position,
                    committee_size: committee.size(),
                });
            };
            if !ack.verify(&witness.public_key) {
                return Err(ConsensusError::AckBadSignature {
                    round: ack.number,
                    position: ack.position,
                });
            }
        }
        Ok(())
    }
}

fn kind_name(kind: AckKind) -> &'static str {
    match kind {
        AckKind::Agree => "agree",
        AckKind::Oppose => "oppose",
    }
}
