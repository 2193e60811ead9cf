//! PoW answers.
//!
//! An answer is the ticket a miner submits for a round: a nonce that, run
//! through the dataset-backed hash at the round's seal hash, lands under the
//! difficulty target. Identity is the whole tuple; duplicates within a
//! height are idempotent at the pool.

use crate::{Address, Hash};
use serde::{Deserialize, Serialize};

/// A PoW leader-selection ticket for one round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PowAnswer {
    /// The round this answer enables.
    pub number: u64,
    /// The winning nonce.
    pub nonce: u64,
    /// Mix digest produced alongside the result.
    pub mix_digest: Hash,
    /// The miner claiming the reward.
    pub miner: Address,
}

impl PowAnswer {
    /// An answer is fresh while `number + stale_threshold` is still ahead of
    /// the confirmed head.
    pub fn is_fresh(&self, head_number: u64, stale_threshold: u64) -> bool {
        self.number + stale_threshold > head_number
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use primitive_types::H256;

    fn answer(number: u64) -> PowAnswer {
        PowAnswer {
            number,
            nonce: 1,
            mix_digest: H256::zero(),
            miner: [9u8; 20],
        }
    }

    #[test]
    fn freshness_window() {
        let a = answer(3);
        assert!(a.is_fresh(3, 7));
        assert!(a.is_fresh(9, 7));
        assert!(!a.is_fresh(10, 7));
        assert!(!a.is_fresh(20, 7));
    }

    #[test]
    fn identity_is_the_tuple() {
        let mut b = answer(3);
        assert_eq!(answer(3), b);
        b.nonce = 2;
        assert_ne!(answer(3), b);
    }
}
