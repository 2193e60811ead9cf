//! The pure hash core.
//!
//! `hashimoto` folds dataset rows into a mix digest and derives the
//! target-checked result. It is deterministic on its inputs and mutates
//! neither the dataset nor the seal input.

use crate::dataset::Dataset;
use cinder_crypto::keccak256_concat;
use cinder_types::{Address, Hash};
use primitive_types::{H256, U256};

/// Dataset rows folded per hash attempt.
const HASHIMOTO_ROUNDS: usize = 32;

/// The PoW pre-image for one round.
///
/// Answers are found before the block they enable exists, so the pre-image
/// covers only what every node already agrees on: the parent hash, the
/// round number, and the claiming miner. Substituting the miner is what
/// binds an answer to its reward address.
pub fn seal_input(parent_hash: Hash, number: u64, miner: Address) -> Hash {
    H256(keccak256_concat(&[
        parent_hash.as_bytes(),
        &number.to_be_bytes(),
        &miner,
    ]))
}

/// Run the dataset-backed hash for one `(seal, nonce)` attempt.
///
/// Returns `(mix_digest, result)`: the mix commits to the dataset rows the
/// attempt walked, the result is compared against the difficulty target.
pub fn hashimoto(dataset: &Dataset, seal: Hash, nonce: u64) -> (Hash, Hash) {
    let mut digest = keccak256_concat(&[seal.as_bytes(), &nonce.to_le_bytes()]);

    for _ in 0..HASHIMOTO_ROUNDS {
        let index = u64::from_le_bytes(digest[..8].try_into().expect("digest has 32 bytes"));
        digest = keccak256_concat(&[&digest, dataset.row(index)]);
    }

    let mix_digest = H256(digest);
    let result = H256(keccak256_concat(&[seal.as_bytes(), &digest]));
    (mix_digest, result)
}

/// The boundary a result must stay under: `2^256 / difficulty`.
pub fn target_from_difficulty(difficulty: U256) -> U256 {
    if difficulty.is_zero() {
        return U256::MAX;
    }
    U256::MAX / difficulty
}

/// Target check for a hash result.
pub fn meets_target(result: Hash, difficulty: U256) -> bool {
    U256::from_big_endian(result.as_bytes()) <= target_from_difficulty(difficulty)
}
