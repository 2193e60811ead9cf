//! Seal verification.
//!
//! Two surfaces: single answers (pool admission and remote submissions)
//! and committed headers (every embedded answer must hold under the
//! header's own difficulty, with the pre-image miner substituted per
//! answer).

use crate::dataset::DatasetCache;
use crate::hasher::{hashimoto, meets_target, seal_input};
use crate::PowError;
use cinder_types::{Hash, Header, PowAnswer};
use primitive_types::U256;
use tracing::warn;

/// Check one answer against the round it claims.
///
/// `parent_hash` and `difficulty` come from the verifier's own chain view
/// for that round. The mix digest must match the recomputed fold and the
/// result must land under the target.
pub fn verify_answer(
    datasets: &DatasetCache,
    parent_hash: Hash,
    difficulty: U256,
    answer: &PowAnswer,
) -> Result<(), PowError> {
    if difficulty.is_zero() {
        return Err(PowError::ZeroDifficulty);
    }
    let dataset = datasets.for_number(answer.number);
    let seal = seal_input(parent_hash, answer.number, answer.miner);
    let (mix_digest, result) = hashimoto(&dataset, seal, answer.nonce);

    if mix_digest != answer.mix_digest || !meets_target(result, difficulty) {
        warn!(number = answer.number, nonce = answer.nonce, "invalid seal result");
        return Err(PowError::InvalidSealResult {
            number: answer.number,
        });
    }
    Ok(())
}

/// Check a committed header's PoW content.
///
/// Answers are mined against the target of the round's *parent* (the
/// pending round's difficulty is not fixed until commit), so the caller
/// passes `parent_difficulty` from its chain view. Every embedded answer is
/// re-derived with the header's parent hash and the answer's own miner in
/// the pre-image, and the header's `nonce` / `mix_digest` must equal the
/// latest embedded answer's.
pub fn verify_seal(
    datasets: &DatasetCache,
    header: &Header,
    parent_difficulty: U256,
) -> Result<(), PowError> {
    if parent_difficulty.is_zero() {
        return Err(PowError::ZeroDifficulty);
    }
    let Some(latest) = header.pow_answers.last() else {
        return Err(PowError::MissingAnswer {
            number: header.number,
        });
    };

    for answer in &header.pow_answers {
        verify_answer(datasets, header.parent_hash, parent_difficulty, answer)?;
    }

    if header.nonce != latest.nonce || header.mix_digest != latest.mix_digest {
        return Err(PowError::InvalidSealResult {
            number: header.number,
        });
    }
    Ok(())
}
