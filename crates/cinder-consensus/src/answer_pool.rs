//! The per-round answer pool.
//!
//! Validated PoW answers keyed by the round they enable. Identity is the
//! whole answer tuple, so a gossip storm of the same answer collapses to a
//! single entry. Arrival order is preserved per round; the latest arrival
//! is what gets embedded in a header.

use cinder_types::PowAnswer;
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Pool of admitted answers, keyed by round.
pub struct AnswerPool {
    stale_threshold: u64,
    rounds: BTreeMap<u64, Vec<PowAnswer>>,
}

impl AnswerPool {
    /// Pool evicting rounds `stale_threshold` behind the head.
    pub fn new(stale_threshold: u64) -> Self {
        Self {
            stale_threshold,
            rounds: BTreeMap::new(),
        }
    }

    /// Whether an answer for `round` would still be fresh at `head_number`.
    pub fn is_fresh(&self, round: u64, head_number: u64) -> bool {
        round + self.stale_threshold > head_number
    }

    /// Admit an answer. Seal validity is the caller's concern (the sketchy
    /// check plus, where required, full verification); the pool enforces
    /// freshness and idempotency.
    ///
    /// Returns `true` when the answer is new.
    pub fn insert(&mut self, answer: PowAnswer, head_number: u64) -> bool {
        if !answer.is_fresh(head_number, self.stale_threshold) {
            trace!(round = answer.number, head = head_number, "stale answer dropped");
            return false;
        }
        let round = self.rounds.entry(answer.number).or_default();
        if round.contains(&answer) {
            trace!(round = answer.number, nonce = answer.nonce, "duplicate answer ignored");
            return false;
        }
        round.push(answer);
        trace!(round = answer.number, nonce = answer.nonce, "answer admitted");
        true
    }

    /// Number of distinct answers for one round.
    pub fn count(&self, round: u64) -> usize {
        self.rounds.get(&round).map(Vec::len).unwrap_or(0)
    }

    /// Distinct answers across rounds `from..=to`.
    pub fn count_range(&self, from: u64, to: u64) -> usize {
        self.rounds
            .range(from..=to)
            .map(|(_, answers)| answers.len())
            .sum()
    }

    /// All answers of a round in arrival order.
    pub fn answers(&self, round: u64) -> Vec<PowAnswer> {
        self.rounds.get(&round).cloned().unwrap_or_default()
    }

    /// The latest-arrived answer of a round.
    pub fn latest(&self, round: u64) -> Option<PowAnswer> {
        self.rounds.get(&round).and_then(|a| a.last().copied())
    }

    /// Drop rounds the head has left behind.
    pub fn evict(&mut self, head_number: u64) {
        let before = self.rounds.len();
        let stale_threshold = self.stale_threshold;
        self.rounds
            .retain(|round, _| round + stale_threshold > head_number);
        if self.rounds.len() != before {
            debug!(
                evicted = before - self.rounds.len(),
                head = head_number,
                "stale answer rounds evicted"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use primitive_types::H256;

    fn answer(number: u64, nonce: u64) -> PowAnswer {
        PowAnswer {
            number,
            nonce,
            mix_digest: H256::repeat_byte(nonce as u8),
            miner: [1u8; 20],
        }
    }

    #[test]
    fn duplicate_storm_collapses_to_one() {
        let mut pool = AnswerPool::new(7);
        let a = answer(1, 7);
        let mut admitted = 0;
        for _ in 0..50 {
            if pool.insert(a, 0) {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 1);
        assert_eq!(pool.count(1), 1);
    }

    #[test]
    fn stale_answers_are_refused() {
        let mut pool = AnswerPool::new(7);
        assert!(!pool.insert(answer(1, 1), 8));
        assert!(pool.insert(answer(2, 1), 8));
    }

    #[test]
    fn latest_tracks_arrival_order() {
        let mut pool = AnswerPool::new(7);
        pool.insert(answer(1, 10), 0);
        pool.insert(answer(1, 20), 0);
        assert_eq!(pool.latest(1).unwrap().nonce, 20);
        assert_eq!(pool.count(1), 2);
    }

    #[test]
    fn range_count_spans_rounds() {
        let mut pool = AnswerPool::new(7);
        pool.insert(answer(1, 1), 0);
        pool.insert(answer(2, 1), 0);
        pool.insert(answer(2, 2), 0);
        pool.insert(answer(4, 1), 0);
        assert_eq!(pool.count_range(1, 2), 3);
        assert_eq!(pool.count_range(3, 4), 1);
    }

    #[test]
    fn eviction_respects_threshold() {
        let mut pool = AnswerPool::new(7);
        pool.insert(answer(1, 1), 0);
        pool.insert(answer(5, 1), 0);

        pool.evict(8);
        assert_eq!(pool.count(1), 0);
        assert_eq!(pool.count(5), 1);
    }
}
