//! The per-round ACK pool.
//!
//! Votes partition into `{agree, oppose}` per round. Admission checks the
//! signer's seat and signature against the round's committee; one vote per
//! seat and kind, duplicates are idempotent. Rounds are evicted once the
//! head leaves them behind the staleness window.

use crate::{Committee, ConsensusError};
use cinder_types::{AckCount, AckKind, WitnessAck};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, trace};

#[derive(Default)]
struct RoundAcks {
    agree: HashMap<u32, WitnessAck>,
    oppose: HashMap<u32, WitnessAck>,
}

/// Pool of admitted witness votes, keyed by round.
pub struct AckPool {
    stale_threshold: u64,
    rounds: BTreeMap<u64, RoundAcks>,
}

impl AckPool {
    /// Pool evicting rounds `stale_threshold` behind the head.
    pub fn new(stale_threshold: u64) -> Self {
        Self {
            stale_threshold,
            rounds: BTreeMap::new(),
        }
    }

    /// Admit a vote after seat and signature checks against `committee`
    /// (the committee of the vote's round).
    ///
    /// Returns `true` when the vote is new, `false` for an idempotent
    /// duplicate.
    pub fn insert(
        &mut self,
        ack: WitnessAck,
        committee: &Committee,
    ) -> Result<bool, ConsensusError> {
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

        let round = self.rounds.entry(ack.number).or_default();
        let slot = match ack.kind {
            AckKind::Agree => &mut round.agree,
            AckKind::Oppose => &mut round.oppose,
        };
        if slot.contains_key(&ack.position) {
            trace!(round = ack.number, position = ack.position, "duplicate ack ignored");
            return Ok(false);
        }
        slot.insert(ack.position, ack);
        trace!(
            round = ack.number,
            position = ack.position,
            kind = ?ack.kind,
            "ack admitted"
        );
        Ok(true)
    }

    /// `(agree, oppose)` tallies for a round.
    pub fn counts(&self, round: u64) -> (usize, usize) {
        self.rounds
            .get(&round)
            .map(|r| (r.agree.len(), r.oppose.len()))
            .unwrap_or((0, 0))
    }

    /// Tallies in the embeddable header form.
    pub fn count_record(&self, round: u64) -> AckCount {
        let (agree, oppose) = self.counts(round);
        AckCount {
            number: round,
            agree: agree as u32,
            oppose: oppose as u32,
        }
    }

    /// The agree votes of a round, ordered by seat.
    pub fn agree_set(&self, round: u64) -> Vec<WitnessAck> {
        self.kind_set(round, AckKind::Agree)
    }

    /// The oppose votes of a round, ordered by seat.
    pub fn oppose_set(&self, round: u64) -> Vec<WitnessAck> {
        self.kind_set(round, AckKind::Oppose)
    }

    fn kind_set(&self, round: u64, kind: AckKind) -> Vec<WitnessAck> {
        let Some(acks) = self.rounds.get(&round) else {
            return Vec::new();
        };
        let slot = match kind {
            AckKind::Agree => &acks.agree,
            AckKind::Oppose => &acks.oppose,
        };
        let mut set: Vec<WitnessAck> = slot.values().copied().collect();
        set.sort_by_key(|a| a.position);
        set
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
                "stale ack rounds evicted"
            );
        }
    }
}
