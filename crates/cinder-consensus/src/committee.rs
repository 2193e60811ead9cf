//! Witness committees.
//!
//! A committee is the ordered witness set valid at one height, derived from
//! a state snapshot. It is an immutable value: quorum thresholds and the
//! proposer rotation are computed from it on demand, never cached in
//! mutable globals.

use crate::ConsensusError;
use cinder_crypto::{keccak256, WitnessPublicKey};
use cinder_types::Address;
use std::sync::Arc;

/// Derive the account address of a witness key.
pub fn address_from_pubkey(public_key: &WitnessPublicKey) -> Address {
    let digest = keccak256(public_key.as_bytes());
    let mut address = [0u8; 20];
    address.copy_from_slice(&digest[12..]);
    address
}

/// One seated witness.
#[derive(Clone, Debug)]
pub struct Witness {
    /// Account address of the witness.
    pub address: Address,
    /// Signing key the witness's ACKs verify under.
    pub public_key: WitnessPublicKey,
}

impl Witness {
    /// Witness whose address derives from its key.
    pub fn from_key(public_key: WitnessPublicKey) -> Self {
        Self {
            address: address_from_pubkey(&public_key),
            public_key,
        }
    }
}

/// The ordered witness set valid at one height.
#[derive(Clone, Debug)]
pub struct Committee {
    members: Vec<Witness>,
}

impl Committee {
    /// Build a committee; the member order is the rotation order.
    pub fn new(members: Vec<Witness>) -> Result<Self, ConsensusError> {
        if members.is_empty() {
            return Err(ConsensusError::EmptyCommittee);
        }
        Ok(Self { members })
    }

    /// Committee size `N`.
    pub fn size(&self) -> usize {
        self.members.len()
    }

    /// Supermajority threshold: `2N/3 + 1`.
    pub fn most_quorum(&self) -> usize {
        self.members.len() * 2 / 3 + 1
    }

    /// Simple-majority threshold: `N/2 + 1`.
    pub fn least_quorum(&self) -> usize {
        self.members.len() / 2 + 1
    }

    /// Member seated at `position`.
    pub fn member(&self, position: u32) -> Option<&Witness> {
        self.members.get(position as usize)
    }

    /// All members in rotation order.
    pub fn members(&self) -> &[Witness] {
        &self.members
    }

    /// Position of `address` in this committee.
    pub fn position_of(&self, address: &Address) -> Option<u32> {
        self.members
            .iter()
            .position(|w| &w.address == address)
            .map(|p| p as u32)
    }

    /// Whether `address` sits in this committee.
    pub fn contains(&self, address: &Address) -> bool {
        self.position_of(address).is_some()
    }

    /// The witness that must assemble the block at `height`, assuming this
    /// committee is `W(height - 1)`: seat `(height - 1) mod N`.
    pub fn proposer_for(&self, height: u64) -> &Witness {
        let index = ((height.saturating_sub(1)) % self.members.len() as u64) as usize;
        &self.members[index]
    }
}

/// Source of per-height committee snapshots.
pub trait CommitteeProvider: Send + Sync {
    /// Committee `W(height)`.
    fn committee_at(&self, height: u64) -> Arc<Committee>;
}

/// Fixed committee for every height. Covers chains whose witness set is
/// seeded at genesis; an election-backed provider derives snapshots from
/// state instead.
pub struct StaticCommitteeProvider {
    committee: Arc<Committee>,
}

impl StaticCommitteeProvider {
    /// Provider always answering with `committee`.
    pub fn new(committee: Committee) -> Self {
        Self {
            committee: Arc::new(committee),
        }
    }
}

impl CommitteeProvider for StaticCommitteeProvider {
    fn committee_at(&self, _height: u64) -> Arc<Committee> {
        Arc::clone(&self.committee)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinder_crypto::WitnessKeypair;

    fn committee(size: u8) -> Committee {
        let members = (0..size)
            .map(|i| Witness::from_key(WitnessKeypair::from_seed([i + 1; 32]).public_key()))
            .collect();
        Committee::new(members).unwrap()
    }

    #[test]
    fn quorum_thresholds_for_three() {
        let c = committee(3);
        assert_eq!(c.most_quorum(), 3);
        assert_eq!(c.least_quorum(), 2);
    }

    #[test]
    fn quorum_thresholds_for_seven() {
        let c = committee(7);
        assert_eq!(c.most_quorum(), 5);
        assert_eq!(c.least_quorum(), 4);
    }

    #[test]
    fn proposer_rotates_in_order() {
        let c = committee(3);
        let a = c.members()[0].address;
        let b = c.members()[1].address;
        let third = c.members()[2].address;

        assert_eq!(c.proposer_for(1).address, a);
        assert_eq!(c.proposer_for(2).address, b);
        assert_eq!(c.proposer_for(3).address, third);
        assert_eq!(c.proposer_for(4).address, a);
    }

    #[test]
    fn empty_committee_is_rejected() {
        assert!(matches!(
            Committee::new(vec![]),
            Err(ConsensusError::EmptyCommittee)
        ));
    }

    #[test]
    fn position_lookup() {
        let c = committee(3);
        let b = c.members()[1].address;
        assert_eq!(c.position_of(&b), Some(1));
        assert!(!c.contains(&[0xffu8; 20]));
    }
}
