//! Account objects.

use cinder_crypto::keccak256;
use cinder_types::Hash;
use primitive_types::{H256, U256};
use std::collections::HashMap;

/// Mutable account state held by [`crate::StateDb`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccountObject {
    /// Account balance in base units.
    pub balance: U256,
    /// Number of transactions sent from this account.
    pub nonce: u64,
    /// Contract code; empty for plain accounts.
    pub code: Vec<u8>,
    /// Contract storage slots. Zero-valued slots are absent.
    pub storage: HashMap<H256, H256>,
    /// Set when the account self-destructed in the current block; the
    /// object is dropped at commit.
    pub destructed: bool,
}

impl AccountObject {
    /// Fresh account with a starting balance.
    pub fn with_balance(balance: U256) -> Self {
        Self {
            balance,
            ..Default::default()
        }
    }

    /// Deterministic byte commitment of this account, folded into the
    /// state root.
    pub fn commitment(&self) -> Hash {
        let mut buf = Vec::with_capacity(32 + 8 + self.code.len() + self.storage.len() * 64);
        let mut balance_bytes = [0u8; 32];
        self.balance.to_big_endian(&mut balance_bytes);
        buf.extend_from_slice(&balance_bytes);
        buf.extend_from_slice(&self.nonce.to_be_bytes());
        buf.extend_from_slice(&self.code);

        let mut slots: Vec<(&H256, &H256)> = self
            .storage
            .iter()
            .filter(|(_, value)| !value.is_zero())
            .collect();
        slots.sort_by_key(|(key, _)| *key);
        for (key, value) in slots {
            buf.extend_from_slice(key.as_bytes());
            buf.extend_from_slice(value.as_bytes());
        }
        H256(keccak256(&buf))
    }

    /// True when the account carries no balance, nonce, or code.
    pub fn is_empty(&self) -> bool {
        self.balance.is_zero() && self.nonce == 0 && self.code.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commitment_ignores_zero_slots() {
        let mut a = AccountObject::with_balance(U256::from(10));
        let mut b = a.clone();
        b.storage.insert(H256::repeat_byte(1), H256::zero());
        assert_eq!(a.commitment(), b.commitment());

        a.storage.insert(H256::repeat_byte(1), H256::repeat_byte(2));
        assert_ne!(a.commitment(), b.commitment());
    }

    #[test]
    fn commitment_tracks_nonce() {
        let a = AccountObject::default();
        let mut b = a.clone();
        b.nonce = 1;
        assert_ne!(a.commitment(), b.commitment());
    }
}
