//! The state journal.
//!
//! An append-only list of reversible deltas. Each variant captures the
//! *previous* value for exactly the mutation it represents, and reverting a
//! suffix in LIFO order restores the pre-snapshot state byte for byte.

use crate::statedb::StateInner;
use cinder_types::Address;
use primitive_types::{H256, U256};
use std::collections::HashMap;

/// One reversible state delta.
///
/// One constructor site per mutation; dispatch happens through
/// [`JournalEntry::revert`] alone.
#[derive(Clone, Debug)]
pub enum JournalEntry {
    /// A fresh account object was created.
    CreateAccount {
        /// The created account.
        address: Address,
    },
    /// An existing account object was overwritten by re-creation.
    ResetAccount {
        /// The overwritten account.
        address: Address,
        /// The full prior object.
        prev: Box<crate::AccountObject>,
    },
    /// An account self-destructed.
    Suicide {
        /// The destructed account.
        address: Address,
        /// Prior destruction flag.
        prev_destructed: bool,
        /// Balance before it was zeroed.
        prev_balance: U256,
    },
    /// Balance changed.
    BalanceChange {
        /// The mutated account.
        address: Address,
        /// Balance before the change.
        prev: U256,
    },
    /// Nonce changed.
    NonceChange {
        /// The mutated account.
        address: Address,
        /// Nonce before the change.
        prev: u64,
    },
    /// Code changed.
    CodeChange {
        /// The mutated account.
        address: Address,
        /// Code before the change.
        prev: Vec<u8>,
    },
    /// A storage slot changed.
    StorageChange {
        /// The mutated account.
        address: Address,
        /// The slot key.
        key: H256,
        /// Prior value; `None` when the slot was absent.
        prev: Option<H256>,
    },
    /// An address entered the access list.
    AccessListAddAccount {
        /// The added address.
        address: Address,
    },
    /// A slot entered the access list.
    AccessListAddSlot {
        /// The slot owner.
        address: Address,
        /// The slot key.
        key: H256,
    },
}

impl JournalEntry {
    /// Undo this delta against `state`.
    pub(crate) fn revert(&self, state: &mut StateInner) {
        match self {
            Self::CreateAccount { address } => {
                state.accounts.remove(address);
            }
            Self::ResetAccount { address, prev } => {
                state.accounts.insert(*address, (**prev).clone());
            }
            Self::Suicide {
                address,
                prev_destructed,
                prev_balance,
            } => {
                if let Some(account) = state.accounts.get_mut(address) {
                    account.destructed = *prev_destructed;
                    account.balance = *prev_balance;
                }
            }
            Self::BalanceChange { address, prev } => {
                if let Some(account) = state.accounts.get_mut(address) {
                    account.balance = *prev;
                }
            }
            Self::NonceChange { address, prev } => {
                if let Some(account) = state.accounts.get_mut(address) {
                    account.nonce = *prev;
                }
            }
            Self::CodeChange { address, prev } => {
                if let Some(account) = state.accounts.get_mut(address) {
                    account.code = prev.clone();
                }
            }
            Self::StorageChange { address, key, prev } => {
                if let Some(account) = state.accounts.get_mut(address) {
                    match prev {
                        Some(value) => {
                            account.storage.insert(*key, *value);
                        }
                        None => {
                            account.storage.remove(key);
                        }
                    }
                }
            }
            Self::AccessListAddAccount { address } => {
                state.access_accounts.remove(address);
            }
            Self::AccessListAddSlot { address, key } => {
                state.access_slots.remove(&(*address, *key));
            }
        }
    }

    /// The account this delta dirtied, if any.
    pub(crate) fn dirtied(&self) -> Option<Address> {
        match self {
            Self::CreateAccount { address }
            | Self::ResetAccount { address, .. }
            | Self::Suicide { address, .. }
            | Self::BalanceChange { address, .. }
            | Self::NonceChange { address, .. }
            | Self::CodeChange { address, .. }
            | Self::StorageChange { address, .. } => Some(*address),
            Self::AccessListAddAccount { .. } | Self::AccessListAddSlot { .. } => None,
        }
    }
}

/// Append-only delta list with per-account dirty refcounts.
#[derive(Default)]
pub struct Journal {
    entries: Vec<JournalEntry>,
    dirties: HashMap<Address, usize>,
}

impl Journal {
    /// Empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a delta, bumping the dirty refcount of the touched account.
    pub fn append(&mut self, entry: JournalEntry) {
        if let Some(address) = entry.dirtied() {
            *self.dirties.entry(address).or_insert(0) += 1;
        }
        self.entries.push(entry);
    }

    /// Current length; doubles as the snapshot cursor.
    pub fn length(&self) -> usize {
        self.entries.len()
    }

    /// Accounts with at least one unreverted delta.
    pub fn dirty_accounts(&self) -> impl Iterator<Item = &Address> {
        self.dirties.keys()
    }

    /// Undo every delta past `snapshot`, newest first, and truncate.
    pub fn revert(&mut self, state: &mut StateInner, snapshot: usize) {
        for entry in self.entries[snapshot..].iter().rev() {
            entry.revert(state);
            if let Some(address) = entry.dirtied() {
                if let Some(count) = self.dirties.get_mut(&address) {
                    *count -= 1;
                    if *count == 0 {
                        self.dirties.remove(&address);
                    }
                }
            }
        }
        self.entries.truncate(snapshot);
    }

    /// Drop all deltas; used after a successful commit.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.dirties.clear();
    }
}
