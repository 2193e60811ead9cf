//! The journaled state database.
//!
//! Snapshot/revert follows the revision-id pattern: `snapshot()` hands out
//! a monotonically increasing id bound to the current journal length, and
//! `revert_to_snapshot(id)` unwinds every younger delta. Ids from an
//! abandoned branch become invalid once an older id is reverted to.

use crate::account::AccountObject;
use crate::journal::{Journal, JournalEntry};
use crate::StateError;
use cinder_crypto::keccak256;
use cinder_types::{Address, Hash};
use primitive_types::{H256, U256};
use std::collections::{HashMap, HashSet};
use tracing::trace;

/// The raw account map the journal mutates. Split from [`StateDb`] so the
/// journal can revert against it while the journal itself is borrowed.
#[derive(Clone, Default)]
pub struct StateInner {
    pub(crate) accounts: HashMap<Address, AccountObject>,
    pub(crate) access_accounts: HashSet<Address>,
    pub(crate) access_slots: HashSet<(Address, H256)>,
}

/// Journaled account state.
pub struct StateDb {
    inner: StateInner,
    journal: Journal,
    valid_revisions: Vec<(usize, usize)>,
    next_revision_id: usize,
}

impl StateDb {
    /// Empty state.
    pub fn new() -> Self {
        Self {
            inner: StateInner::default(),
            journal: Journal::new(),
            valid_revisions: Vec::new(),
            next_revision_id: 0,
        }
    }

    /// State pre-seeded with balances, used by genesis allocation.
    pub fn with_alloc(alloc: impl IntoIterator<Item = (Address, U256)>) -> Self {
        let mut db = Self::new();
        for (address, balance) in alloc {
            db.inner
                .accounts
                .insert(address, AccountObject::with_balance(balance));
        }
        db
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// True when the account object exists.
    pub fn exists(&self, address: &Address) -> bool {
        self.inner.accounts.contains_key(address)
    }

    /// Balance, zero for absent accounts.
    pub fn balance(&self, address: &Address) -> U256 {
        self.inner
            .accounts
            .get(address)
            .map(|a| a.balance)
            .unwrap_or_default()
    }

    /// Nonce, zero for absent accounts.
    pub fn nonce(&self, address: &Address) -> u64 {
        self.inner
            .accounts
            .get(address)
            .map(|a| a.nonce)
            .unwrap_or_default()
    }

    /// Code, empty for absent accounts.
    pub fn code(&self, address: &Address) -> Vec<u8> {
        self.inner
            .accounts
            .get(address)
            .map(|a| a.code.clone())
            .unwrap_or_default()
    }

    /// Storage slot value, zero for absent slots.
    pub fn storage(&self, address: &Address, key: &H256) -> H256 {
        self.inner
            .accounts
            .get(address)
            .and_then(|a| a.storage.get(key).copied())
            .unwrap_or_default()
    }

    /// Whether the account self-destructed in the current block.
    pub fn is_destructed(&self, address: &Address) -> bool {
        self.inner
            .accounts
            .get(address)
            .map(|a| a.destructed)
            .unwrap_or(false)
    }

    // ------------------------------------------------------------------
    // Writes (each appends exactly one journal delta)
    // ------------------------------------------------------------------

    /// Create a fresh account object. Re-creating an existing account
    /// journals the full prior object so revert restores it.
    pub fn create_account(&mut self, address: Address) {
        match self.inner.accounts.get(&address) {
            Some(prev) => {
                self.journal.append(JournalEntry::ResetAccount {
                    address,
                    prev: Box::new(prev.clone()),
                });
                self.inner.accounts.insert(address, AccountObject::default());
            }
            None => {
                self.journal.append(JournalEntry::CreateAccount { address });
                self.inner.accounts.insert(address, AccountObject::default());
            }
        }
    }

    fn ensure_account(&mut self, address: &Address) {
        if !self.inner.accounts.contains_key(address) {
            self.journal
                .append(JournalEntry::CreateAccount { address: *address });
            self.inner
                .accounts
                .insert(*address, AccountObject::default());
        }
    }

    /// Add to the balance, creating the account if needed.
    pub fn add_balance(&mut self, address: &Address, amount: U256) {
        self.ensure_account(address);
        let account = self.inner.accounts.get_mut(address).expect("just ensured");
        self.journal.append(JournalEntry::BalanceChange {
            address: *address,
            prev: account.balance,
        });
        account.balance = account.balance.saturating_add(amount);
    }

    /// Subtract from the balance.
    ///
    /// # Errors
    /// [`StateError::InsufficientBalance`] when funds do not cover `amount`;
    /// the state is untouched in that case.
    pub fn sub_balance(&mut self, address: &Address, amount: U256) -> Result<(), StateError> {
        let balance = self.balance(address);
        if balance < amount {
            return Err(StateError::InsufficientBalance {
                address: hex::encode(address),
                have: balance,
                need: amount,
            });
        }
        self.ensure_account(address);
        let account = self.inner.accounts.get_mut(address).expect("just ensured");
        self.journal.append(JournalEntry::BalanceChange {
            address: *address,
            prev: account.balance,
        });
        account.balance = balance - amount;
        Ok(())
    }

    /// Set the nonce.
    pub fn set_nonce(&mut self, address: &Address, nonce: u64) {
        self.ensure_account(address);
        let account = self.inner.accounts.get_mut(address).expect("just ensured");
        self.journal.append(JournalEntry::NonceChange {
            address: *address,
            prev: account.nonce,
        });
        account.nonce = nonce;
    }

    /// Replace the code.
    pub fn set_code(&mut self, address: &Address, code: Vec<u8>) {
        self.ensure_account(address);
        let account = self.inner.accounts.get_mut(address).expect("just ensured");
        self.journal.append(JournalEntry::CodeChange {
            address: *address,
            prev: std::mem::take(&mut account.code),
        });
        account.code = code;
    }

    /// Write a storage slot.
    pub fn set_storage(&mut self, address: &Address, key: H256, value: H256) {
        self.ensure_account(address);
        let account = self.inner.accounts.get_mut(address).expect("just ensured");
        let prev = account.storage.get(&key).copied();
        self.journal.append(JournalEntry::StorageChange {
            address: *address,
            key,
            prev,
        });
        if value.is_zero() {
            account.storage.remove(&key);
        } else {
            account.storage.insert(key, value);
        }
    }

    /// Mark the account destructed and zero its balance. Returns whether
    /// the account existed.
    pub fn suicide(&mut self, address: &Address) -> bool {
        let Some(account) = self.inner.accounts.get_mut(address) else {
            return false;
        };
        self.journal.append(JournalEntry::Suicide {
            address: *address,
            prev_destructed: account.destructed,
            prev_balance: account.balance,
        });
        account.destructed = true;
        account.balance = U256::zero();
        true
    }

    /// Add an address to the access list; idempotent.
    pub fn access_list_add_account(&mut self, address: Address) {
        if self.inner.access_accounts.insert(address) {
            self.journal
                .append(JournalEntry::AccessListAddAccount { address });
        }
    }

    /// Add a slot to the access list; idempotent.
    pub fn access_list_add_slot(&mut self, address: Address, key: H256) {
        if self.inner.access_slots.insert((address, key)) {
            self.journal
                .append(JournalEntry::AccessListAddSlot { address, key });
        }
    }

    /// Access-list membership for an address.
    pub fn access_list_contains(&self, address: &Address) -> bool {
        self.inner.access_accounts.contains(address)
    }

    // ------------------------------------------------------------------
    // Snapshot / revert / commit
    // ------------------------------------------------------------------

    /// Take a snapshot and return its id.
    pub fn snapshot(&mut self) -> usize {
        let id = self.next_revision_id;
        self.next_revision_id += 1;
        self.valid_revisions.push((id, self.journal.length()));
        id
    }

    /// Revert every delta recorded after `id` was taken.
    ///
    /// # Panics
    /// Panics when `id` is unknown or already reverted past; that is a
    /// programming error in the applier, not a runtime condition.
    pub fn revert_to_snapshot(&mut self, id: usize) {
        let index = self
            .valid_revisions
            .iter()
            .position(|(rev_id, _)| *rev_id == id)
            .unwrap_or_else(|| panic!("revision id {id} cannot be reverted"));
        let journal_len = self.valid_revisions[index].1;

        self.journal.revert(&mut self.inner, journal_len);
        self.valid_revisions.truncate(index);
        trace!(revision = id, journal_len, "state reverted to snapshot");
    }

    /// Commit the state: drop destructed accounts, clear the journal, and
    /// return the deterministic root over the surviving account set.
    pub fn commit(&mut self) -> Hash {
        self.inner.accounts.retain(|_, account| !account.destructed);
        self.journal.reset();
        self.valid_revisions.clear();
        self.root()
    }

    /// Deterministic commitment over the current account set, computed
    /// without mutating anything.
    pub fn root(&self) -> Hash {
        let mut entries: Vec<(&Address, &AccountObject)> = self.inner.accounts.iter().collect();
        entries.sort_by_key(|(address, _)| **address);

        let mut buf = Vec::with_capacity(entries.len() * 52);
        for (address, account) in entries {
            buf.extend_from_slice(address);
            buf.extend_from_slice(account.commitment().as_bytes());
        }
        H256(keccak256(&buf))
    }

    /// Full-state fingerprint including in-flight (uncommitted) data; the
    /// byte-equivalence oracle used by the revert tests.
    pub fn fingerprint(&self) -> Hash {
        let mut entries: Vec<(&Address, &AccountObject)> = self.inner.accounts.iter().collect();
        entries.sort_by_key(|(address, _)| **address);

        let mut buf = Vec::new();
        for (address, account) in entries {
            buf.extend_from_slice(address);
            buf.push(account.destructed as u8);
            buf.extend_from_slice(account.commitment().as_bytes());
        }
        let mut access: Vec<&Address> = self.inner.access_accounts.iter().collect();
        access.sort();
        for address in access {
            buf.extend_from_slice(address.as_slice());
        }
        let mut slots: Vec<&(Address, H256)> = self.inner.access_slots.iter().collect();
        slots.sort();
        for (address, key) in slots {
            buf.extend_from_slice(address);
            buf.extend_from_slice(key.as_bytes());
        }
        H256(keccak256(&buf))
    }

    /// Deep copy handed to the chain writer so a later round cannot race
    /// the commit.
    pub fn deep_copy(&self) -> StateDb {
        StateDb {
            inner: self.inner.clone(),
            journal: Journal::new(),
            valid_revisions: Vec::new(),
            next_revision_id: 0,
        }
    }

    /// Number of dirty accounts in the live journal (test hook).
    pub fn journal_dirty_count(&self) -> usize {
        self.journal.dirty_accounts().count()
    }
}

impl Default for StateDb {
    fn default() -> Self {
        Self::new()
    }
}
