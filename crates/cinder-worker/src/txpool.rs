//! The transaction pool view.
//!
//! Admission keeps one transaction per `(sender, nonce)` and remembers
//! committed pairs so nothing is ever committed twice. The block-assembly
//! side consumes a [`PendingOrdered`] iterator: best gas tip first, nonces
//! sequential within a sender, locally-submitted accounts drained before
//! remote ones.

use cinder_types::{Address, SignedTransaction};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use thiserror::Error;
use tracing::trace;

/// Admission errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TxPoolError {
    /// The `(sender, nonce)` pair was already committed to the chain.
    #[error("nonce {nonce} of sender {sender} is already committed")]
    AlreadyCommitted {
        /// Hex-encoded sender.
        sender: String,
        /// The spent nonce.
        nonce: u64,
    },

    /// A pending transaction with the same `(sender, nonce)` carries an
    /// equal or better tip.
    #[error("pending transaction with nonce {nonce} not replaced: tip too low")]
    Underpriced {
        /// The contested nonce.
        nonce: u64,
    },
}

/// Pending transactions with local/remote segregation.
pub struct TxPool {
    by_sender: HashMap<Address, BTreeMap<u64, SignedTransaction>>,
    locals: HashSet<Address>,
    committed: HashSet<(Address, u64)>,
}

impl TxPool {
    /// Empty pool.
    pub fn new() -> Self {
        Self {
            by_sender: HashMap::new(),
            locals: HashSet::new(),
            committed: HashSet::new(),
        }
    }

    /// Mark an account as locally owned; its transactions are drained
    /// first during assembly.
    pub fn mark_local(&mut self, address: Address) {
        self.locals.insert(address);
    }

    /// Admit a transaction. Same-nonce replacement requires a strictly
    /// higher tip.
    pub fn add(&mut self, tx: SignedTransaction) -> Result<(), TxPoolError> {
        if self.committed.contains(&(tx.from, tx.nonce)) {
            return Err(TxPoolError::AlreadyCommitted {
                sender: hex::encode(tx.from),
                nonce: tx.nonce,
            });
        }
        let account = self.by_sender.entry(tx.from).or_default();
        if let Some(existing) = account.get(&tx.nonce) {
            if existing.gas_tip >= tx.gas_tip {
                return Err(TxPoolError::Underpriced { nonce: tx.nonce });
            }
        }
        trace!(sender = %hex::encode(tx.from), nonce = tx.nonce, "transaction admitted");
        account.insert(tx.nonce, tx);
        Ok(())
    }

    /// Number of pending transactions.
    pub fn len(&self) -> usize {
        self.by_sender.values().map(BTreeMap::len).sum()
    }

    /// True when nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.by_sender.values().all(BTreeMap::is_empty)
    }

    /// Snapshot the pending set split into `(locals, remotes)` iterators
    /// for assembly.
    pub fn pending(&self) -> (PendingOrdered, PendingOrdered) {
        let mut local_groups: HashMap<Address, Vec<SignedTransaction>> = HashMap::new();
        let mut remote_groups: HashMap<Address, Vec<SignedTransaction>> = HashMap::new();

        for (sender, txs) in &self.by_sender {
            if txs.is_empty() {
                continue;
            }
            let group: Vec<SignedTransaction> = txs.values().cloned().collect();
            if self.locals.contains(sender) {
                local_groups.insert(*sender, group);
            } else {
                remote_groups.insert(*sender, group);
            }
        }
        (
            PendingOrdered::new(local_groups),
            PendingOrdered::new(remote_groups),
        )
    }

    /// Record committed transactions: drop them from the pending set and
    /// lock their `(sender, nonce)` pairs forever.
    pub fn finalize_committed(&mut self, txs: &[SignedTransaction]) {
        for tx in txs {
            self.committed.insert((tx.from, tx.nonce));
            if let Some(account) = self.by_sender.get_mut(&tx.from) {
                account.remove(&tx.nonce);
                if account.is_empty() {
                    self.by_sender.remove(&tx.from);
                }
            }
        }
    }
}

impl Default for TxPool {
    fn default() -> Self {
        Self::new()
    }
}

/// Ordered pending view: one candidate per sender, best tip first,
/// advancing through each sender's nonces.
pub struct PendingOrdered {
    /// Current best transaction per sender, sorted by tip descending.
    heads: Vec<SignedTransaction>,
    /// Remaining transactions per sender, nonce ascending.
    tails: HashMap<Address, VecDeque<SignedTransaction>>,
}

impl PendingOrdered {
    /// Build from per-sender groups (each nonce-ascending).
    pub fn new(groups: HashMap<Address, Vec<SignedTransaction>>) -> Self {
        let mut ordered = Self {
            heads: Vec::with_capacity(groups.len()),
            tails: HashMap::new(),
        };
        let mut senders: Vec<Address> = groups.keys().copied().collect();
        senders.sort();
        let mut groups = groups;
        for sender in senders {
            let mut queue: VecDeque<SignedTransaction> =
                groups.remove(&sender).unwrap_or_default().into();
            if let Some(head) = queue.pop_front() {
                ordered.insert_head(head);
                ordered.tails.insert(sender, queue);
            }
        }
        ordered
    }

    /// Stable descending insert: the new head lands before the first
    /// existing entry with a strictly lower tip, so equal tips keep their
    /// arrival order.
    fn insert_head(&mut self, tx: SignedTransaction) {
        let at = self
            .heads
            .iter()
            .position(|existing| existing.gas_tip < tx.gas_tip)
            .unwrap_or(self.heads.len());
        self.heads.insert(at, tx);
    }

    /// The best pending transaction, if any.
    pub fn peek(&self) -> Option<&SignedTransaction> {
        self.heads.first()
    }

    /// Consume the current best and advance within its sender's queue.
    pub fn shift(&mut self) {
        if self.heads.is_empty() {
            return;
        }
        let done = self.heads.remove(0);
        if let Some(queue) = self.tails.get_mut(&done.from) {
            if let Some(next) = queue.pop_front() {
                // Only strictly sequential nonces keep the account in play.
                if next.nonce == done.nonce + 1 {
                    self.insert_head(next);
                } else {
                    self.tails.remove(&done.from);
                }
            }
        }
    }

    /// Drop the current best and its sender's whole queue.
    pub fn pop(&mut self) {
        if self.heads.is_empty() {
            return;
        }
        let dropped = self.heads.remove(0);
        self.tails.remove(&dropped.from);
    }

    /// True when no candidates remain.
    pub fn is_empty(&self) -> bool {
        self.heads.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinder_types::TxKind;
    use primitive_types::U256;

    fn tx(sender: u8, nonce: u64, tip: u64) -> SignedTransaction {
        SignedTransaction {
            kind: TxKind::Transfer,
            from: [sender; 20],
            to: Some([0xaa; 20]),
            nonce,
            value: U256::from(1),
            gas_limit: 21_000,
            gas_tip: U256::from(tip),
            data: vec![],
        }
    }

    #[test]
    fn committed_pairs_are_locked_out() {
        let mut pool = TxPool::new();
        pool.add(tx(1, 0, 5)).unwrap();
        pool.finalize_committed(&[tx(1, 0, 5)]);

        assert!(matches!(
            pool.add(tx(1, 0, 9)),
            Err(TxPoolError::AlreadyCommitted { .. })
        ));
        assert!(pool.is_empty());
    }

    #[test]
    fn replacement_needs_higher_tip() {
        let mut pool = TxPool::new();
        pool.add(tx(1, 0, 5)).unwrap();
        assert_eq!(pool.add(tx(1, 0, 5)), Err(TxPoolError::Underpriced { nonce: 0 }));
        pool.add(tx(1, 0, 6)).unwrap();
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn ordered_view_is_tip_descending_nonce_ascending() {
        let mut pool = TxPool::new();
        pool.add(tx(1, 0, 5)).unwrap();
        pool.add(tx(1, 1, 50)).unwrap();
        pool.add(tx(2, 0, 9)).unwrap();

        let (_, mut remotes) = pool.pending();
        // Sender 2 leads on tip, but sender 1's nonce-1 tx only surfaces
        // after its nonce-0 predecessor.
        assert_eq!(remotes.peek().unwrap().from, [2u8; 20]);
        remotes.shift();
        let first = remotes.peek().unwrap();
        assert_eq!((first.from, first.nonce), ([1u8; 20], 0));
        remotes.shift();
        let second = remotes.peek().unwrap();
        assert_eq!((second.from, second.nonce), ([1u8; 20], 1));
        remotes.shift();
        assert!(remotes.is_empty());
    }

    #[test]
    fn equal_tips_keep_arrival_order() {
        let mut ordered = PendingOrdered::new(HashMap::new());
        ordered.insert_head(tx(1, 0, 7));
        ordered.insert_head(tx(2, 0, 7));
        ordered.insert_head(tx(3, 0, 9));

        assert_eq!(ordered.peek().unwrap().from, [3u8; 20]);
        ordered.shift();
        assert_eq!(ordered.peek().unwrap().from, [1u8; 20]);
        ordered.shift();
        assert_eq!(ordered.peek().unwrap().from, [2u8; 20]);
    }

    #[test]
    fn pop_drops_whole_account() {
        let mut pool = TxPool::new();
        pool.add(tx(1, 0, 5)).unwrap();
        pool.add(tx(1, 1, 6)).unwrap();
        pool.add(tx(2, 0, 1)).unwrap();

        let (_, mut remotes) = pool.pending();
        remotes.pop();
        assert_eq!(remotes.peek().unwrap().from, [2u8; 20]);
        remotes.shift();
        assert!(remotes.is_empty());
    }

    #[test]
    fn nonce_gap_stops_an_account() {
        let mut pool = TxPool::new();
        pool.add(tx(1, 0, 5)).unwrap();
        pool.add(tx(1, 2, 9)).unwrap();

        let (_, mut remotes) = pool.pending();
        remotes.shift();
        // Nonce 2 is unreachable behind the gap.
        assert!(remotes.is_empty());
    }

    #[test]
    fn locals_are_segregated() {
        let mut pool = TxPool::new();
        pool.mark_local([1u8; 20]);
        pool.add(tx(1, 0, 1)).unwrap();
        pool.add(tx(2, 0, 100)).unwrap();

        let (mut locals, mut remotes) = pool.pending();
        assert_eq!(locals.peek().unwrap().from, [1u8; 20]);
        assert_eq!(remotes.peek().unwrap().from, [2u8; 20]);
        locals.shift();
        remotes.shift();
        assert!(locals.is_empty() && remotes.is_empty());
    }
}
