//! The transaction application pipeline.
//!
//! Ordered execution against journaled state: snapshot before each
//! transaction, revert on failure, classify the error to decide how the
//! pending iterator advances. Application errors never propagate; a bad
//! transaction costs its sender inclusion, not the block.

use crate::txpool::PendingOrdered;
use cinder_state::StateDb;
use cinder_types::{
    Address, Header, Log, Receipt, SignedTransaction, TxKind, GAS_FOR_EMPTY_TX,
};
use primitive_types::U256;
use std::sync::atomic::{AtomicI32, Ordering};
use thiserror::Error;
use tracing::{debug, trace, warn};

/// Interrupt codes observed between transactions.
pub struct Interrupt;

impl Interrupt {
    /// No interrupt pending.
    pub const NONE: i32 = 0;
    /// A new chain head arrived: drop the semi-finished round.
    pub const NEW_HEAD: i32 = 1;
    /// The resubmit timer fired: report gas utilization and keep going.
    pub const RESUBMIT: i32 = 2;
}

/// Why application stopped.
#[derive(Debug, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Ran to completion (gas or transactions exhausted).
    Done,
    /// Aborted by a new-head interrupt; the caller drops the round.
    InterruptedNewHead,
}

/// Per-transaction failure classification (spec'd iterator actions in
/// [`commit_transactions`]).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApplyError {
    /// The block's gas pool cannot cover the transaction.
    #[error("gas limit reached")]
    GasLimitReached,

    /// Sender nonce already spent.
    #[error("nonce too low: tx {tx}, account {account}")]
    NonceTooLow {
        /// Nonce carried by the transaction.
        tx: u64,
        /// Current account nonce.
        account: u64,
    },

    /// Sender nonce not yet reachable.
    #[error("nonce too high: tx {tx}, account {account}")]
    NonceTooHigh {
        /// Nonce carried by the transaction.
        tx: u64,
        /// Current account nonce.
        account: u64,
    },

    /// Transaction kind this backend does not execute.
    #[error("unsupported transaction kind")]
    UnsupportedKind,

    /// Any other execution failure.
    #[error("execution failed: {0}")]
    Other(String),
}

/// Block gas accounting.
#[derive(Debug, Clone, Copy)]
pub struct GasPool(u64);

impl GasPool {
    /// Pool holding the block gas limit.
    pub fn new(limit: u64) -> Self {
        Self(limit)
    }

    /// Remaining gas.
    pub fn remaining(&self) -> u64 {
        self.0
    }

    /// Take `amount` from the pool, or fail leaving it untouched.
    pub fn sub(&mut self, amount: u64) -> Result<(), ApplyError> {
        if self.0 < amount {
            return Err(ApplyError::GasLimitReached);
        }
        self.0 -= amount;
        Ok(())
    }
}

/// Execution port of the embedded VM.
///
/// The core hands over the transaction, the assembling header, journaled
/// state, and the block gas pool; the backend returns a receipt or a
/// classified error. On error the caller reverts the state snapshot, so
/// backends may mutate freely before failing.
pub trait ApplyBackend: Send + Sync {
    /// Execute one transaction.
    fn apply(
        &self,
        tx: &SignedTransaction,
        header: &Header,
        state: &mut StateDb,
        gas_pool: &mut GasPool,
    ) -> Result<Receipt, ApplyError>;
}

/// Plain value-transfer execution: nonce discipline, intrinsic gas, fee to
/// the producer. Contract kinds are delegated to the embedded VM, which is
/// not part of the core; this backend classifies them unsupported.
pub struct TransferBackend;

impl ApplyBackend for TransferBackend {
    fn apply(
        &self,
        tx: &SignedTransaction,
        header: &Header,
        state: &mut StateDb,
        gas_pool: &mut GasPool,
    ) -> Result<Receipt, ApplyError> {
        if tx.kind != TxKind::Transfer {
            return Err(ApplyError::UnsupportedKind);
        }

        let account_nonce = state.nonce(&tx.from);
        if tx.nonce < account_nonce {
            return Err(ApplyError::NonceTooLow {
                tx: tx.nonce,
                account: account_nonce,
            });
        }
        if tx.nonce > account_nonce {
            return Err(ApplyError::NonceTooHigh {
                tx: tx.nonce,
                account: account_nonce,
            });
        }

        let gas = tx.intrinsic_gas();
        if gas > tx.gas_limit {
            return Err(ApplyError::Other(format!(
                "intrinsic gas {gas} exceeds tx gas limit {}",
                tx.gas_limit
            )));
        }

        let fee = tx.gas_tip * U256::from(gas);
        let total = tx.value + fee;
        if state.balance(&tx.from) < total {
            return Err(ApplyError::Other(format!(
                "insufficient funds: have {}, need {total}",
                state.balance(&tx.from)
            )));
        }

        // All checks passed; take from the pool last so a failure above
        // leaves it untouched.
        gas_pool.sub(gas)?;

        state
            .sub_balance(&tx.from, total)
            .map_err(|e| ApplyError::Other(e.to_string()))?;
        if let Some(to) = tx.to {
            state.add_balance(&to, tx.value);
        }
        state.add_balance(&header.producer_addr, fee);
        state.set_nonce(&tx.from, tx.nonce + 1);

        Ok(Receipt::new(tx.hash(), true, gas, 0))
    }
}

/// Mutable assembly context for one block.
pub struct ExecutionEnv<'a> {
    /// Journaled state the transactions run against.
    pub state: &'a mut StateDb,
    /// The header being assembled.
    pub header: &'a Header,
    /// Block gas accounting.
    pub gas_pool: GasPool,
    /// Gas consumed so far.
    pub gas_used: u64,
    /// Transactions included so far.
    pub txs: Vec<SignedTransaction>,
    /// Their receipts, cumulative gas filled.
    pub receipts: Vec<Receipt>,
    /// Logs accumulated across included transactions.
    pub logs: Vec<Log>,
}

impl<'a> ExecutionEnv<'a> {
    /// Fresh context over `state` for `header`.
    pub fn new(state: &'a mut StateDb, header: &'a Header) -> Self {
        let gas_pool = GasPool::new(header.gas_limit);
        Self {
            state,
            header,
            gas_pool,
            gas_used: 0,
            txs: Vec::new(),
            receipts: Vec::new(),
            logs: Vec::new(),
        }
    }
}

/// Drain `pending` into the environment.
///
/// Per-error iterator actions:
///
/// | Error | Action |
/// |---|---|
/// | gas-limit-reached | pop account |
/// | nonce-too-low | shift within account |
/// | nonce-too-high | pop account |
/// | unsupported kind | pop account |
/// | ok | accumulate, shift |
/// | other | shift, log, continue |
///
/// `interrupt` is observed between transactions: `NEW_HEAD` aborts and the
/// caller drops the semi-finished round; `RESUBMIT` reports the current
/// gas utilization through `gas_feedback` and continues.
pub fn commit_transactions(
    backend: &dyn ApplyBackend,
    env: &mut ExecutionEnv<'_>,
    pending: &mut PendingOrdered,
    _coinbase: Address,
    interrupt: Option<&AtomicI32>,
    gas_feedback: Option<&dyn Fn(f64)>,
) -> CommitOutcome {
    loop {
        if let Some(flag) = interrupt {
            match flag.load(Ordering::Relaxed) {
                Interrupt::NEW_HEAD => {
                    debug!(
                        number = env.header.number,
                        included = env.txs.len(),
                        "new head during assembly, dropping semi-finished round"
                    );
                    return CommitOutcome::InterruptedNewHead;
                }
                Interrupt::RESUBMIT => {
                    let limit = env.header.gas_limit;
                    let ratio = if limit == 0 {
                        0.0
                    } else {
                        (limit - env.gas_pool.remaining()) as f64 / limit as f64
                    };
                    if let Some(feedback) = gas_feedback {
                        feedback(ratio);
                    }
                    flag.store(Interrupt::NONE, Ordering::Relaxed);
                }
                _ => {}
            }
        }

        if env.gas_pool.remaining() < GAS_FOR_EMPTY_TX {
            debug!(
                remaining = env.gas_pool.remaining(),
                "gas pool below empty-tx floor, stopping"
            );
            return CommitOutcome::Done;
        }

        let Some(tx) = pending.peek().cloned() else {
            return CommitOutcome::Done;
        };

        let snapshot = env.state.snapshot();
        match backend.apply(&tx, env.header, env.state, &mut env.gas_pool) {
            Ok(mut receipt) => {
                env.gas_used += receipt.gas_used;
                receipt.cumulative_gas_used = env.gas_used;
                env.logs.extend(receipt.logs.iter().cloned());
                env.receipts.push(receipt);
                env.txs.push(tx);
                pending.shift();
            }
            Err(error) => {
                env.state.revert_to_snapshot(snapshot);
                match error {
                    ApplyError::GasLimitReached => {
                        trace!(sender = %hex::encode(tx.from), "gas limit reached, popping account");
                        pending.pop();
                    }
                    ApplyError::NonceTooLow { tx: got, account } => {
                        trace!(got, account, "nonce too low, shifting");
                        pending.shift();
                    }
                    ApplyError::NonceTooHigh { tx: got, account } => {
                        trace!(got, account, "nonce too high, popping account");
                        pending.pop();
                    }
                    ApplyError::UnsupportedKind => {
                        trace!(sender = %hex::encode(tx.from), "unsupported kind, popping account");
                        pending.pop();
                    }
                    ApplyError::Other(reason) => {
                        warn!(
                            sender = %hex::encode(tx.from),
                            nonce = tx.nonce,
                            reason,
                            "transaction failed, skipping"
                        );
                        pending.shift();
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::txpool::TxPool;

    fn funded_state(accounts: &[(u8, u64)]) -> StateDb {
        StateDb::with_alloc(
            accounts
                .iter()
                .map(|(sender, balance)| ([*sender; 20], U256::from(*balance))),
        )
    }

    fn header(gas_limit: u64) -> Header {
        Header {
            number: 1,
            gas_limit,
            producer_addr: [0xbb; 20],
            ..Default::default()
        }
    }

    fn transfer(sender: u8, nonce: u64, value: u64, tip: u64) -> SignedTransaction {
        SignedTransaction {
            kind: TxKind::Transfer,
            from: [sender; 20],
            to: Some([0xcc; 20]),
            nonce,
            value: U256::from(value),
            gas_limit: 40_000,
            gas_tip: U256::from(tip),
            data: vec![],
        }
    }

    fn pending_of(txs: Vec<SignedTransaction>) -> PendingOrdered {
        let mut pool = TxPool::new();
        for tx in txs {
            pool.add(tx).unwrap();
        }
        let (_, remotes) = pool.pending();
        remotes
    }

    #[test]
    fn applies_sequential_transfers() {
        let mut state = funded_state(&[(1, 10_000_000)]);
        let header = header(30_000_000);
        let mut env = ExecutionEnv::new(&mut state, &header);
        let mut pending = pending_of(vec![transfer(1, 0, 100, 1), transfer(1, 1, 100, 1)]);

        let outcome = commit_transactions(
            &TransferBackend,
            &mut env,
            &mut pending,
            [0u8; 20],
            None,
            None,
        );
        assert_eq!(outcome, CommitOutcome::Done);
        assert_eq!(env.txs.len(), 2);
        assert_eq!(env.receipts[1].cumulative_gas_used, 2 * GAS_FOR_EMPTY_TX);
        assert_eq!(env.state.nonce(&[1u8; 20]), 2);
        assert_eq!(env.state.balance(&[0xcc; 20]), U256::from(200));
        // Fees accrued to the producer.
        assert_eq!(
            env.state.balance(&[0xbb; 20]),
            U256::from(2 * GAS_FOR_EMPTY_TX)
        );
    }

    #[test]
    fn failed_transaction_reverts_to_pre_snapshot_state() {
        // Balance covers the fee but not value + fee: classified Other,
        // skipped, and the state is byte-identical to before the attempt.
        let mut state = funded_state(&[(1, 30_000)]);
        let before = state.fingerprint();
        let header = header(30_000_000);
        let mut env = ExecutionEnv::new(&mut state, &header);
        let mut pending = pending_of(vec![transfer(1, 0, 25_000, 1)]);

        commit_transactions(&TransferBackend, &mut env, &mut pending, [0u8; 20], None, None);
        assert!(env.txs.is_empty());
        assert_eq!(env.state.fingerprint(), before);
    }

    #[test]
    fn gas_exhaustion_pops_account_but_continues_others() {
        let mut state = funded_state(&[(1, 10_000_000), (2, 10_000_000)]);
        // Room for exactly one empty transfer; sender 1 bids higher and has
        // a fat payload that cannot fit.
        let mut big = transfer(1, 0, 1, 9);
        big.data = vec![0u8; 1024];
        big.gas_limit = 60_000;
        let small = transfer(2, 0, 1, 1);

        let header = header(GAS_FOR_EMPTY_TX + 100);
        let mut env = ExecutionEnv::new(&mut state, &header);
        let mut pending = pending_of(vec![big, small]);

        let outcome = commit_transactions(
            &TransferBackend,
            &mut env,
            &mut pending,
            [0u8; 20],
            None,
            None,
        );
        assert_eq!(outcome, CommitOutcome::Done);
        // Sender 1 popped on gas-limit-reached; sender 2 still fit.
        assert_eq!(env.txs.len(), 1);
        assert_eq!(env.txs[0].from, [2u8; 20]);
    }

    #[test]
    fn nonce_too_low_shifts_to_next() {
        let mut state = funded_state(&[(1, 10_000_000)]);
        state.set_nonce(&[1u8; 20], 1);
        let header = header(30_000_000);
        let mut env = ExecutionEnv::new(&mut state, &header);
        let mut pending = pending_of(vec![transfer(1, 0, 1, 1), transfer(1, 1, 1, 1)]);

        commit_transactions(&TransferBackend, &mut env, &mut pending, [0u8; 20], None, None);
        // Nonce 0 skipped as spent, nonce 1 included.
        assert_eq!(env.txs.len(), 1);
        assert_eq!(env.txs[0].nonce, 1);
    }

    #[test]
    fn nonce_gap_pops_account() {
        let mut state = funded_state(&[(1, 10_000_000)]);
        let header = header(30_000_000);
        let mut env = ExecutionEnv::new(&mut state, &header);
        // Account nonce 0 but first pending nonce is 5.
        let mut pool = TxPool::new();
        pool.add(transfer(1, 5, 1, 1)).unwrap();
        let (_, mut pending) = pool.pending();

        commit_transactions(&TransferBackend, &mut env, &mut pending, [0u8; 20], None, None);
        assert!(env.txs.is_empty());
    }

    #[test]
    fn unsupported_kind_pops_account() {
        let mut state = funded_state(&[(1, 10_000_000)]);
        let header = header(30_000_000);
        let mut env = ExecutionEnv::new(&mut state, &header);
        let mut vm_tx = transfer(1, 0, 1, 1);
        vm_tx.kind = TxKind::ContractCall;
        let mut pending = pending_of(vec![vm_tx, transfer(1, 1, 1, 1)]);

        commit_transactions(&TransferBackend, &mut env, &mut pending, [0u8; 20], None, None);
        assert!(env.txs.is_empty());
    }

    #[test]
    fn new_head_interrupt_aborts() {
        let mut state = funded_state(&[(1, 10_000_000)]);
        let header = header(30_000_000);
        let mut env = ExecutionEnv::new(&mut state, &header);
        let mut pending = pending_of(vec![transfer(1, 0, 1, 1)]);
        let interrupt = AtomicI32::new(Interrupt::NEW_HEAD);

        let outcome = commit_transactions(
            &TransferBackend,
            &mut env,
            &mut pending,
            [0u8; 20],
            Some(&interrupt),
            None,
        );
        assert_eq!(outcome, CommitOutcome::InterruptedNewHead);
        assert!(env.txs.is_empty());
    }

    #[test]
    fn resubmit_interrupt_reports_ratio_and_continues() {
        let mut state = funded_state(&[(1, 10_000_000)]);
        let header = header(30_000_000);
        let mut env = ExecutionEnv::new(&mut state, &header);
        let mut pending = pending_of(vec![transfer(1, 0, 1, 1)]);
        let interrupt = AtomicI32::new(Interrupt::RESUBMIT);

        let reported = std::sync::Mutex::new(Vec::new());
        let feedback: &dyn Fn(f64) = &|ratio| reported.lock().unwrap().push(ratio);

        let outcome = commit_transactions(
            &TransferBackend,
            &mut env,
            &mut pending,
            [0u8; 20],
            Some(&interrupt),
            Some(feedback),
        );
        assert_eq!(outcome, CommitOutcome::Done);
        assert_eq!(env.txs.len(), 1, "resubmit must not abort");
        assert_eq!(reported.lock().unwrap().as_slice(), &[0.0]);
        assert_eq!(interrupt.load(Ordering::Relaxed), Interrupt::NONE);
    }
}
