//! The worker state machine.
//!
//! One long-running task per node. For each round it accumulates witness
//! ACKs and PoW answers, decides whether this node is the round's proposer
//! or a co-validator, and drives assembly, propagation, or the
//! timeout-driven oppose/re-propose path.
//!
//! ## Height bookkeeping
//!
//! - `effective_h`: height of the last *effective* block observed.
//! - `virtual_h`: last head acknowledged, `>= effective_h`; the two
//!   diverge while a reject-majority is being recorded.
//! - `sealed_h`: highest height this node has committed a proposal for;
//!   strictly increasing, the double-commit guard.
//! - `reject_h`: round an oppose vote is armed or sent for.
//!
//! ## Votes and rounds
//!
//! An ACK with `number = R` votes on round `R`: witnesses send agree for
//! `head + 1` on observing a new effective head, and oppose for the armed
//! reject round when the proposer misses its deadline. Quorums for the
//! next commit are therefore read at round `effective_h + 1`; while a
//! reject is pending that round's oppose tally is exactly the
//! reject-majority being recorded.

use crate::applier::{
    commit_transactions, ApplyBackend, CommitOutcome, ExecutionEnv, Interrupt,
};
use crate::chain::Chain;
use crate::config::WorkerConfig;
use crate::metrics;
use crate::txpool::TxPool;
use crate::WorkerError;
use cinder_bus::{CoreEvent, EventPublisher, InMemoryEventBus, NetworkBroadcaster};
use cinder_consensus::{
    calc_difficulty, calc_gas_limit, AckPool, AnswerPool, CommitteeProvider, DposEngine,
};
use cinder_crypto::{keccak256, WitnessKeypair};
use cinder_pow::{verify_answer, DatasetCache, RemoteHandle, Sealer};
use cinder_state::StateDb;
use cinder_types::{
    empty_ack_hash, ordered_root, AckKind, Block, Bloom, Header, PowAnswer, Receipt,
    SignedTransaction, WitnessAck, VIRTUAL_BLOCK_EXTRA, ZERO_ADDRESS,
};
use parking_lot::{Mutex, RwLock};
use primitive_types::H256;
use std::sync::atomic::AtomicI32;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// What kind of block a commit produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockKind {
    /// Carries transactions and advances the confirmed head.
    Effective,
    /// Empty placeholder recording a reject-majority.
    Virtual,
}

/// Everything a worker is wired to.
pub struct WorkerDependencies {
    /// Runtime configuration.
    pub config: WorkerConfig,
    /// Canonical view and writer.
    pub chain: Arc<Chain>,
    /// Event bus the node runs on.
    pub bus: Arc<InMemoryEventBus>,
    /// Per-height committee snapshots.
    pub committees: Arc<dyn CommitteeProvider>,
    /// Finalization and signing engine.
    pub engine: Arc<DposEngine>,
    /// This node's witness key.
    pub keypair: Arc<WitnessKeypair>,
    /// Shared pending-transaction pool.
    pub txpool: Arc<Mutex<TxPool>>,
    /// Transaction execution port.
    pub backend: Arc<dyn ApplyBackend>,
    /// Outbound gossip surface.
    pub broadcaster: Arc<dyn NetworkBroadcaster>,
    /// Local PoW sealer, when mining.
    pub sealer: Option<Arc<Sealer>>,
    /// Dataset cache for answer verification.
    pub datasets: Arc<DatasetCache>,
    /// Remote sealer handle, when serving external miners.
    pub remote: Option<RemoteHandle>,
}

/// Observable worker heights, for embedders and tests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorkerStatus {
    /// Height of the last effective block observed.
    pub effective_h: u64,
    /// Last acknowledged head.
    pub virtual_h: u64,
    /// Highest height committed locally.
    pub sealed_h: u64,
    /// Pending reject round, if armed or sent.
    pub reject_h: Option<u64>,
}

struct SealTask {
    block: Block,
    receipts: Vec<Receipt>,
    state: StateDb,
}

/// The worker actor. Construct with [`Worker::new`], then drive with
/// [`Worker::run`] on its own task.
pub struct Worker {
    config: WorkerConfig,
    chain: Arc<Chain>,
    bus: Arc<InMemoryEventBus>,
    committees: Arc<dyn CommitteeProvider>,
    engine: Arc<DposEngine>,
    keypair: Arc<WitnessKeypair>,
    txpool: Arc<Mutex<TxPool>>,
    backend: Arc<dyn ApplyBackend>,
    broadcaster: Arc<dyn NetworkBroadcaster>,
    sealer: Option<Arc<Sealer>>,
    datasets: Arc<DatasetCache>,
    remote: Option<RemoteHandle>,

    interrupt: Arc<AtomicI32>,
    status: Arc<RwLock<WorkerStatus>>,

    pow_tx: mpsc::Sender<PowAnswer>,
    pow_rx: Option<mpsc::Receiver<PowAnswer>>,
    task_tx: mpsc::Sender<SealTask>,
    task_rx: Option<mpsc::Receiver<SealTask>>,

    effective_h: u64,
    virtual_h: u64,
    sealed_h: u64,
    reject_h: Option<u64>,
    delay_deadline: Option<Instant>,
    delay_seal_h: u64,
    seal_deadline_at: Option<Instant>,
    seal_stop: Option<oneshot::Sender<()>>,
    seal_target: u64,

    ack_pool: AckPool,
    answer_pool: AnswerPool,
}

impl Worker {
    /// Wire up a worker. Pool staleness windows come from the chain's
    /// network parameters.
    pub fn new(deps: WorkerDependencies) -> Self {
        let (pow_tx, pow_rx) = mpsc::channel(64);
        let (task_tx, task_rx) = mpsc::channel(4);
        let stale = deps.chain.config().stale_threshold;

        info!(
            coinbase = %hex::encode(deps.config.coinbase),
            mine = deps.config.mine,
            "worker initialized"
        );

        Self {
            ack_pool: AckPool::new(stale),
            answer_pool: AnswerPool::new(stale),
            config: deps.config,
            chain: deps.chain,
            bus: deps.bus,
            committees: deps.committees,
            engine: deps.engine,
            keypair: deps.keypair,
            txpool: deps.txpool,
            backend: deps.backend,
            broadcaster: deps.broadcaster,
            sealer: deps.sealer,
            datasets: deps.datasets,
            remote: deps.remote,
            interrupt: Arc::new(AtomicI32::new(Interrupt::NONE)),
            status: Arc::new(RwLock::new(WorkerStatus::default())),
            pow_tx,
            pow_rx: Some(pow_rx),
            task_tx,
            task_rx: Some(task_rx),
            effective_h: 0,
            virtual_h: 0,
            sealed_h: 0,
            reject_h: None,
            delay_deadline: None,
            delay_seal_h: 0,
            seal_deadline_at: None,
            seal_stop: None,
            seal_target: 0,
        }
    }

    /// Handle for observing the worker's heights.
    pub fn status_handle(&self) -> Arc<RwLock<WorkerStatus>> {
        Arc::clone(&self.status)
    }

    /// Handle the embedding scheduler uses to interrupt assembly.
    pub fn interrupt_handle(&self) -> Arc<AtomicI32> {
        Arc::clone(&self.interrupt)
    }

    /// The worker loop. Runs until the bus closes.
    pub async fn run(mut self) {
        let mut subscription = self.bus.subscribe();
        let mut pow_rx = self.pow_rx.take().expect("run called once");
        let mut task_rx = self.task_rx.take().expect("run called once");

        // The chain writer runs serially beside the worker; tasks are
        // must-deliver over the bounded channel.
        let chain = Arc::clone(&self.chain);
        let writer = tokio::spawn(async move {
            while let Some(task) = task_rx.recv().await {
                match chain
                    .write_block_with_state(task.block, task.receipts, task.state)
                    .await
                {
                    Ok(_) => {}
                    Err(e @ WorkerError::Database(_)) => {
                        // Database failures are fatal to the lifecycle.
                        error!(error = %e, "database write failure, halting chain writer");
                        break;
                    }
                    Err(e) => error!(error = %e, "chain write failed, round dropped"),
                }
            }
        });

        self.bootstrap().await;

        loop {
            let delay = self.delay_deadline;
            let deadline = self.seal_deadline_at;
            tokio::select! {
                event = subscription.recv() => match event {
                    Ok(event) => self.on_event(event).await,
                    Err(_) => break,
                },
                answer = pow_rx.recv() => match answer {
                    Some(answer) => self.on_local_answer(answer).await,
                    None => break,
                },
                _ = sleep_until_opt(delay), if delay.is_some() => {
                    self.on_delay_seal().await;
                }
                _ = sleep_until_opt(deadline), if deadline.is_some() => {
                    self.on_seal_deadline().await;
                }
            }
            self.publish_status();
        }

        writer.abort();
        info!("worker loop stopped");
    }

    /// Self-start: acknowledge the boot head and begin sealing against it.
    async fn bootstrap(&mut self) {
        let head = self.chain.head();
        self.effective_h = if head.is_virtual() {
            head.number().saturating_sub(1)
        } else {
            head.number()
        };
        self.virtual_h = head.number();
        self.sealed_h = head.number();

        if !head.is_virtual() {
            self.broadcast_agree(head.number() + 1).await;
        }
        self.start_seal(&head).await;
        self.publish_status();
    }

    async fn on_event(&mut self, event: CoreEvent) {
        match event {
            CoreEvent::ChainHead { block } => self.on_chain_head(block).await,
            CoreEvent::PowAnswer(answer) => self.admit_answer(answer).await,
            CoreEvent::WitnessAck(ack) => self.on_ack(ack).await,
            CoreEvent::NewMinedBlock { .. } | CoreEvent::PendingLogs(_) => {}
        }
    }

    // ------------------------------------------------------------------
    // Transition 1: new chain head
    // ------------------------------------------------------------------

    async fn on_chain_head(&mut self, block: Arc<Block>) {
        let hnew = block.number();

        // Sealing chases the canonical head even when the height
        // bookkeeping below ignores the event (a node that pre-advanced
        // `virtual_h` with its own oppose still re-targets its search once
        // the placeholder lands).
        if hnew + 1 > self.seal_target {
            self.start_seal(&block).await;
        }

        if hnew <= self.virtual_h {
            // A head we already acknowledged. The one live case: the
            // virtual placeholder of a reject we voted in just landed, and
            // this node proposes its successor.
            if self.reject_h == Some(hnew)
                && hnew > self.effective_h
                && self.is_proposer(hnew + 1)
            {
                debug!(number = hnew, "virtual head recorded, attempting re-propose");
                self.maybe_commit().await;
            } else {
                debug!(number = hnew, virtual_h = self.virtual_h, "stale head ignored");
            }
            return;
        }

        self.virtual_h = hnew;
        if !block.is_virtual() {
            self.effective_h = hnew;
            self.txpool.lock().finalize_committed(&block.transactions);
        }

        // A satisfied reject: the chain moved past the armed round.
        if self.reject_h.is_some_and(|reject| hnew >= reject) {
            self.seal_deadline_at = None;
            self.reject_h = None;
        }
        self.delay_deadline = None;

        self.ack_pool.evict(hnew);
        self.answer_pool.evict(hnew);

        if !block.is_virtual() {
            self.broadcast_agree(hnew + 1).await;
        }
        self.maybe_commit().await;
    }

    // ------------------------------------------------------------------
    // Transition 2: witness ACK received
    // ------------------------------------------------------------------

    async fn on_ack(&mut self, ack: WitnessAck) {
        let committee = self.committees.committee_at(ack.number);
        match self.ack_pool.insert(ack, &committee) {
            Ok(true) => {
                metrics::record_ack_admitted();
                self.maybe_commit().await;
            }
            Ok(false) => {}
            Err(e) => debug!(error = %e, "invalid ack dropped"),
        }
    }

    // ------------------------------------------------------------------
    // Transition 3: PoW answer received
    // ------------------------------------------------------------------

    async fn on_local_answer(&mut self, answer: PowAnswer) {
        // Gossip first; admission below mirrors the network path, and the
        // loopback duplicate collapses in the pool.
        self.broadcaster.broadcast_answer(answer).await;
        self.admit_answer(answer).await;
    }

    async fn admit_answer(&mut self, answer: PowAnswer) {
        let head_number = self.chain.head().number();
        if !self.answer_pool.is_fresh(answer.number, head_number) {
            debug!(round = answer.number, head = head_number, "stale answer dropped");
            return;
        }
        // Sketchy validation: the digest must reproduce under the parent's
        // difficulty before the answer enters the pool.
        let Some(parent) = self.chain.block_by_height(answer.number.saturating_sub(1)) else {
            debug!(round = answer.number, "answer for unknown parent dropped");
            return;
        };
        if let Err(e) = verify_answer(
            &self.datasets,
            parent.hash(),
            parent.header.difficulty,
            &answer,
        ) {
            warn!(round = answer.number, error = %e, "invalid answer dropped");
            return;
        }

        if self.answer_pool.insert(answer, head_number) {
            metrics::record_answer_admitted();
            self.maybe_commit().await;
        }
    }

    // ------------------------------------------------------------------
    // Quorum evaluation (transitions 2 and 3 share it)
    // ------------------------------------------------------------------

    /// Answers banked across the rounds the chain still owes blocks for.
    /// Enough means one ticket per outstanding round.
    fn check_answers(&self) -> (bool, usize) {
        let count = self
            .answer_pool
            .count_range(self.effective_h + 1, self.virtual_h + 1);
        let needed = (self.virtual_h - self.effective_h + 1) as usize;
        (count >= needed, count)
    }

    async fn maybe_commit(&mut self) {
        let target = self.chain.head().number() + 1;
        let vote_round = self.effective_h + 1;
        let committee = self.committees.committee_at(vote_round);

        let (agree, oppose) = self.ack_pool.counts(vote_round);
        let votes = agree.max(oppose);
        let (enough_answers, answer_count) = self.check_answers();
        let target_ready = self.answer_pool.count(target) > 0;

        if self.is_proposer(self.virtual_h + 1) {
            if enough_answers && target_ready && votes >= committee.most_quorum() {
                self.delay_deadline = None;
                self.commit(target, self.kind_for(target)).await;
            } else if self.delay_deadline.is_none()
                && enough_answers
                && target_ready
                && votes >= committee.least_quorum()
            {
                self.delay_deadline = Some(Instant::now() + self.config.delay_seal);
                self.delay_seal_h = target;
                debug!(
                    round = target,
                    votes,
                    answer_count,
                    "simple majority reached, delay-seal armed"
                );
            }
        } else if self.is_witness_at(self.virtual_h) {
            // Co-validator: first crossing of the simple majority with
            // fresh answers arms the proposer deadline.
            let next = self.virtual_h + 1;
            if self.seal_deadline_at.is_none()
                && self.reject_h != Some(next)
                && enough_answers
                && votes >= committee.least_quorum()
            {
                self.seal_deadline_at = Some(Instant::now() + self.config.seal_deadline);
                self.reject_h = Some(next);
                debug!(round = next, votes, "proposer deadline armed");
            }
        }
    }

    fn kind_for(&self, target: u64) -> BlockKind {
        if self.virtual_h > self.effective_h && target == self.virtual_h {
            BlockKind::Virtual
        } else {
            BlockKind::Effective
        }
    }

    // ------------------------------------------------------------------
    // Transition 4: delay-seal fires
    // ------------------------------------------------------------------

    async fn on_delay_seal(&mut self) {
        self.delay_deadline = None;
        let round = self.delay_seal_h;

        // The head may have moved since arming; a stale timer is dropped.
        if self.chain.head().number() + 1 != round {
            debug!(round, "delay-seal fired for a superseded round, dropped");
            return;
        }

        let committee = self.committees.committee_at(round);
        let (agree, oppose) = self.ack_pool.counts(self.effective_h + 1);
        if agree.max(oppose) >= committee.least_quorum() {
            self.commit(round, self.kind_for(round)).await;
        } else {
            // No retry timer here; the node stays idle for the round until
            // another vote or answer arrival re-evaluates the quorum.
            warn!(
                round,
                agree,
                oppose,
                need = committee.least_quorum(),
                "delay-seal fired without quorum, staying idle"
            );
        }
    }

    // ------------------------------------------------------------------
    // Transition 5: seal deadline fires
    // ------------------------------------------------------------------

    async fn on_seal_deadline(&mut self) {
        self.seal_deadline_at = None;
        let Some(reject) = self.reject_h else {
            return;
        };
        if reject != self.virtual_h + 1 {
            // The virtual head already moved; the precondition this timer
            // encoded is gone.
            debug!(reject, virtual_h = self.virtual_h, "stale seal deadline dropped");
            self.reject_h = None;
            return;
        }

        let committee = self.committees.committee_at(reject);
        if let Some(position) = committee.position_of(&self.config.coinbase) {
            let ack = WitnessAck::signed(
                reject,
                position,
                empty_ack_hash(),
                AckKind::Oppose,
                &self.keypair,
            );
            self.broadcaster.broadcast_ack(ack).await;
            metrics::record_oppose_sent();
            info!(round = reject, "proposer missed deadline, oppose broadcast");
        }
        self.virtual_h = reject;
    }

    // ------------------------------------------------------------------
    // Commit
    // ------------------------------------------------------------------

    async fn commit(&mut self, new_h: u64, kind: BlockKind) {
        if self.sealed_h >= new_h {
            debug!(
                number = new_h,
                sealed_h = self.sealed_h,
                "already sealed this height, duplicate commit skipped"
            );
            return;
        }
        let prev_sealed = self.sealed_h;
        self.sealed_h = new_h;

        if let Err(e) = self.build_and_submit(new_h, kind).await {
            warn!(number = new_h, error = %e, "round aborted");
            self.sealed_h = prev_sealed;
        }
    }

    async fn build_and_submit(&mut self, new_h: u64, kind: BlockKind) -> Result<(), WorkerError> {
        let parent = self
            .chain
            .block_by_height(new_h - 1)
            .ok_or_else(|| WorkerError::RoundAborted {
                round: new_h,
                reason: "parent not in canonical view".to_string(),
            })?;

        let time = unix_now().max(parent.header.time + 1);
        let mut header = Header {
            parent_hash: parent.hash(),
            number: new_h,
            gas_limit: calc_gas_limit(
                parent.header.gas_used,
                parent.header.gas_limit,
                self.config.gas_floor,
                self.config.gas_ceil,
            ),
            time,
            difficulty: calc_difficulty(
                time,
                &parent.header,
                self.chain.config().min_difficulty,
            ),
            producer_addr: self.config.coinbase,
            coinbase: ZERO_ADDRESS,
            extra: match kind {
                BlockKind::Virtual => VIRTUAL_BLOCK_EXTRA.to_vec(),
                BlockKind::Effective => Vec::new(),
            },
            ..Default::default()
        };

        let mut state =
            self.chain
                .state_at(&parent.hash())
                .ok_or_else(|| WorkerError::RoundAborted {
                    round: new_h,
                    reason: "no state at parent".to_string(),
                })?;

        let mut included: Vec<SignedTransaction> = Vec::new();
        let mut receipts: Vec<Receipt> = Vec::new();
        let mut pending_logs = Vec::new();
        let mut uncles = Vec::new();

        if kind == BlockKind::Effective {
            self.interrupt
                .store(Interrupt::NONE, std::sync::atomic::Ordering::Relaxed);
            let (mut locals, mut remotes) = self.txpool.lock().pending();

            let report_utilization: &dyn Fn(f64) = &|ratio| {
                debug!(ratio, "gas utilization reported to resubmit scheduler");
            };
            let mut env = ExecutionEnv::new(&mut state, &header);
            for pending in [&mut locals, &mut remotes] {
                let outcome = commit_transactions(
                    self.backend.as_ref(),
                    &mut env,
                    pending,
                    self.config.coinbase,
                    Some(&self.interrupt),
                    Some(report_utilization),
                );
                if outcome == CommitOutcome::InterruptedNewHead {
                    return Err(WorkerError::RoundAborted {
                        round: new_h,
                        reason: "new head during assembly".to_string(),
                    });
                }
            }
            let ExecutionEnv {
                gas_used,
                txs,
                receipts: env_receipts,
                logs,
                ..
            } = env;
            header.gas_used = gas_used;
            included = txs;
            receipts = env_receipts;
            pending_logs = logs;
            uncles = self.chain.answers_at(parent.number());
        }

        // The quorum ACK set: agree over this round for a clean effective
        // extension, otherwise the recorded oppose-majority.
        let use_agree = kind == BlockKind::Effective && !parent.is_virtual();
        let ack_round = if use_agree { new_h } else { self.effective_h + 1 };
        let acks = if use_agree {
            self.ack_pool.agree_set(ack_round)
        } else {
            self.ack_pool.oppose_set(ack_round)
        };
        let committee = self.committees.committee_at(ack_round);
        if acks.len() < committee.least_quorum() {
            return Err(cinder_consensus::ConsensusError::QuorumNotReached {
                round: ack_round,
                have: acks.len(),
                need: committee.least_quorum(),
            }
            .into());
        }
        header.ack_count_list = vec![self.ack_pool.count_record(ack_round)];

        // The round's accepted PoW winners; the latest one seals the
        // header's nonce and mix.
        let answers = self.answer_pool.answers(new_h);
        let Some(latest) = answers.last().copied() else {
            return Err(WorkerError::RoundAborted {
                round: new_h,
                reason: "no pow answer banked for round".to_string(),
            });
        };
        header.nonce = latest.nonce;
        header.mix_digest = latest.mix_digest;
        header.pow_answers = answers;

        header.tx_root = ordered_root(included.iter().map(|tx| tx.hash()));
        header.receipt_root = ordered_root(receipts.iter().map(receipt_hash));
        header.logs_bloom = Bloom::from_receipts(&receipts);

        self.engine.finalize(&mut header, &mut state);
        self.engine.seal_header(&mut header)?;

        let block = Block {
            header,
            transactions: included,
            pow_answer_uncles: uncles,
            acks,
        };

        info!(
            number = new_h,
            kind = ?kind,
            txs = block.transactions.len(),
            acks = block.acks.len(),
            "block assembled"
        );

        // Pending logs go out for filter subscribers only when this node
        // is not mining; a miner's logs pick up their block hash at the
        // head event instead.
        if !self.config.mine && !pending_logs.is_empty() {
            self.bus.publish(CoreEvent::PendingLogs(pending_logs)).await;
        }

        if self
            .task_tx
            .send(SealTask {
                block,
                receipts,
                state,
            })
            .await
            .is_err()
        {
            return Err(WorkerError::RoundAborted {
                round: new_h,
                reason: "chain writer gone".to_string(),
            });
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn is_proposer(&self, height: u64) -> bool {
        self.committees
            .committee_at(height.saturating_sub(1))
            .proposer_for(height)
            .address
            == self.config.coinbase
    }

    fn is_witness_at(&self, height: u64) -> bool {
        self.committees
            .committee_at(height)
            .contains(&self.config.coinbase)
    }

    async fn broadcast_agree(&mut self, round: u64) {
        let committee = self.committees.committee_at(round);
        let Some(position) = committee.position_of(&self.config.coinbase) else {
            return;
        };
        let ack = WitnessAck::signed(
            round,
            position,
            empty_ack_hash(),
            AckKind::Agree,
            &self.keypair,
        );
        self.broadcaster.broadcast_ack(ack).await;
        debug!(round, position, "agree ack broadcast");
    }

    /// Point the sealers (local and remote) at the next round.
    async fn start_seal(&mut self, parent: &Block) {
        if let Some(stop) = self.seal_stop.take() {
            let _ = stop.send(());
        }

        let number = parent.number() + 1;
        self.seal_target = number;
        let template = Block {
            header: Header {
                parent_hash: parent.hash(),
                number,
                // Answers for a round are checked against the parent's
                // difficulty; the template mirrors that target.
                difficulty: parent.header.difficulty,
                gas_limit: parent.header.gas_limit,
                time: parent.header.time + 1,
                ..Default::default()
            },
            transactions: vec![],
            pow_answer_uncles: vec![],
            acks: vec![],
        };

        if let Some(remote) = &self.remote {
            remote.new_work(template.clone(), self.pow_tx.clone()).await;
        }

        if self.config.mine {
            if let Some(sealer) = &self.sealer {
                let (stop_tx, stop_rx) = oneshot::channel();
                self.seal_stop = Some(stop_tx);
                let sealer = Arc::clone(sealer);
                let results = self.pow_tx.clone();
                tokio::spawn(async move {
                    if let Err(e) = sealer.seal(&template, results, stop_rx).await {
                        warn!(number, error = %e, "seal round failed");
                    }
                });
            }
        }
    }

    fn publish_status(&self) {
        *self.status.write() = WorkerStatus {
            effective_h: self.effective_h,
            virtual_h: self.virtual_h,
            sealed_h: self.sealed_h,
            reject_h: self.reject_h,
        };
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

fn receipt_hash(receipt: &Receipt) -> cinder_types::Hash {
    let encoded = bincode::serialize(receipt).expect("receipt serialization is infallible");
    H256(keccak256(&encoded))
}

fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
