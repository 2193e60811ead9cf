//! Witness-ring builder.
//!
//! Spawns any subset of a three-witness committee as real workers sharing
//! one chain, one bus, and one transaction pool: a perfectly-synced
//! network where "gossip" is a bus publish. Absent seats model witnesses
//! that fail to act.

use cinder_bus::{BusBroadcaster, CoreEvent, EventPublisher, InMemoryEventBus, Subscription};
use cinder_consensus::{Committee, DposEngine, StaticCommitteeProvider, Witness};
use cinder_crypto::WitnessKeypair;
use cinder_pow::{hashimoto, meets_target, seal_input, DatasetCache};
use cinder_state::MemoryDb;
use cinder_types::{Address, Block, Hash, PowAnswer};
use cinder_worker::{
    Chain, ChainConfig, TransferBackend, TxPool, Worker, WorkerConfig, WorkerDependencies,
    WorkerStatus,
};
use parking_lot::{Mutex, RwLock};
use primitive_types::U256;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Low genesis difficulty so test answers are found in a handful of tries.
pub const TEST_DIFFICULTY: u64 = 4;

/// Ring construction options.
pub struct RingOptions {
    /// Committee seats to actually run (0..3); absent seats stay silent.
    pub seats: Vec<usize>,
    /// Per-worker delay-seal grace period.
    pub delay_seal: Duration,
    /// Per-worker proposer deadline.
    pub seal_deadline: Duration,
    /// Genesis balances.
    pub alloc: Vec<(Address, U256)>,
}

impl Default for RingOptions {
    fn default() -> Self {
        Self {
            seats: vec![0, 1, 2],
            delay_seal: Duration::from_millis(200),
            seal_deadline: Duration::from_secs(60),
            alloc: Vec::new(),
        }
    }
}

/// A running witness ring.
pub struct Ring {
    /// The shared bus.
    pub bus: Arc<InMemoryEventBus>,
    /// The shared canonical chain.
    pub chain: Arc<Chain>,
    /// Dataset cache for crafting and checking answers.
    pub datasets: Arc<DatasetCache>,
    /// The full committee keyring, seat-ordered.
    pub keys: Vec<Arc<WitnessKeypair>>,
    /// The committee itself.
    pub committee: Committee,
    /// The shared transaction pool.
    pub txpool: Arc<Mutex<TxPool>>,
    /// Per-seat worker status handles.
    pub statuses: HashMap<usize, Arc<RwLock<WorkerStatus>>>,
}

impl Ring {
    /// Seat address shortcut.
    pub fn address(&self, seat: usize) -> Address {
        self.committee.members()[seat].address
    }

    /// Craft a valid answer for `number` against the current canonical
    /// parent.
    pub fn answer_for(&self, number: u64, miner: Address) -> PowAnswer {
        let parent = self
            .chain
            .block_by_height(number - 1)
            .expect("parent must exist before mining its round");
        find_answer(
            &self.datasets,
            parent.hash(),
            number,
            parent.header.difficulty,
            miner,
        )
    }

    /// Publish an answer as if gossiped by a peer.
    pub async fn publish_answer(&self, answer: PowAnswer) {
        self.bus.publish(CoreEvent::PowAnswer(answer)).await;
    }
}

/// Spawn the ring.
pub async fn spawn_ring(options: RingOptions) -> Ring {
    let keys: Vec<Arc<WitnessKeypair>> = (1u8..=3)
        .map(|i| Arc::new(WitnessKeypair::from_seed([i; 32])))
        .collect();
    let committee = Committee::new(
        keys.iter()
            .map(|k| Witness::from_key(k.public_key()))
            .collect(),
    )
    .expect("three witnesses");

    let bus = Arc::new(InMemoryEventBus::new());
    let db = Arc::new(MemoryDb::new());
    let chain_config = ChainConfig {
        genesis_difficulty: U256::from(TEST_DIFFICULTY),
        min_difficulty: U256::one(),
        alloc: options.alloc.clone(),
        ..Default::default()
    };
    let chain = Arc::new(Chain::new(chain_config, db, Arc::clone(&bus)).expect("genesis boots"));
    let datasets = Arc::new(DatasetCache::new(64));
    let txpool = Arc::new(Mutex::new(TxPool::new()));

    let mut statuses = HashMap::new();
    for seat in &options.seats {
        let config = WorkerConfig {
            coinbase: committee.members()[*seat].address,
            delay_seal: options.delay_seal,
            seal_deadline: options.seal_deadline,
            ..Default::default()
        };
        let deps = WorkerDependencies {
            config,
            chain: Arc::clone(&chain),
            bus: Arc::clone(&bus),
            committees: Arc::new(StaticCommitteeProvider::new(committee.clone())),
            engine: Arc::new(
                DposEngine::new(Arc::clone(&keys[*seat]))
                    .with_reward(chain.config().block_reward),
            ),
            keypair: Arc::clone(&keys[*seat]),
            txpool: Arc::clone(&txpool),
            backend: Arc::new(TransferBackend),
            broadcaster: Arc::new(BusBroadcaster::new(Arc::clone(&bus))),
            sealer: None,
            datasets: Arc::clone(&datasets),
            remote: None,
        };
        let worker = Worker::new(deps);
        statuses.insert(*seat, worker.status_handle());
        tokio::spawn(worker.run());
    }

    // Let every worker subscribe and self-start before the test publishes.
    tokio::time::sleep(Duration::from_millis(80)).await;

    Ring {
        bus,
        chain,
        datasets,
        keys,
        committee,
        txpool,
        statuses,
    }
}

/// Brute-force a nonce satisfying `difficulty` for one round.
pub fn find_answer(
    datasets: &DatasetCache,
    parent_hash: Hash,
    number: u64,
    difficulty: U256,
    miner: Address,
) -> PowAnswer {
    let dataset = datasets.for_number(number);
    let seal = seal_input(parent_hash, number, miner);
    for nonce in 0..1_000_000 {
        let (mix_digest, result) = hashimoto(&dataset, seal, nonce);
        if meets_target(result, difficulty) {
            return PowAnswer {
                number,
                nonce,
                mix_digest,
                miner,
            };
        }
    }
    panic!("no nonce found under difficulty {difficulty}");
}

/// Await the chain-head event for `number`.
pub async fn wait_for_head(sub: &mut Subscription, number: u64) -> Arc<Block> {
    tokio::time::timeout(Duration::from_secs(15), async {
        loop {
            if let Ok(CoreEvent::ChainHead { block }) = sub.recv().await {
                if block.number() == number {
                    return block;
                }
            }
        }
    })
    .await
    .unwrap_or_else(|_| panic!("no head event for height {number} within deadline"))
}
