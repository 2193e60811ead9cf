//! The canonical chain view and the block writer.
//!
//! The writer commits `{block, receipts, state}` atomically under the
//! chain's write lock, checks the committed state root against the header,
//! persists through the KV port, and emits the head event every other
//! subsystem keys on. Duplicate commits of the same block hash are
//! idempotent.

use crate::WorkerError;
use cinder_bus::{CoreEvent, EventPublisher, InMemoryEventBus};
use cinder_state::{KeyValueStore, StateDb};
use cinder_types::{Address, Block, Hash, Header, PowAnswer, Receipt};
use parking_lot::RwLock;
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Schema version stamped into fresh databases.
const DATABASE_VERSION: u64 = 1;

/// Result of a write attempt.
#[derive(Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The block is now canonical.
    Written,
    /// The block hash was already committed; nothing changed.
    AlreadyKnown,
}

/// Chain parameters fixed at genesis.
///
/// The whole table is persisted under the genesis hash at boot; the node's
/// components are constructed from it (pool staleness windows, the
/// difficulty floor, the producer reward, the dataset epoch length).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Network identifier.
    pub chain_id: u64,
    /// Rounds per PoW dataset epoch.
    pub epoch_length: u64,
    /// Rounds beyond the head after which answers, ACKs, and pending
    /// remote work go stale.
    pub stale_threshold: u64,
    /// Difficulty floor of the network.
    pub min_difficulty: U256,
    /// Reward credited to the round's producer at finalization.
    pub block_reward: U256,
    /// Difficulty of the genesis block (and the target of round 1);
    /// floored by `min_difficulty` at boot.
    pub genesis_difficulty: U256,
    /// Gas limit of the genesis block.
    pub genesis_gas_limit: u64,
    /// Timestamp of the genesis block.
    pub genesis_time: u64,
    /// Initial account balances.
    pub alloc: Vec<(Address, U256)>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            chain_id: 88,
            epoch_length: cinder_pow::EPOCH_LENGTH,
            stale_threshold: 7,
            min_difficulty: U256::from(cinder_consensus::MIN_DIFFICULTY),
            block_reward: U256::from(cinder_consensus::BLOCK_REWARD),
            genesis_difficulty: U256::from(cinder_consensus::MIN_DIFFICULTY),
            genesis_gas_limit: 30_000_000,
            genesis_time: 0,
            alloc: Vec::new(),
        }
    }
}

struct ChainInner {
    blocks: HashMap<Hash, Arc<Block>>,
    receipts: HashMap<Hash, Vec<Receipt>>,
    by_height: HashMap<u64, Hash>,
    states: HashMap<Hash, StateDb>,
    head: Arc<Block>,
}

/// The canonical view: blocks, receipts, per-block states, and the head.
pub struct Chain {
    config: ChainConfig,
    db: Arc<dyn KeyValueStore>,
    bus: Arc<InMemoryEventBus>,
    inner: RwLock<ChainInner>,
}

impl Chain {
    /// Boot the chain: build genesis, record shutdown markers, persist the
    /// chain config and database version.
    pub fn new(
        config: ChainConfig,
        db: Arc<dyn KeyValueStore>,
        bus: Arc<InMemoryEventBus>,
    ) -> Result<Self, WorkerError> {
        let mut state = StateDb::with_alloc(config.alloc.iter().map(|(a, b)| (*a, *b)));
        let state_root = state.commit();

        let genesis = Arc::new(Block {
            header: Header {
                number: 0,
                difficulty: config.genesis_difficulty.max(config.min_difficulty),
                gas_limit: config.genesis_gas_limit,
                time: config.genesis_time,
                state_root,
                ..Default::default()
            },
            transactions: vec![],
            pow_answer_uncles: vec![],
            acks: vec![],
        });
        let genesis_hash = genesis.hash();

        // Unclean-shutdown markers: a marker still present at boot means
        // the previous run died without a clean stop.
        let mut markers: Vec<u64> = match db.get(keys::UNCLEAN_SHUTDOWN)? {
            Some(bytes) => {
                let markers = bincode::deserialize(&bytes).unwrap_or_default();
                warn!(boots = ?markers, "unclean shutdown detected, continuing");
                markers
            }
            None => Vec::new(),
        };
        markers.push(unix_now());
        if markers.len() > 10 {
            let excess = markers.len() - 10;
            markers.drain(..excess);
        }
        db.put(
            keys::UNCLEAN_SHUTDOWN,
            &bincode::serialize(&markers).expect("marker serialization is infallible"),
        )?;

        match db.get(keys::DATABASE_VERSION)? {
            Some(bytes) if bincode::deserialize::<u64>(&bytes).ok() != Some(DATABASE_VERSION) => {
                warn!("database version mismatch, continuing with current schema");
            }
            None => {
                db.put(
                    keys::DATABASE_VERSION,
                    &bincode::serialize(&DATABASE_VERSION).expect("u64 serializes"),
                )?;
            }
            _ => {}
        }
        db.put(
            &keys::chain_config(genesis_hash),
            &bincode::serialize(&config).expect("chain config serializes"),
        )?;
        db.put(&keys::block(genesis_hash), &genesis.encode())?;
        db.put(keys::LAST_BLOCK_HASH, genesis_hash.as_bytes())?;

        let mut blocks = HashMap::new();
        blocks.insert(genesis_hash, Arc::clone(&genesis));
        let mut by_height = HashMap::new();
        by_height.insert(0, genesis_hash);
        let mut states = HashMap::new();
        states.insert(genesis_hash, state);

        info!(
            chain_id = config.chain_id,
            genesis = %genesis_hash,
            "chain booted"
        );

        Ok(Self {
            config,
            db,
            bus,
            inner: RwLock::new(ChainInner {
                blocks,
                receipts: HashMap::new(),
                by_height,
                states,
                head: genesis,
            }),
        })
    }

    /// Chain parameters.
    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Current head block.
    pub fn head(&self) -> Arc<Block> {
        Arc::clone(&self.inner.read().head)
    }

    /// Block by hash.
    pub fn block_by_hash(&self, hash: &Hash) -> Option<Arc<Block>> {
        self.inner.read().blocks.get(hash).cloned()
    }

    /// Canonical block at a height.
    pub fn block_by_height(&self, number: u64) -> Option<Arc<Block>> {
        let inner = self.inner.read();
        inner
            .by_height
            .get(&number)
            .and_then(|hash| inner.blocks.get(hash))
            .cloned()
    }

    /// Receipts of a committed block.
    pub fn receipts_of(&self, hash: &Hash) -> Option<Vec<Receipt>> {
        self.inner.read().receipts.get(hash).cloned()
    }

    /// A deep copy of the state as of `block_hash`, for building on top.
    pub fn state_at(&self, block_hash: &Hash) -> Option<StateDb> {
        self.inner
            .read()
            .states
            .get(block_hash)
            .map(StateDb::deep_copy)
    }

    /// PoW answers recorded on chain for a height (the winners embedded by
    /// the canonical block there).
    pub fn answers_at(&self, number: u64) -> Vec<PowAnswer> {
        self.block_by_height(number)
            .map(|block| block.header.pow_answers.clone())
            .unwrap_or_default()
    }

    /// Commit `{block, receipts, state}` atomically and announce the new
    /// head. Idempotent on duplicate hashes.
    pub async fn write_block_with_state(
        &self,
        block: Block,
        mut receipts: Vec<Receipt>,
        mut state: StateDb,
    ) -> Result<WriteOutcome, WorkerError> {
        let hash = block.hash();
        let number = block.number();

        let block = {
            let mut inner = self.inner.write();
            if inner.blocks.contains_key(&hash) {
                debug!(number, hash = %hash, "duplicate commit ignored");
                return Ok(WriteOutcome::AlreadyKnown);
            }

            let parent_ok = inner
                .blocks
                .get(&block.header.parent_hash)
                .map(|parent| parent.number() + 1 == number)
                .unwrap_or(false);
            if !parent_ok {
                return Err(WorkerError::ParentMissing {
                    parent: format!("{:#x}", block.header.parent_hash),
                    number,
                });
            }

            for (index, receipt) in receipts.iter_mut().enumerate() {
                receipt.block_hash = hash;
                receipt.block_number = number;
                receipt.tx_index = index as u32;
            }

            let computed = state.commit();
            if computed != block.header.state_root {
                return Err(WorkerError::StateRootMismatch {
                    number,
                    header: format!("{:#x}", block.header.state_root),
                    computed: format!("{computed:#x}"),
                });
            }

            self.db.put(&keys::block(hash), &block.encode())?;
            self.db.put(
                &keys::header(hash),
                &bincode::serialize(&block.header).expect("header serializes"),
            )?;
            self.db.put(
                &keys::receipts(hash),
                &bincode::serialize(&receipts).expect("receipts serialize"),
            )?;
            self.db.put(
                &keys::state_root(number),
                block.header.state_root.as_bytes(),
            )?;
            self.db.put(keys::LAST_BLOCK_HASH, hash.as_bytes())?;

            let block = Arc::new(block);
            inner.blocks.insert(hash, Arc::clone(&block));
            inner.receipts.insert(hash, receipts);
            inner.states.insert(hash, state);
            inner.by_height.insert(number, hash);
            if number >= inner.head.number() {
                inner.head = Arc::clone(&block);
            }
            block
        };

        info!(
            number,
            hash = %hash,
            txs = block.transactions.len(),
            virtual_block = block.is_virtual(),
            "block committed"
        );
        crate::metrics::record_block_committed();

        self.bus
            .publish(CoreEvent::NewMinedBlock {
                block: Arc::clone(&block),
            })
            .await;
        self.bus.publish(CoreEvent::ChainHead { block }).await;
        Ok(WriteOutcome::Written)
    }

    /// Remove the unclean-shutdown marker; call on orderly exit.
    pub fn mark_clean_shutdown(&self) -> Result<(), WorkerError> {
        self.db.delete(keys::UNCLEAN_SHUTDOWN)?;
        Ok(())
    }
}

fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Persisted key layout.
mod keys {
    use cinder_types::Hash;

    pub const LAST_BLOCK_HASH: &[u8] = b"last-block-hash";
    pub const UNCLEAN_SHUTDOWN: &[u8] = b"unclean-shutdown";
    pub const DATABASE_VERSION: &[u8] = b"database-version";

    pub fn block(hash: Hash) -> Vec<u8> {
        [b"block:".as_slice(), hash.as_bytes()].concat()
    }

    pub fn header(hash: Hash) -> Vec<u8> {
        [b"header:".as_slice(), hash.as_bytes()].concat()
    }

    pub fn receipts(hash: Hash) -> Vec<u8> {
        [b"receipts:".as_slice(), hash.as_bytes()].concat()
    }

    pub fn state_root(number: u64) -> Vec<u8> {
        [b"state-root:".as_slice(), &number.to_be_bytes()].concat()
    }

    pub fn chain_config(genesis: Hash) -> Vec<u8> {
        [b"chain-config:".as_slice(), genesis.as_bytes()].concat()
    }
}
