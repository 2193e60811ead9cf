//! The local sealer: CPU worker fan-out over the nonce space.
//!
//! One `seal` call searches for at most one answer. Workers are plain
//! threads; the supervising future joins them on every exit path so the
//! dataset reference outlives the search.

use crate::config::{PowConfig, SealMode};
use crate::dataset::DatasetCache;
use crate::hasher::{hashimoto, meets_target, seal_input};
use crate::meter::HashrateMeter;
use crate::PowError;
use cinder_types::{Block, Hash, PowAnswer};
use parking_lot::Mutex;
use primitive_types::U256;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Notify};
use tracing::{debug, info, trace, warn};

/// Meter update granularity: one atomic add per 2^15 attempts.
const METER_BATCH: u64 = 1 << 15;

/// What ended a search round.
enum Outcome {
    Stopped,
    Restart,
    Found(Option<PowAnswer>),
}

/// The local PoW sealer.
pub struct Sealer {
    config: PowConfig,
    datasets: Arc<DatasetCache>,
    meter: Arc<HashrateMeter>,
    threads: AtomicUsize,
    /// Seeded from OS entropy on first use.
    rng: Mutex<Option<StdRng>>,
    /// Thread-count changes poke this to restart in-flight searches.
    update: Arc<Notify>,
    shared: Option<Arc<Sealer>>,
}

impl Sealer {
    /// Sealer over its own dataset cache.
    pub fn new(config: PowConfig, datasets: Arc<DatasetCache>) -> Self {
        let threads = config.effective_threads();
        Self {
            config,
            datasets,
            meter: Arc::new(HashrateMeter::new()),
            threads: AtomicUsize::new(threads),
            rng: Mutex::new(None),
            update: Arc::new(Notify::new()),
            shared: None,
        }
    }

    /// Sealer delegating every seal call to `shared`.
    pub fn with_shared(config: PowConfig, shared: Arc<Sealer>) -> Self {
        let datasets = Arc::clone(&shared.datasets);
        let mut sealer = Self::new(config, datasets);
        sealer.config.mode = SealMode::Shared;
        sealer.shared = Some(shared);
        sealer
    }

    /// Local attempt meter.
    pub fn meter(&self) -> Arc<HashrateMeter> {
        Arc::clone(&self.meter)
    }

    /// Local hashrate in attempts per second.
    pub fn hashrate(&self) -> f64 {
        self.meter.rate()
    }

    /// Local plus remote-miner hashrate. Uses the same wrapping addition
    /// as the remote rate sum itself.
    pub async fn aggregate_hashrate(&self, remote: Option<&crate::RemoteHandle>) -> u64 {
        let local = self.meter.rate() as u64;
        match remote {
            Some(handle) => local.wrapping_add(handle.hashrate().await),
            None => local,
        }
    }

    /// Change the worker count; a search in flight restarts with the new
    /// count against the same block.
    pub fn set_threads(&self, threads: usize) {
        self.threads.store(threads, Ordering::Relaxed);
        self.update.notify_waiters();
        info!(threads, "sealer thread count updated");
    }

    /// Search for one answer enabling `block`'s round.
    ///
    /// Sends at most one answer into `results` and returns. `stop` aborts
    /// the search cooperatively; workers exit within one hash attempt.
    pub async fn seal(
        &self,
        block: &Block,
        results: mpsc::Sender<PowAnswer>,
        stop: oneshot::Receiver<()>,
    ) -> Result<(), PowError> {
        match self.config.mode {
            SealMode::Fake => self.seal_fake(block, &results),
            SealMode::Shared => match &self.shared {
                Some(shared) => shared.seal_normal(block, results, stop).await,
                None => self.seal_normal(block, results, stop).await,
            },
            SealMode::Normal => self.seal_normal(block, results, stop).await,
        }
    }

    /// Fake mode: synthesize a zero answer. The send is non-blocking by
    /// contract, since nobody may be reading `results` in tests.
    fn seal_fake(&self, block: &Block, results: &mpsc::Sender<PowAnswer>) -> Result<(), PowError> {
        let answer = PowAnswer {
            number: block.number(),
            nonce: 0,
            mix_digest: Hash::zero(),
            miner: self.config.miner,
        };
        if results.try_send(answer).is_err() {
            debug!(number = block.number(), "fake seal result dropped");
        }
        Ok(())
    }

    async fn seal_normal(
        &self,
        block: &Block,
        results: mpsc::Sender<PowAnswer>,
        mut stop: oneshot::Receiver<()>,
    ) -> Result<(), PowError> {
        let number = block.number();
        let difficulty = block.header.difficulty;
        if difficulty.is_zero() {
            return Err(PowError::ZeroDifficulty);
        }
        let seal = seal_input(block.header.parent_hash, number, self.config.miner);

        loop {
            let threads = self.threads.load(Ordering::Relaxed);
            let abort = Arc::new(AtomicBool::new(false));
            let (found_tx, mut found_rx) = mpsc::channel::<PowAnswer>(1);
            // Root the dataset for the whole round; the cache may evict its
            // own reference while workers still search.
            let dataset = self.datasets.for_number(number);

            if threads == 0 {
                trace!(number, "local search disabled, waiting for stop");
            }

            let mut handles = Vec::with_capacity(threads);
            for worker_id in 0..threads {
                let dataset = Arc::clone(&dataset);
                let abort = Arc::clone(&abort);
                let meter = Arc::clone(&self.meter);
                let found_tx = found_tx.clone();
                let miner = self.config.miner;
                let start_nonce = self.next_start_nonce();

                handles.push(std::thread::spawn(move || {
                    trace!(worker_id, start_nonce, "search worker started");
                    search(
                        &dataset, seal, difficulty, number, miner, start_nonce, &abort, &meter,
                        &found_tx,
                    );
                }));
            }

            let outcome = tokio::select! {
                _ = &mut stop => Outcome::Stopped,
                _ = self.update.notified() => Outcome::Restart,
                answer = found_rx.recv() => Outcome::Found(answer),
            };

            abort.store(true, Ordering::Relaxed);
            drop(found_tx);
            let joiner = tokio::task::spawn_blocking(move || {
                for handle in handles {
                    let _ = handle.join();
                }
            });
            let _ = joiner.await;

            match outcome {
                Outcome::Stopped => {
                    debug!(number, "sealing aborted");
                    return Ok(());
                }
                Outcome::Restart => {
                    debug!(number, "sealing restarted with new thread count");
                    continue;
                }
                Outcome::Found(Some(answer)) => {
                    // Must deliver unless the caller stopped in the meantime.
                    tokio::select! {
                        sent = results.send(answer) => {
                            if sent.is_err() {
                                warn!(number, "result channel closed, answer dropped");
                            } else {
                                info!(number, nonce = answer.nonce, "answer sealed");
                            }
                        }
                        _ = &mut stop => {
                            debug!(number, "stopped while delivering answer");
                        }
                    }
                    return Ok(());
                }
                Outcome::Found(None) => {
                    // All worker senders dropped without a find; only
                    // possible when search is disabled and the channel
                    // closed, treat as an abort.
                    return Ok(());
                }
            }
        }
    }

    fn next_start_nonce(&self) -> u64 {
        let mut guard = self.rng.lock();
        let rng = guard.get_or_insert_with(StdRng::from_entropy);
        rng.gen()
    }
}

/// Worker body: linear scan from a random start nonce.
#[allow(clippy::too_many_arguments)]
fn search(
    dataset: &crate::Dataset,
    seal: Hash,
    difficulty: U256,
    number: u64,
    miner: cinder_types::Address,
    start_nonce: u64,
    abort: &AtomicBool,
    meter: &HashrateMeter,
    found_tx: &mpsc::Sender<PowAnswer>,
) {
    let mut nonce = start_nonce;
    let mut attempts = 0u64;

    while !abort.load(Ordering::Relaxed) {
        let (mix_digest, result) = hashimoto(dataset, seal, nonce);
        attempts += 1;
        if attempts % METER_BATCH == 0 {
            meter.mark(METER_BATCH);
        }

        if meets_target(result, difficulty) {
            // First winner closes the abort flag: at most one answer per
            // seal call.
            if !abort.swap(true, Ordering::SeqCst) {
                let _ = found_tx.try_send(PowAnswer {
                    number,
                    nonce,
                    mix_digest,
                    miner,
                });
            }
            break;
        }
        nonce = nonce.wrapping_add(1);
    }
    meter.mark(attempts % METER_BATCH);
}
