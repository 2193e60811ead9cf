//! The remote sealer: work distribution for external miners.
//!
//! A single-threaded actor owns the pending-work map, per-miner hashrates,
//! and the current work package; every mutation happens inside its select
//! loop. Work notifications are HTTP POSTs spawned as child tasks with a
//! one-second deadline each, tracked so exit can cancel them; they never
//! touch the actor's state.

use crate::config::PowConfig;
use crate::dataset::{seed_for_epoch, DatasetCache};
use crate::hasher::{seal_input, target_from_difficulty};
use crate::verify::verify_answer;
use crate::PowError;
use cinder_types::{Block, Hash, PowAnswer};
use primitive_types::H256;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Rate entries older than this are evicted on the housekeeping tick.
const RATE_TTL: Duration = Duration::from_secs(10);

/// Housekeeping cadence.
const TICK_INTERVAL: Duration = Duration::from_secs(5);

/// Per-notification HTTP deadline.
const NOTIFY_TIMEOUT: Duration = Duration::from_secs(1);

/// The work tuple served to external miners.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkPackage {
    /// PoW pre-image for the round.
    pub pow_hash: Hash,
    /// Dataset seed of the round's epoch.
    pub seed_hash: Hash,
    /// Result boundary: `2^256 / difficulty`.
    pub boundary: Hash,
    /// Round height.
    pub height: u64,
}

impl WorkPackage {
    /// RPC form: `[powHash, seedHash, boundary, heightHex]`.
    pub fn to_rpc(&self) -> [String; 4] {
        [
            format!("0x{}", hex::encode(self.pow_hash)),
            format!("0x{}", hex::encode(self.seed_hash)),
            format!("0x{}", hex::encode(self.boundary)),
            format!("0x{:x}", self.height),
        ]
    }
}

enum RemoteRequest {
    NewWork {
        block: Box<Block>,
        results: mpsc::Sender<PowAnswer>,
    },
    GetWork {
        reply: oneshot::Sender<Result<[String; 4], PowError>>,
    },
    SubmitWork {
        nonce: u64,
        mix_digest: Hash,
        seal_hash: Hash,
        reply: oneshot::Sender<Result<(), PowError>>,
    },
    SubmitRate {
        id: String,
        rate: u64,
    },
    GetRate {
        reply: oneshot::Sender<u64>,
    },
    Exit {
        reply: oneshot::Sender<()>,
    },
}

/// Cloneable handle for talking to the remote sealer actor.
#[derive(Clone)]
pub struct RemoteHandle {
    tx: mpsc::Sender<RemoteRequest>,
}

impl RemoteHandle {
    /// Install a new pending block; its answers flow into `results`.
    pub async fn new_work(&self, block: Block, results: mpsc::Sender<PowAnswer>) {
        let _ = self
            .tx
            .send(RemoteRequest::NewWork {
                block: Box::new(block),
                results,
            })
            .await;
    }

    /// Fetch the current work package in RPC form.
    pub async fn get_work(&self) -> Result<[String; 4], PowError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(RemoteRequest::GetWork { reply })
            .await
            .map_err(|_| PowError::RemoteUnavailable)?;
        rx.await.map_err(|_| PowError::RemoteUnavailable)?
    }

    /// Submit a found nonce for a pending seal hash.
    pub async fn submit_work(
        &self,
        nonce: u64,
        mix_digest: Hash,
        seal_hash: Hash,
    ) -> Result<(), PowError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(RemoteRequest::SubmitWork {
                nonce,
                mix_digest,
                seal_hash,
                reply,
            })
            .await
            .map_err(|_| PowError::RemoteUnavailable)?;
        rx.await.map_err(|_| PowError::RemoteUnavailable)?
    }

    /// Report a remote miner's hashrate.
    pub async fn submit_rate(&self, id: String, rate: u64) {
        let _ = self.tx.send(RemoteRequest::SubmitRate { id, rate }).await;
    }

    /// Sum of all reported rates.
    pub async fn hashrate(&self) -> u64 {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(RemoteRequest::GetRate { reply }).await.is_err() {
            return 0;
        }
        rx.await.unwrap_or(0)
    }

    /// Shut the actor down, cancelling outstanding notifications.
    pub async fn exit(&self) {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(RemoteRequest::Exit { reply }).await.is_ok() {
            let _ = rx.await;
        }
    }
}

/// The remote sealer actor.
pub struct RemoteSealer {
    config: PowConfig,
    datasets: Arc<DatasetCache>,
    rx: mpsc::Receiver<RemoteRequest>,

    works: HashMap<Hash, Block>,
    rates: HashMap<String, (u64, Instant)>,
    current_block: Option<Block>,
    current_work: Option<WorkPackage>,
    results: Option<mpsc::Sender<PowAnswer>>,

    http: reqwest::Client,
    notifications: JoinSet<()>,
}

impl RemoteSealer {
    /// Build the actor and its handle. Call [`RemoteSealer::run`] on a
    /// dedicated task.
    pub fn new(config: PowConfig, datasets: Arc<DatasetCache>) -> (Self, RemoteHandle) {
        let (tx, rx) = mpsc::channel(64);
        let sealer = Self {
            config,
            datasets,
            rx,
            works: HashMap::new(),
            rates: HashMap::new(),
            current_block: None,
            current_work: None,
            results: None,
            http: reqwest::Client::new(),
            notifications: JoinSet::new(),
        };
        (sealer, RemoteHandle { tx })
    }

    /// The actor loop.
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(TICK_INTERVAL);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                request = self.rx.recv() => {
                    match request {
                        Some(RemoteRequest::NewWork { block, results }) => {
                            self.on_new_work(*block, results);
                        }
                        Some(RemoteRequest::GetWork { reply }) => {
                            let _ = reply.send(self.on_get_work());
                        }
                        Some(RemoteRequest::SubmitWork { nonce, mix_digest, seal_hash, reply }) => {
                            let _ = reply.send(self.on_submit_work(nonce, mix_digest, seal_hash));
                        }
                        Some(RemoteRequest::SubmitRate { id, rate }) => {
                            self.rates.insert(id, (rate, Instant::now()));
                        }
                        Some(RemoteRequest::GetRate { reply }) => {
                            let _ = reply.send(self.on_get_rate());
                        }
                        Some(RemoteRequest::Exit { reply }) => {
                            // Cancel outstanding notifications and drain them.
                            self.notifications.shutdown().await;
                            let _ = reply.send(());
                            info!("remote sealer exited");
                            return;
                        }
                        None => {
                            self.notifications.shutdown().await;
                            info!("remote sealer handle dropped, exiting");
                            return;
                        }
                    }
                }
                _ = ticker.tick() => self.on_tick(),
            }
        }
    }

    fn on_new_work(&mut self, block: Block, results: mpsc::Sender<PowAnswer>) {
        let number = block.number();
        let seal_hash = seal_input(block.header.parent_hash, number, self.config.miner);
        let mut boundary = H256::zero();
        target_from_difficulty(block.header.difficulty)
            .to_big_endian(boundary.as_bytes_mut());

        let work = WorkPackage {
            pow_hash: seal_hash,
            seed_hash: H256(seed_for_epoch(self.datasets.epoch_of(number))),
            boundary,
            height: number,
        };

        self.results = Some(results);
        self.works.insert(seal_hash, block.clone());
        self.current_work = Some(work.clone());
        self.current_block = Some(block);
        debug!(number, seal_hash = %seal_hash, "new remote work");

        self.notify(work);
    }

    fn on_get_work(&self) -> Result<[String; 4], PowError> {
        match &self.current_work {
            Some(work) => Ok(work.to_rpc()),
            None => Err(PowError::NoMiningWork),
        }
    }

    fn on_submit_work(
        &mut self,
        nonce: u64,
        mix_digest: Hash,
        seal_hash: Hash,
    ) -> Result<(), PowError> {
        let Some(block) = self.works.get(&seal_hash) else {
            return Err(PowError::SealMismatch {
                seal_hash: format!("{seal_hash:#x}"),
            });
        };

        let answer = PowAnswer {
            number: block.number(),
            nonce,
            mix_digest,
            miner: self.config.miner,
        };

        if !self.config.noverify {
            verify_answer(
                &self.datasets,
                block.header.parent_hash,
                block.header.difficulty,
                &answer,
            )?;
        }

        let current_number = self
            .current_block
            .as_ref()
            .map(|b| b.number())
            .unwrap_or(0);
        if answer.number + self.config.stale_threshold <= current_number {
            debug!(
                number = answer.number,
                current = current_number,
                "stale remote submission dropped"
            );
            return Err(PowError::StaleSeal {
                number: answer.number,
                behind: current_number - answer.number,
            });
        }

        // Non-blocking publish: the worker may already have moved on, and a
        // dropped duplicate answer is harmless.
        if let Some(results) = &self.results {
            if results.try_send(answer).is_err() {
                debug!(number = answer.number, "results channel full, answer dropped");
            }
        }
        info!(number = answer.number, nonce, "remote answer accepted");
        Ok(())
    }

    /// Sum of reported rates. Plain wrapping addition: with absurd reported
    /// rates the sum can overflow and wrap, which callers accept for a
    /// diagnostic figure.
    fn on_get_rate(&self) -> u64 {
        self.rates
            .values()
            .fold(0u64, |sum, (rate, _)| sum.wrapping_add(*rate))
    }

    fn on_tick(&mut self) {
        let now = Instant::now();
        self.rates
            .retain(|_, (_, seen)| now.duration_since(*seen) < RATE_TTL);

        let current_number = self
            .current_block
            .as_ref()
            .map(|b| b.number())
            .unwrap_or(0);
        let stale_threshold = self.config.stale_threshold;
        let before = self.works.len();
        self.works
            .retain(|_, block| block.number() + stale_threshold > current_number);
        if self.works.len() != before {
            debug!(
                evicted = before - self.works.len(),
                current = current_number,
                "stale pending work evicted"
            );
        }
    }

    fn notify(&mut self, work: WorkPackage) {
        if self.config.notify.is_empty() {
            return;
        }
        let payload = if self.config.notify_full {
            match &self.current_block {
                Some(block) => serde_json::to_value(&block.header).unwrap_or_default(),
                None => return,
            }
        } else {
            serde_json::to_value(work.to_rpc()).unwrap_or_default()
        };

        for url in self.config.notify.clone() {
            let client = self.http.clone();
            let body = payload.clone();
            self.notifications.spawn(async move {
                let request = client.post(&url).json(&body).send();
                match tokio::time::timeout(NOTIFY_TIMEOUT, request).await {
                    Ok(Ok(response)) => {
                        debug!(url = %url, status = %response.status(), "work notification sent");
                    }
                    Ok(Err(e)) => warn!(url = %url, error = %e, "work notification failed"),
                    Err(_) => warn!(url = %url, "work notification timed out"),
                }
            });
        }
        // Reap finished notification tasks without blocking the loop.
        while self.notifications.try_join_next().is_some() {}
    }
}
