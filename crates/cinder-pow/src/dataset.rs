//! The epoch-indexed dataset.
//!
//! Each epoch derives a seed by iterating Keccak-256 from zero, then
//! expands it into a table of 64-byte rows. Rows are what `hashimoto`
//! folds into its mix. Generation is embarrassingly parallel and runs on
//! rayon.
//!
//! Datasets are shared behind `Arc` and must stay rooted for as long as
//! any worker searches against them; the cache may drop its reference
//! while a search is in flight.

use cinder_crypto::{keccak256, keccak256_concat};
use parking_lot::Mutex;
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Rounds per dataset epoch.
pub const EPOCH_LENGTH: u64 = 30_000;

/// One epoch's lookup table.
pub struct Dataset {
    epoch: u64,
    rows: Vec<[u8; 64]>,
}

impl Dataset {
    /// Generate the dataset for `epoch` with `items` rows.
    pub fn generate(epoch: u64, items: usize) -> Self {
        let seed = seed_for_epoch(epoch);
        let started = std::time::Instant::now();

        let rows: Vec<[u8; 64]> = (0..items as u64)
            .into_par_iter()
            .map(|index| {
                let half_a = keccak256_concat(&[&seed, &index.to_le_bytes(), &[0u8]]);
                let half_b = keccak256_concat(&[&seed, &index.to_le_bytes(), &[1u8]]);
                let mut row = [0u8; 64];
                row[..32].copy_from_slice(&half_a);
                row[32..].copy_from_slice(&half_b);
                row
            })
            .collect();

        info!(
            epoch,
            items,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "dataset generated"
        );
        Self { epoch, rows }
    }

    /// The epoch this dataset serves.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True for a degenerate empty dataset.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Fetch a row, wrapping the index into range.
    pub fn row(&self, index: u64) -> &[u8; 64] {
        &self.rows[(index % self.rows.len() as u64) as usize]
    }
}

/// Seed chain: epoch `n` hashes zero through Keccak-256 `n + 1` times.
pub fn seed_for_epoch(epoch: u64) -> [u8; 32] {
    let mut seed = [0u8; 32];
    for _ in 0..=epoch {
        seed = keccak256(&seed);
    }
    seed
}

/// Cache holding the current and previous epoch's datasets.
///
/// Lookups clone the `Arc`, so callers keep their dataset alive even after
/// the cache evicts it.
pub struct DatasetCache {
    items: usize,
    epoch_length: u64,
    cached: Mutex<HashMap<u64, Arc<Dataset>>>,
}

impl DatasetCache {
    /// Cache generating datasets with `items` rows each, using the default
    /// epoch length.
    pub fn new(items: usize) -> Self {
        Self::with_epoch_length(items, EPOCH_LENGTH)
    }

    /// Cache with an explicit epoch length, taken from the chain config.
    pub fn with_epoch_length(items: usize, epoch_length: u64) -> Self {
        Self {
            items,
            epoch_length: epoch_length.max(1),
            cached: Mutex::new(HashMap::new()),
        }
    }

    /// The epoch serving `number`.
    pub fn epoch_of(&self, number: u64) -> u64 {
        number / self.epoch_length
    }

    /// Dataset serving `number`'s epoch, generating on first use.
    pub fn for_number(&self, number: u64) -> Arc<Dataset> {
        let epoch = self.epoch_of(number);
        let mut cached = self.cached.lock();

        if let Some(dataset) = cached.get(&epoch) {
            return Arc::clone(dataset);
        }

        let dataset = Arc::new(Dataset::generate(epoch, self.items));
        cached.insert(epoch, Arc::clone(&dataset));

        // Keep only the current and previous epoch resident.
        if cached.len() > 2 {
            let mut epochs: Vec<u64> = cached.keys().copied().collect();
            epochs.sort_unstable();
            for old in &epochs[..epochs.len() - 2] {
                cached.remove(old);
                debug!(epoch = old, "dataset evicted");
            }
        }
        dataset
    }
}
