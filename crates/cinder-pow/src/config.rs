//! PoW engine configuration.

use cinder_types::{Address, ZERO_ADDRESS};
use serde::Deserialize;

/// Sealing mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub enum SealMode {
    /// Real nonce search on CPU workers.
    #[default]
    #[serde(rename = "normal")]
    Normal,
    /// Test mode: synthesize a zero nonce immediately.
    #[serde(rename = "fake")]
    Fake,
    /// Delegate to a shared sealer instance.
    #[serde(rename = "shared")]
    Shared,
}

/// Runtime configuration for the PoW engine.
#[derive(Clone, Debug, Deserialize)]
pub struct PowConfig {
    /// Sealing mode.
    pub mode: SealMode,

    /// Number of search threads. `None` means one per host CPU; zero
    /// disables local search (remote miners only).
    pub threads: Option<usize>,

    /// Reward address stamped into locally found answers.
    pub miner: Address,

    /// Rows in the per-epoch dataset. Larger is more memory-hard; tests
    /// shrink it.
    pub dataset_items: usize,

    /// Rounds beyond the head after which answers and pending remote work
    /// go stale. Mirrors the chain config's network parameter; the
    /// embedding node sets both from the same table.
    pub stale_threshold: u64,

    /// URLs notified with new work, external-miner style.
    pub notify: Vec<String>,

    /// POST the full header to notify URLs instead of the compact work
    /// package.
    pub notify_full: bool,

    /// Skip verification of submitted remote work. Testing only.
    pub noverify: bool,
}

impl Default for PowConfig {
    fn default() -> Self {
        Self {
            mode: SealMode::Normal,
            threads: None,
            miner: ZERO_ADDRESS,
            dataset_items: 1 << 14,
            stale_threshold: 7,
            notify: Vec::new(),
            notify_full: false,
            noverify: false,
        }
    }
}

impl PowConfig {
    /// Effective worker count for this host.
    pub fn effective_threads(&self) -> usize {
        self.threads.unwrap_or_else(num_cpus::get)
    }
}
