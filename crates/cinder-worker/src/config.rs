//! Worker configuration.

use cinder_types::{Address, ZERO_ADDRESS};
use serde::Deserialize;
use std::time::Duration;

/// Runtime configuration for the worker state machine.
#[derive(Clone, Debug, Deserialize)]
pub struct WorkerConfig {
    /// This node's witness identity and reward recipient.
    pub coinbase: Address,

    /// Grace period between reaching simple majority and committing, in
    /// case the supermajority is still in flight.
    #[serde(with = "duration_secs")]
    pub delay_seal: Duration,

    /// How long a co-validator waits for the round's proposer before
    /// broadcasting an oppose vote.
    #[serde(with = "duration_secs")]
    pub seal_deadline: Duration,

    /// Gas-limit corridor targeted by produced blocks.
    pub gas_floor: u64,
    /// Upper bound of the gas-limit corridor.
    pub gas_ceil: u64,

    /// Run the local PoW sealer against each new head.
    pub mine: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            coinbase: ZERO_ADDRESS,
            delay_seal: Duration::from_secs(2),
            seal_deadline: Duration::from_secs(3),
            gas_floor: 8_000_000,
            gas_ceil: 60_000_000,
            mine: false,
        }
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_single_digit_seconds() {
        let config = WorkerConfig::default();
        assert_eq!(config.delay_seal, Duration::from_secs(2));
        assert_eq!(config.seal_deadline, Duration::from_secs(3));
        assert!(!config.mine);
    }
}
