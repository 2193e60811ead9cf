//! # Cinder Telemetry
//!
//! One-time structured logging setup for a Cinderchain node. The core
//! crates only emit `tracing` events; this crate installs the subscriber.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cinder_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     let config = TelemetryConfig::from_env();
//!     init_telemetry(&config).expect("failed to init telemetry");
//!     // tracing macros now produce structured output
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CINDER_LOG_LEVEL` | `info` | Log level filter |
//! | `CINDER_LOG_JSON` | `false` | Emit JSON lines instead of text |

mod config;

pub use config::TelemetryConfig;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Telemetry initialization errors.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The subscriber was installed more than once.
    #[error("failed to install tracing subscriber: {0}")]
    SubscriberInit(String),
}

/// Install the global `tracing` subscriber.
///
/// Call once at node startup. A second call returns an error rather than
/// replacing the subscriber.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_new(&config.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = if config.json_logs {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|e| TelemetryError::SubscriberInit(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_succeeds_once() {
        let config = TelemetryConfig::default();
        // First install wins; a repeat in the same process errors.
        let first = init_telemetry(&config);
        let second = init_telemetry(&config);
        assert!(first.is_ok() || second.is_err());
    }
}
