//! Telemetry configuration.

use serde::Deserialize;

/// Logging configuration, read from the environment or deserialized from
/// the node's config file.
#[derive(Clone, Debug, Deserialize)]
pub struct TelemetryConfig {
    /// `tracing` env-filter directive, e.g. `info` or `cinder_worker=debug`.
    pub log_level: String,

    /// Emit JSON lines for log shippers instead of human-readable text.
    pub json_logs: bool,
}

impl TelemetryConfig {
    /// Build from `CINDER_LOG_LEVEL` / `CINDER_LOG_JSON`.
    pub fn from_env() -> Self {
        Self {
            log_level: std::env::var("CINDER_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            json_logs: std::env::var("CINDER_LOG_JSON")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_plain_info() {
        let config = TelemetryConfig::default();
        assert_eq!(config.log_level, "info");
        assert!(!config.json_logs);
    }
}
