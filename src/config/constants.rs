//! Application-wide constants and configuration defaults
//!
//! This module centralizes all hardcoded values to make them configurable
//! and maintainable. Values can be overridden via environment variables.

use std::path::PathBuf;

// =============================================================================
// Config File
// =============================================================================

/// Path of the YAML configuration file (default: `config.yaml`)
///
/// Environment variable: `SPREAD_CONFIG`
pub fn config_path() -> PathBuf {
    std::env::var("SPREAD_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.yaml"))
}

// =============================================================================
// Signal
// =============================================================================

/// Divergence threshold in percent (default: 1.5%)
///
/// Environment variable: `SPREAD_THRESHOLD_PCT`
pub fn threshold_pct() -> f64 {
    std::env::var("SPREAD_THRESHOLD_PCT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(1.5)
}

/// Default alert timestamp format (local time, microsecond precision)
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

// =============================================================================
// Polling & Timeouts
// =============================================================================

/// Minimum spacing between tick starts in milliseconds (default: 250ms)
///
/// Environment variable: `POLL_INTERVAL_MS`
pub fn poll_interval_ms() -> u64 {
    std::env::var("POLL_INTERVAL_MS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(250)
}

/// Per-read timeout in milliseconds (default: 2000ms)
///
/// Environment variable: `READ_TIMEOUT_MS`
pub fn read_timeout_ms() -> u64 {
    std::env::var("READ_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(2000)
}

/// Log a monitoring heartbeat every N ticks
pub const LOG_THROTTLE_TICKS: u64 = 100;

// =============================================================================
// HTTP
// =============================================================================

/// User-Agent sent with every venue request
///
/// Environment variable: `HTTP_USER_AGENT`
pub fn user_agent() -> String {
    std::env::var("HTTP_USER_AGENT")
        .unwrap_or_else(|_| format!("spread_watch/{}", env!("CARGO_PKG_VERSION")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_threshold_default() {
        std::env::remove_var("SPREAD_THRESHOLD_PCT");
        assert_eq!(threshold_pct(), 1.5);
    }

    #[test]
    #[serial]
    fn test_threshold_env_override() {
        std::env::set_var("SPREAD_THRESHOLD_PCT", "0.75");
        assert_eq!(threshold_pct(), 0.75);
        std::env::remove_var("SPREAD_THRESHOLD_PCT");
    }

    #[test]
    #[serial]
    fn test_invalid_env_falls_back_to_default() {
        std::env::set_var("READ_TIMEOUT_MS", "soon");
        assert_eq!(read_timeout_ms(), 2000);
        std::env::remove_var("READ_TIMEOUT_MS");
    }

    #[test]
    #[serial]
    fn test_poll_interval_env_override() {
        std::env::set_var("POLL_INTERVAL_MS", "0");
        assert_eq!(poll_interval_ms(), 0);
        std::env::remove_var("POLL_INTERVAL_MS");
        assert_eq!(poll_interval_ms(), 250);
    }

    #[test]
    #[serial]
    fn test_config_path_default_and_override() {
        std::env::remove_var("SPREAD_CONFIG");
        assert_eq!(config_path(), PathBuf::from("config.yaml"));

        std::env::set_var("SPREAD_CONFIG", "/etc/spread_watch.yaml");
        assert_eq!(config_path(), PathBuf::from("/etc/spread_watch.yaml"));
        std::env::remove_var("SPREAD_CONFIG");
    }

    #[test]
    #[serial]
    fn test_user_agent_default() {
        std::env::remove_var("HTTP_USER_AGENT");
        assert!(user_agent().starts_with("spread_watch/"));
    }
}
