//! Configuration types for the spread monitor
//!
//! This module defines all configuration structs that are loaded from YAML.
//! Missing numeric settings fall back to `config::constants`, which in turn
//! honour environment overrides.

use std::time::Duration;

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};

use crate::config::constants;
use crate::core::spread::SelectionRule;
use crate::error::AppError;

// ============================================================================
// Venue Configuration
// ============================================================================

/// Where to find one quote field inside a venue's JSON document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldLocator {
    /// RFC 6901 JSON pointer (e.g., "/data/bids/0/0")
    ///
    /// For ladder locators the pointer carries an `{i}` placeholder that is
    /// replaced with the level index.
    pub pointer: String,
    /// Number of order-book levels to walk; `None` reads the pointer once
    #[serde(default)]
    pub ladder_depth: Option<usize>,
    /// Endpoint override for this field (defaults to the venue URL)
    #[serde(default)]
    pub url: Option<String>,
}

impl FieldLocator {
    fn validate(&self, venue: &str, slot: &str) -> Result<(), AppError> {
        if !self.pointer.is_empty() && !self.pointer.starts_with('/') {
            return Err(AppError::Config(format!(
                "Venue '{}': {} pointer must be empty or start with '/' (got '{}')",
                venue, slot, self.pointer
            )));
        }

        match self.ladder_depth {
            Some(0) => {
                return Err(AppError::Config(format!(
                    "Venue '{}': {} ladder_depth must be >= 1",
                    venue, slot
                )));
            }
            Some(_) if !self.pointer.contains("{i}") => {
                return Err(AppError::Config(format!(
                    "Venue '{}': {} ladder pointer must contain '{{i}}' (got '{}')",
                    venue, slot, self.pointer
                )));
            }
            _ => {}
        }

        if let Some(ref url) = self.url {
            validate_url(venue, url)?;
        }

        Ok(())
    }
}

/// One monitored venue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueConfig {
    /// Unique identifier (e.g., "mexc")
    pub id: String,
    /// Label printed in alert lines (e.g., "MEXC Future")
    pub label: String,
    /// Public market-data endpoint returning JSON
    pub url: String,
    /// Locator for the last sell price
    pub sell: FieldLocator,
    /// Locator for the last buy price
    pub buy: FieldLocator,
}

impl VenueConfig {
    /// Validate venue configuration rules
    pub fn validate(&self) -> Result<(), AppError> {
        // Rule: ID cannot be empty
        if self.id.trim().is_empty() {
            return Err(AppError::Config("Venue ID cannot be empty".to_string()));
        }

        if self.label.trim().is_empty() {
            return Err(AppError::Config(format!(
                "Venue '{}': label cannot be empty",
                self.id
            )));
        }

        validate_url(&self.id, &self.url)?;
        self.sell.validate(&self.id, "sell")?;
        self.buy.validate(&self.id, "buy")?;

        Ok(())
    }
}

fn validate_url(venue: &str, url: &str) -> Result<(), AppError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(AppError::Config(format!(
            "Venue '{}': url must start with http:// or https:// (got '{}')",
            venue, url
        )))
    }
}

// ============================================================================
// Monitor Configuration
// ============================================================================

/// Signal and pacing settings for the polling loop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Instrument symbol printed at the head of each alert (e.g., "DEBT_USDT")
    pub symbol: String,
    /// Divergence threshold in percent (e.g., 1.5 = 1.5%)
    #[serde(default = "constants::threshold_pct")]
    pub threshold_pct: f64,
    /// Which directional spread becomes the tick's candidate
    #[serde(default)]
    pub selection: SelectionRule,
    /// Minimum spacing between tick starts; 0 = as fast as reads complete
    #[serde(default = "constants::poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Per-read timeout; a timed-out read counts as an extraction failure
    #[serde(default = "constants::read_timeout_ms")]
    pub read_timeout_ms: u64,
    /// Emit ANSI colors in alert lines
    #[serde(default = "default_color")]
    pub color: bool,
    /// chrono strftime format for the alert timestamp
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,
}

fn default_color() -> bool {
    true
}

fn default_timestamp_format() -> String {
    constants::DEFAULT_TIMESTAMP_FORMAT.to_string()
}

impl MonitorConfig {
    /// Minimal config for a symbol with every default applied
    pub fn for_symbol(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            threshold_pct: constants::threshold_pct(),
            selection: SelectionRule::default(),
            poll_interval_ms: constants::poll_interval_ms(),
            read_timeout_ms: constants::read_timeout_ms(),
            color: default_color(),
            timestamp_format: default_timestamp_format(),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Validate monitor configuration rules
    pub fn validate(&self) -> Result<(), AppError> {
        if self.symbol.trim().is_empty() {
            return Err(AppError::Config("Monitor symbol cannot be empty".to_string()));
        }

        // Rule: no NaN or Infinity
        if !self.threshold_pct.is_finite() {
            return Err(AppError::Config(format!(
                "threshold_pct must be a finite number (got {})",
                self.threshold_pct
            )));
        }

        // Rule: threshold must be in valid range (0% to 100%)
        if self.threshold_pct <= 0.0 || self.threshold_pct >= 100.0 {
            return Err(AppError::Config(format!(
                "threshold_pct must be > 0 and < 100% (got {})",
                self.threshold_pct
            )));
        }

        if self.read_timeout_ms == 0 {
            return Err(AppError::Config("read_timeout_ms must be > 0".to_string()));
        }

        if self.timestamp_format.trim().is_empty() {
            return Err(AppError::Config(
                "timestamp_format cannot be empty".to_string(),
            ));
        }

        if StrftimeItems::new(&self.timestamp_format).any(|item| matches!(item, Item::Error)) {
            return Err(AppError::Config(format!(
                "timestamp_format is not a valid strftime format (got '{}')",
                self.timestamp_format
            )));
        }

        Ok(())
    }
}

// ============================================================================
// Root Configuration
// ============================================================================

/// Root application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub monitor: MonitorConfig,
    /// Exactly two venues: the first is venue A, the second venue B
    pub venues: Vec<VenueConfig>,
}

impl AppConfig {
    /// Validate all configuration rules
    pub fn validate(&self) -> Result<(), AppError> {
        self.monitor.validate()?;

        // Rule: exactly one venue pair
        if self.venues.len() != 2 {
            return Err(AppError::Config(format!(
                "Configuration must contain exactly two venues (got {})",
                self.venues.len()
            )));
        }

        for venue in &self.venues {
            venue.validate()?;
        }

        // Rule: venue_a ≠ venue_b
        if self.venues[0].id == self.venues[1].id {
            return Err(AppError::Config(format!(
                "Duplicate venue ID: '{}'",
                self.venues[0].id
            )));
        }

        Ok(())
    }

    /// Venue A and venue B, in configuration order
    pub fn venue_pair(&self) -> Result<(&VenueConfig, &VenueConfig), AppError> {
        match self.venues.as_slice() {
            [a, b] => Ok((a, b)),
            _ => Err(AppError::Config(format!(
                "Configuration must contain exactly two venues (got {})",
                self.venues.len()
            ))),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
