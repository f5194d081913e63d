//! Structured event logging
//!
//! Every lifecycle and signal log line carries an `event_type` field so a JSON
//! log stream can be filtered per event.
//!
//! # Event Types
//!
//! - **TASK_STARTED** / **TASK_SHUTDOWN**: monitor loop lifecycle
//! - **SESSION_OPENED** / **SESSION_CLOSED**: quote source sessions
//! - **SPREAD_DETECTED**: a candidate crossed the threshold and was emitted
//! - **ALERT_SUPPRESSED**: a candidate crossed the threshold but repeated the last alert

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info};

use crate::core::spread::SpreadCandidate;

// =============================================================================
// SpreadEvent
// =============================================================================

/// Signal event types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadEventType {
    SpreadDetected,
    AlertSuppressed,
}

impl fmt::Display for SpreadEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpreadEventType::SpreadDetected => write!(f, "SPREAD_DETECTED"),
            SpreadEventType::AlertSuppressed => write!(f, "ALERT_SUPPRESSED"),
        }
    }
}

/// Signal event with the candidate's context
#[derive(Debug, Clone)]
pub struct SpreadEvent {
    pub event_type: SpreadEventType,
    pub timestamp_ms: u64,
    pub symbol: String,
    pub direction: &'static str,
    pub buy_price: f64,
    pub sell_price: f64,
    pub pct_diff: f64,
    pub threshold_pct: f64,
}

impl SpreadEvent {
    fn from_candidate(
        event_type: SpreadEventType,
        symbol: &str,
        candidate: &SpreadCandidate,
        threshold_pct: f64,
    ) -> Self {
        Self {
            event_type,
            timestamp_ms: current_timestamp_ms(),
            symbol: symbol.to_string(),
            direction: candidate.direction.as_str(),
            buy_price: candidate.buy_price,
            sell_price: candidate.sell_price,
            pct_diff: candidate.pct_diff,
            threshold_pct,
        }
    }

    /// Create a SPREAD_DETECTED event
    pub fn spread_detected(symbol: &str, candidate: &SpreadCandidate, threshold_pct: f64) -> Self {
        Self::from_candidate(SpreadEventType::SpreadDetected, symbol, candidate, threshold_pct)
    }

    /// Create an ALERT_SUPPRESSED event
    pub fn alert_suppressed(symbol: &str, candidate: &SpreadCandidate, threshold_pct: f64) -> Self {
        Self::from_candidate(SpreadEventType::AlertSuppressed, symbol, candidate, threshold_pct)
    }
}

/// Log a signal event
///
/// Emitted alerts at INFO, suppressed repeats at DEBUG.
pub fn log_spread_event(event: &SpreadEvent) {
    let event_type = event.event_type.to_string();
    let pct_diff = format_pct(event.pct_diff);
    let threshold = format_pct(event.threshold_pct);

    match event.event_type {
        SpreadEventType::SpreadDetected => {
            info!(
                event_type = %event_type,
                timestamp = event.timestamp_ms,
                symbol = %event.symbol,
                direction = event.direction,
                buy_price = event.buy_price,
                sell_price = event.sell_price,
                pct_diff = %pct_diff,
                threshold = %threshold,
                "Spread alert emitted"
            );
        }
        SpreadEventType::AlertSuppressed => {
            debug!(
                event_type = %event_type,
                timestamp = event.timestamp_ms,
                symbol = %event.symbol,
                direction = event.direction,
                pct_diff = %pct_diff,
                "Duplicate alert suppressed"
            );
        }
    }
}

// =============================================================================
// SystemEvent
// =============================================================================

/// Lifecycle event types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemEventType {
    /// Task started (INFO)
    TaskStarted,
    /// Task stopping with reason (INFO)
    TaskShutdown,
    /// Source session opened (INFO)
    SessionOpened,
    /// Source session released (DEBUG, WARN when release failed)
    SessionClosed,
}

impl fmt::Display for SystemEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SystemEventType::TaskStarted => write!(f, "TASK_STARTED"),
            SystemEventType::TaskShutdown => write!(f, "TASK_SHUTDOWN"),
            SystemEventType::SessionOpened => write!(f, "SESSION_OPENED"),
            SystemEventType::SessionClosed => write!(f, "SESSION_CLOSED"),
        }
    }
}

/// System event for centralized lifecycle logging
pub struct SystemEvent {
    pub event_type: SystemEventType,
    pub task_name: Option<String>,
    pub venue: Option<String>,
    pub message: String,
    pub details: Option<String>,
}

impl SystemEvent {
    pub fn task_started(task_name: &str) -> Self {
        Self {
            event_type: SystemEventType::TaskStarted,
            task_name: Some(task_name.to_string()),
            venue: None,
            message: format!("{} task started", task_name),
            details: None,
        }
    }

    pub fn task_shutdown(task_name: &str, reason: &str) -> Self {
        Self {
            event_type: SystemEventType::TaskShutdown,
            task_name: Some(task_name.to_string()),
            venue: None,
            message: format!("{} shutting down", task_name),
            details: Some(reason.to_string()),
        }
    }

    pub fn session_opened(venue: &str) -> Self {
        Self {
            event_type: SystemEventType::SessionOpened,
            task_name: None,
            venue: Some(venue.to_string()),
            message: "Quote source session opened".to_string(),
            details: None,
        }
    }

    /// `error` is set when the release itself failed
    pub fn session_closed(venue: &str, error: Option<String>) -> Self {
        Self {
            event_type: SystemEventType::SessionClosed,
            task_name: None,
            venue: Some(venue.to_string()),
            message: "Quote source session closed".to_string(),
            details: error,
        }
    }
}

/// Log a system event at its level
pub fn log_system_event(event: &SystemEvent) {
    let event_type = event.event_type.to_string();

    match event.event_type {
        SystemEventType::TaskStarted | SystemEventType::TaskShutdown => {
            info!(
                event_type = %event_type,
                task = ?event.task_name,
                details = ?event.details,
                "{}", event.message
            );
        }
        SystemEventType::SessionOpened => {
            info!(
                event_type = %event_type,
                venue = ?event.venue,
                "{}", event.message
            );
        }
        SystemEventType::SessionClosed => {
            if let Some(ref details) = event.details {
                tracing::warn!(
                    event_type = %event_type,
                    venue = ?event.venue,
                    error = %details,
                    "Quote source session release failed"
                );
            } else {
                debug!(
                    event_type = %event_type,
                    venue = ?event.venue,
                    "{}", event.message
                );
            }
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Current time in milliseconds since Unix epoch
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Percentage with 4 decimals (`1.5` → `"1.5000%"`)
pub fn format_pct(value: f64) -> String {
    format!("{:.4}%", value)
}
