//! Signal gate: threshold filter plus change dedup
//!
//! # State machine
//! - `Idle`: no alert emitted yet
//! - `Armed`: holds the dedup key of the last emitted alert
//!
//! A candidate at or below the threshold is dropped. Above it, the rendered
//! alert key (timestamp excluded) is compared with the stored one: equal keys
//! are suppressed, a new key is written to the sink and, once the write
//! succeeded, becomes the stored key.

use tracing::debug;

use crate::core::alert::{AlertSink, RenderedAlert};
use crate::core::spread::SpreadCandidate;
use crate::error::AppError;

/// Dedup memory of the gate
///
/// Lives as long as the monitor loop; only `SignalGate` mutates it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertState {
    last_emitted_text: Option<String>,
}

impl AlertState {
    pub fn last_emitted_text(&self) -> Option<&str> {
        self.last_emitted_text.as_deref()
    }
}

/// Observable gate state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Idle,
    Armed,
}

/// Outcome of offering one candidate to the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// `pct_diff <= threshold`
    BelowThreshold,
    /// Same alert as the last one emitted
    Suppressed,
    /// New alert written to the sink
    Emitted,
}

/// Threshold and dedup filter in front of the alert sink
#[derive(Debug, Clone)]
pub struct SignalGate {
    threshold_pct: f64,
    state: AlertState,
}

impl SignalGate {
    pub fn new(threshold_pct: f64) -> Self {
        Self {
            threshold_pct,
            state: AlertState::default(),
        }
    }

    pub fn threshold_pct(&self) -> f64 {
        self.threshold_pct
    }

    pub fn state(&self) -> GateState {
        match self.state.last_emitted_text {
            Some(_) => GateState::Armed,
            None => GateState::Idle,
        }
    }

    pub fn alert_state(&self) -> &AlertState {
        &self.state
    }

    /// Strictly above the threshold
    #[inline]
    pub fn exceeds_threshold(&self, candidate: &SpreadCandidate) -> bool {
        candidate.pct_diff > self.threshold_pct
    }

    /// Offer a candidate; `render` runs only once the threshold is exceeded
    ///
    /// # Errors
    /// Rendering or sink failures are returned as `AppError::Alert` and
    /// leave the stored key untouched, so the same alert is retried on the
    /// next tick.
    pub fn offer<F>(
        &mut self,
        candidate: &SpreadCandidate,
        render: F,
        sink: &mut dyn AlertSink,
    ) -> Result<GateDecision, AppError>
    where
        F: FnOnce(&SpreadCandidate) -> Result<RenderedAlert, AppError>,
    {
        if !self.exceeds_threshold(candidate) {
            return Ok(GateDecision::BelowThreshold);
        }

        let alert = render(candidate)?;

        if self.state.last_emitted_text.as_deref() == Some(alert.key.as_str()) {
            debug!(pct_diff = candidate.pct_diff, "Duplicate alert suppressed");
            return Ok(GateDecision::Suppressed);
        }

        sink.emit(&alert.line)
            .map_err(|e| AppError::Alert(format!("failed to write alert: {}", e)))?;
        self.state.last_emitted_text = Some(alert.key);

        Ok(GateDecision::Emitted)
    }
}
