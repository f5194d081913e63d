//! Spread monitoring loop
//!
//! One tick reads the four quote slots of both venues concurrently, normalizes
//! them, computes the active spread candidate and routes it through the signal
//! gate to the alert sink.
//!
//! # Architecture
//! - `Monitor`: owns the pair, calculator, gate and formatter; runs one tick
//! - `monitoring_task`: paces ticks at a minimum interval, shutdown-aware via
//!   broadcast receiver
//! - Only session loss ends the loop early; every other failure is per tick

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::Instant;
use tracing::{debug, error};

use crate::adapters::errors::SourceError;
use crate::adapters::traits::QuoteSource;
use crate::config::constants::LOG_THROTTLE_TICKS;
use crate::config::AppConfig;
use crate::core::alert::{AlertFormatter, AlertSink};
use crate::core::events::{
    format_pct, log_spread_event, log_system_event, SpreadEvent, SystemEvent,
};
use crate::core::gate::{GateDecision, SignalGate};
use crate::core::quote::{ExtractionError, QuoteNormalizer, QuoteSide, RawField, Venue, VenuePair};
use crate::core::spread::SpreadCalculator;
use crate::error::Result;

/// Outcome of one non-fatal tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Selected direction had an invalid or non-positive price
    NoCandidate,
    BelowThreshold,
    Suppressed,
    Emitted,
    /// Alert could not be rendered or written; state unchanged
    Failed,
}

/// Tick counters, returned when the loop stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorSummary {
    pub ticks: u64,
    pub no_candidate: u64,
    pub below_threshold: u64,
    pub suppressed: u64,
    pub emitted: u64,
    pub failed: u64,
}

impl MonitorSummary {
    fn record(&mut self, outcome: TickOutcome) {
        self.ticks += 1;
        match outcome {
            TickOutcome::NoCandidate => self.no_candidate += 1,
            TickOutcome::BelowThreshold => self.below_threshold += 1,
            TickOutcome::Suppressed => self.suppressed += 1,
            TickOutcome::Emitted => self.emitted += 1,
            TickOutcome::Failed => self.failed += 1,
        }
    }
}

// =============================================================================
// Monitor
// =============================================================================

/// Single-owner sampling and signal pipeline for one venue pair
pub struct Monitor {
    pair: VenuePair,
    calculator: SpreadCalculator,
    gate: SignalGate,
    formatter: AlertFormatter,
    read_timeout: Duration,
    summary: MonitorSummary,
}

impl Monitor {
    pub fn new(
        pair: VenuePair,
        calculator: SpreadCalculator,
        gate: SignalGate,
        formatter: AlertFormatter,
        read_timeout: Duration,
    ) -> Self {
        Self {
            pair,
            calculator,
            gate,
            formatter,
            read_timeout,
            summary: MonitorSummary::default(),
        }
    }

    /// Build from a validated configuration
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let (a, b) = config.venue_pair()?;
        let monitor = &config.monitor;
        let pair = VenuePair::new(&monitor.symbol, Venue::from(a), Venue::from(b));

        Ok(Self::new(
            pair.clone(),
            SpreadCalculator::new(monitor.selection),
            SignalGate::new(monitor.threshold_pct),
            AlertFormatter::new(pair, monitor.color, monitor.timestamp_format.clone()),
            monitor.read_timeout(),
        ))
    }

    pub fn gate(&self) -> &SignalGate {
        &self.gate
    }

    pub fn summary(&self) -> MonitorSummary {
        self.summary
    }

    /// Run one tick
    ///
    /// # Errors
    /// Only fatal session loss is returned as an error. Field failures,
    /// missing candidates and alert write failures are tick outcomes.
    pub async fn tick(
        &mut self,
        source_a: &dyn QuoteSource,
        source_b: &dyn QuoteSource,
        sink: &mut dyn AlertSink,
    ) -> Result<TickOutcome> {
        let timeout = self.read_timeout;
        let (a_sell, a_buy, b_sell, b_buy) = tokio::join!(
            read_slot(source_a, QuoteSide::Sell, timeout),
            read_slot(source_a, QuoteSide::Buy, timeout),
            read_slot(source_b, QuoteSide::Sell, timeout),
            read_slot(source_b, QuoteSide::Buy, timeout),
        );

        let raws = [a_sell, a_buy, b_sell, b_buy];
        if let Some(venue) = raws.iter().find_map(session_lost) {
            return Err(SourceError::SessionClosed(venue).into());
        }
        let [a_sell, a_buy, b_sell, b_buy] = raws;

        let snapshot = QuoteNormalizer::normalize(&self.pair, a_sell, a_buy, b_sell, b_buy);
        let outcome = match self.calculator.calculate_snapshot(&snapshot) {
            None => {
                debug!(
                    valid_fields = snapshot.valid_fields(),
                    "No spread candidate this tick"
                );
                TickOutcome::NoCandidate
            }
            Some(candidate) => {
                let formatter = &self.formatter;
                match self.gate.offer(&candidate, |c| formatter.render(c), sink) {
                    Ok(GateDecision::BelowThreshold) => TickOutcome::BelowThreshold,
                    Ok(GateDecision::Suppressed) => {
                        log_spread_event(&SpreadEvent::alert_suppressed(
                            self.pair.symbol(),
                            &candidate,
                            self.gate.threshold_pct(),
                        ));
                        TickOutcome::Suppressed
                    }
                    Ok(GateDecision::Emitted) => {
                        log_spread_event(&SpreadEvent::spread_detected(
                            self.pair.symbol(),
                            &candidate,
                            self.gate.threshold_pct(),
                        ));
                        TickOutcome::Emitted
                    }
                    Err(e) => {
                        error!(error = %e, "Alert emission failed");
                        TickOutcome::Failed
                    }
                }
            }
        };

        self.summary.record(outcome);
        Ok(outcome)
    }
}

/// Read one slot under the per-read timeout
async fn read_slot(source: &dyn QuoteSource, side: QuoteSide, timeout: Duration) -> RawField {
    match tokio::time::timeout(timeout, source.read_field(side)).await {
        Ok(result) => result.map_err(ExtractionError::from),
        Err(_) => Err(ExtractionError::Timeout(timeout.as_millis() as u64)),
    }
}

fn session_lost(raw: &RawField) -> Option<String> {
    match raw {
        Err(ExtractionError::Source(SourceError::SessionClosed(venue))) => Some(venue.clone()),
        _ => None,
    }
}

// =============================================================================
// Loop
// =============================================================================

/// Polling loop over two open sources
///
/// Tick starts are spaced at least `poll_interval` apart; a zero interval
/// yields to the scheduler between ticks. Returns when a shutdown signal
/// arrives, or with an error on session loss.
pub async fn monitoring_task(
    monitor: &mut Monitor,
    source_a: &dyn QuoteSource,
    source_b: &dyn QuoteSource,
    sink: &mut dyn AlertSink,
    poll_interval: Duration,
    shutdown_rx: &mut broadcast::Receiver<()>,
) -> Result<MonitorSummary> {
    log_system_event(&SystemEvent::task_started("monitor"));

    loop {
        let started = Instant::now();

        tokio::select! {
            // Shutdown takes priority
            biased;
            _ = shutdown_signal(shutdown_rx) => {
                log_system_event(&SystemEvent::task_shutdown("monitor", "shutdown_signal"));
                break;
            }
            result = monitor.tick(source_a, source_b, sink) => {
                if let Err(e) = result {
                    log_system_event(&SystemEvent::task_shutdown("monitor", "session_lost"));
                    return Err(e);
                }
            }
        }

        let summary = monitor.summary();
        if summary.ticks % LOG_THROTTLE_TICKS == 0 {
            debug!(
                event_type = "SPREAD_MONITORING",
                ticks = summary.ticks,
                emitted = summary.emitted,
                suppressed = summary.suppressed,
                below_threshold = summary.below_threshold,
                no_candidate = summary.no_candidate,
                threshold = %format_pct(monitor.gate().threshold_pct()),
                "Monitoring spread"
            );
        }

        match poll_interval.checked_sub(started.elapsed()) {
            Some(rest) if !rest.is_zero() => {
                tokio::select! {
                    biased;
                    _ = shutdown_signal(shutdown_rx) => {
                        log_system_event(&SystemEvent::task_shutdown("monitor", "shutdown_signal"));
                        break;
                    }
                    _ = tokio::time::sleep(rest) => {}
                }
            }
            _ => tokio::task::yield_now().await,
        }
    }

    Ok(monitor.summary())
}

/// Resolves once a shutdown signal was sent
///
/// A channel whose senders are all gone never carried a signal, so it stays
/// pending instead of stopping the loop.
async fn shutdown_signal(shutdown_rx: &mut broadcast::Receiver<()>) {
    match shutdown_rx.recv().await {
        Ok(()) | Err(RecvError::Lagged(_)) => {}
        Err(RecvError::Closed) => std::future::pending::<()>().await,
    }
}
