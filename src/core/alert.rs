//! Alert rendering and output sinks
//!
//! Renders an accepted spread candidate as one colorized console line:
//!
//! ```text
//! DEBT_USDT    =>  MEXC Future: 0.00451 | LBank Future: 0.00462 | Abs Diff: 0.00011 | % Diff: 2.41% | Time: 2026-10-18 12:00:00.000000
//! ```
//!
//! The price taken from a buy field is green, the one taken from a sell
//! field red, and both metrics cyan. Everything before `Time:` is the dedup
//! key used by the signal gate.

use std::fmt::Write as _;
use std::io::{self, Write as _};

use crossterm::style::Stylize;

use crate::core::quote::VenuePair;
use crate::core::spread::{SpreadCandidate, SpreadDirection};
use crate::error::AppError;

/// Color role of one rendered value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorRole {
    /// Price read from a buy field
    Buy,
    /// Price read from a sell field
    Sell,
    /// Abs / percentage difference
    Metric,
}

/// A rendered alert: the dedup key and the full printable line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedAlert {
    /// Line content without the timestamp
    pub key: String,
    /// `key` followed by the `Time:` segment
    pub line: String,
}

/// Formats alert lines for one venue pair
#[derive(Debug, Clone)]
pub struct AlertFormatter {
    pair: VenuePair,
    color: bool,
    timestamp_format: String,
}

impl AlertFormatter {
    pub fn new(pair: VenuePair, color: bool, timestamp_format: impl Into<String>) -> Self {
        Self {
            pair,
            color,
            timestamp_format: timestamp_format.into(),
        }
    }

    /// Color roles of `(venue A price, venue B price)` for a direction
    pub fn color_roles(direction: SpreadDirection) -> (ColorRole, ColorRole) {
        match direction {
            SpreadDirection::AToB => (ColorRole::Buy, ColorRole::Sell),
            SpreadDirection::BToA => (ColorRole::Sell, ColorRole::Buy),
        }
    }

    /// Alert body without timestamp; this is the dedup key
    pub fn body(&self, candidate: &SpreadCandidate) -> String {
        let (price_a, price_b) = candidate.venue_prices();
        let (role_a, role_b) = Self::color_roles(candidate.direction);

        format!(
            "{}    =>  {}: {} | {}: {} | Abs Diff: {} | % Diff: {} | ",
            self.pair.symbol(),
            self.pair.venue_a().label,
            self.paint(fmt_price(price_a), role_a),
            self.pair.venue_b().label,
            self.paint(fmt_price(price_b), role_b),
            self.paint(format!("{:.5}", candidate.abs_diff), ColorRole::Metric),
            self.paint(format!("{:.2}%", candidate.pct_diff), ColorRole::Metric),
        )
    }

    /// Render with an explicit timestamp text
    pub fn render_at(&self, candidate: &SpreadCandidate, timestamp: &str) -> RenderedAlert {
        let key = self.body(candidate);
        let line = format!("{}Time: {}", key, timestamp);
        RenderedAlert { key, line }
    }

    /// Render stamped with the current local time
    ///
    /// # Errors
    /// `AppError::Alert` if the configured timestamp format cannot be rendered
    pub fn render(&self, candidate: &SpreadCandidate) -> Result<RenderedAlert, AppError> {
        let mut timestamp = String::new();
        write!(
            timestamp,
            "{}",
            chrono::Local::now().format(&self.timestamp_format)
        )
        .map_err(|_| {
            AppError::Alert(format!(
                "invalid timestamp format '{}'",
                self.timestamp_format
            ))
        })?;
        Ok(self.render_at(candidate, &timestamp))
    }

    fn paint(&self, text: String, role: ColorRole) -> String {
        if !self.color {
            return text;
        }
        match role {
            ColorRole::Buy => text.green().to_string(),
            ColorRole::Sell => text.red().to_string(),
            ColorRole::Metric => text.cyan().to_string(),
        }
    }
}

/// Shortest round-trip form, always with a fractional part (`100.0`, `0.00451`)
pub fn fmt_price(value: f64) -> String {
    format!("{:?}", value)
}

// =============================================================================
// Sinks
// =============================================================================

/// Destination of emitted alert lines
pub trait AlertSink: Send {
    fn emit(&mut self, line: &str) -> io::Result<()>;
}

/// Writes alert lines to stdout
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl AlertSink for ConsoleSink {
    fn emit(&mut self, line: &str) -> io::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{}", line)?;
        out.flush()
    }
}

/// Keeps emitted lines in memory
#[derive(Debug, Default)]
pub struct BufferSink {
    pub lines: Vec<String>,
}

impl AlertSink for BufferSink {
    fn emit(&mut self, line: &str) -> io::Result<()> {
        self.lines.push(line.to_string());
        Ok(())
    }
}
