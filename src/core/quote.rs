//! Quote model and normalization
//!
//! Turns the raw text read from each venue into numeric `Quote`s.
//! Every field is normalized on its own: a failed read yields an invalid
//! quote (price `0.0`, `valid == false`) and never aborts the other fields.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::adapters::errors::SourceError;
use crate::config::VenueConfig;

// =============================================================================
// Core Types
// =============================================================================

/// Which price field of a venue a quote was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteSide {
    /// Last sell price
    Sell,
    /// Last buy price
    Buy,
}

impl fmt::Display for QuoteSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuoteSide::Sell => write!(f, "sell"),
            QuoteSide::Buy => write!(f, "buy"),
        }
    }
}

/// One normalized price field
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub venue: Arc<str>,
    pub side: QuoteSide,
    /// Parsed price; `0.0` whenever `valid` is false
    pub price: f64,
    pub valid: bool,
}

impl Quote {
    pub fn new(venue: Arc<str>, side: QuoteSide, price: f64) -> Self {
        Self {
            venue,
            side,
            price,
            valid: true,
        }
    }

    /// Sentinel quote for a field that could not be extracted
    pub fn invalid(venue: Arc<str>, side: QuoteSide) -> Self {
        Self {
            venue,
            side,
            price: 0.0,
            valid: false,
        }
    }
}

/// Sell and buy quotes of one venue for one tick
#[derive(Debug, Clone, PartialEq)]
pub struct VenueQuotes {
    pub sell: Quote,
    pub buy: Quote,
}

impl VenueQuotes {
    pub fn is_all_invalid(&self) -> bool {
        !self.sell.valid && !self.buy.valid
    }
}

/// Both venues' quotes for one tick
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteSnapshot {
    pub a: VenueQuotes,
    pub b: VenueQuotes,
}

impl QuoteSnapshot {
    /// `(a_sell, a_buy, b_sell, b_buy)` with `0.0` for invalid fields
    pub fn prices(&self) -> (f64, f64, f64, f64) {
        (
            self.a.sell.price,
            self.a.buy.price,
            self.b.sell.price,
            self.b.buy.price,
        )
    }

    pub fn valid_fields(&self) -> usize {
        [&self.a.sell, &self.a.buy, &self.b.sell, &self.b.buy]
            .iter()
            .filter(|q| q.valid)
            .count()
    }
}

// =============================================================================
// Venue Pair
// =============================================================================

/// Identity of one venue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Venue {
    pub id: Arc<str>,
    pub label: Arc<str>,
}

impl Venue {
    pub fn new(id: &str, label: &str) -> Self {
        Self {
            id: Arc::from(id),
            label: Arc::from(label),
        }
    }
}

impl From<&VenueConfig> for Venue {
    fn from(config: &VenueConfig) -> Self {
        Self::new(&config.id, &config.label)
    }
}

/// The two venues quoting the monitored instrument
///
/// Built once at startup and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenuePair {
    symbol: Arc<str>,
    a: Venue,
    b: Venue,
}

impl VenuePair {
    pub fn new(symbol: &str, a: Venue, b: Venue) -> Self {
        Self {
            symbol: Arc::from(symbol),
            a,
            b,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn venue_a(&self) -> &Venue {
        &self.a
    }

    pub fn venue_b(&self) -> &Venue {
        &self.b
    }
}

// =============================================================================
// Extraction Errors
// =============================================================================

/// Why a single field did not yield a price
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("field not found")]
    Missing,

    #[error("unparseable price text: {0:?}")]
    Unparseable(String),

    #[error("read timed out after {0}ms")]
    Timeout(u64),

    #[error("source error: {0}")]
    Source(#[from] SourceError),
}

impl ExtractionError {
    /// Session loss ends the monitor; every other failure is per-tick
    pub fn is_fatal(&self) -> bool {
        matches!(self, ExtractionError::Source(e) if e.is_fatal())
    }
}

/// Raw outcome of one `read_field` call, timeout included
pub type RawField = Result<Option<String>, ExtractionError>;

/// Parse a price as displayed by a venue
///
/// Surrounding whitespace and thousands separators are ignored.
/// Empty text is `Missing`; NaN and infinities are `Unparseable`.
pub fn parse_price(raw: &str) -> Result<f64, ExtractionError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ExtractionError::Missing);
    }

    let cleaned: String = trimmed.chars().filter(|c| *c != ',').collect();
    match cleaned.parse::<f64>() {
        Ok(price) if price.is_finite() => Ok(price),
        _ => Err(ExtractionError::Unparseable(trimmed.to_string())),
    }
}

// =============================================================================
// QuoteNormalizer
// =============================================================================

/// Converts raw field reads into quotes; pure, never fails
pub struct QuoteNormalizer;

impl QuoteNormalizer {
    /// Normalize one field, keeping the failure reason
    pub fn normalize_field(
        venue: &Arc<str>,
        side: QuoteSide,
        raw: RawField,
    ) -> Result<Quote, ExtractionError> {
        let text = raw?.ok_or(ExtractionError::Missing)?;
        let price = parse_price(&text)?;
        Ok(Quote::new(Arc::clone(venue), side, price))
    }

    /// Normalize one field, falling back to the invalid sentinel
    pub fn quote_or_sentinel(venue: &Arc<str>, side: QuoteSide, raw: RawField) -> Quote {
        match Self::normalize_field(venue, side, raw) {
            Ok(quote) => quote,
            Err(e) => {
                debug!(venue = %venue, side = %side, error = %e, "Field extraction failed");
                Quote::invalid(Arc::clone(venue), side)
            }
        }
    }

    /// Normalize one venue's sell and buy reads independently
    pub fn normalize_venue(venue: &Arc<str>, sell: RawField, buy: RawField) -> VenueQuotes {
        VenueQuotes {
            sell: Self::quote_or_sentinel(venue, QuoteSide::Sell, sell),
            buy: Self::quote_or_sentinel(venue, QuoteSide::Buy, buy),
        }
    }

    /// Normalize all four reads of a tick
    pub fn normalize(
        pair: &VenuePair,
        a_sell: RawField,
        a_buy: RawField,
        b_sell: RawField,
        b_buy: RawField,
    ) -> QuoteSnapshot {
        QuoteSnapshot {
            a: Self::normalize_venue(&pair.venue_a().id, a_sell, a_buy),
            b: Self::normalize_venue(&pair.venue_b().id, b_sell, b_buy),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
