//! Cross-venue spread calculation
//!
//! Given the four normalized prices of a tick, computes both directional
//! cross-venue differences and picks the tick's active candidate.
//!
//! # Architecture
//! - `SpreadCalculator`: stateless calculator holding the selection rule
//! - `SpreadCandidate`: chosen direction with its prices and divergence
//! - `SelectionRule`: narrowest (default) or widest directional difference

use serde::{Deserialize, Serialize};

use crate::core::quote::QuoteSnapshot;

// =============================================================================
// Core Types
// =============================================================================

/// Direction of a cross-venue spread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpreadDirection {
    /// Buy price on venue A against sell price on venue B
    AToB,
    /// Buy price on venue B against sell price on venue A
    BToA,
}

impl SpreadDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpreadDirection::AToB => "A_BUY_B_SELL",
            SpreadDirection::BToA => "B_BUY_A_SELL",
        }
    }
}

/// Rule picking which directional difference becomes the candidate
///
/// `Narrowest` keeps the direction with the smaller absolute difference.
/// A larger divergence in the other direction is then never evaluated;
/// `Widest` evaluates that one instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionRule {
    #[default]
    Narrowest,
    Widest,
}

/// Absolute differences of both directions for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalDiffs {
    /// `|a_buy - b_sell|`
    pub a_to_b: f64,
    /// `|a_sell - b_buy|`
    pub b_to_a: f64,
}

/// Active spread candidate of one tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpreadCandidate {
    pub direction: SpreadDirection,
    /// Price read from the buy field of the direction's buy venue
    pub buy_price: f64,
    /// Price read from the sell field of the direction's sell venue
    pub sell_price: f64,
    pub abs_diff: f64,
    /// `abs_diff` relative to the pair midpoint, in percent
    pub pct_diff: f64,
}

impl SpreadCandidate {
    /// `(venue A price, venue B price)` in alert order
    pub fn venue_prices(&self) -> (f64, f64) {
        match self.direction {
            SpreadDirection::AToB => (self.buy_price, self.sell_price),
            SpreadDirection::BToA => (self.sell_price, self.buy_price),
        }
    }
}

// =============================================================================
// SpreadCalculator
// =============================================================================

/// Spread calculator for one venue pair
///
/// All methods are pure and allocation-free.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpreadCalculator {
    rule: SelectionRule,
}

impl SpreadCalculator {
    pub fn new(rule: SelectionRule) -> Self {
        Self { rule }
    }

    /// Both directional absolute differences
    ///
    /// Non-finite inputs are treated as the invalid sentinel `0.0`.
    #[inline]
    pub fn directional_diffs(a_sell: f64, a_buy: f64, b_sell: f64, b_buy: f64) -> DirectionalDiffs {
        DirectionalDiffs {
            a_to_b: (sanitize(a_buy) - sanitize(b_sell)).abs(),
            b_to_a: (sanitize(a_sell) - sanitize(b_buy)).abs(),
        }
    }

    /// Pick the active direction; ties go to `AToB`
    #[inline]
    pub fn select_direction(&self, diffs: DirectionalDiffs) -> SpreadDirection {
        let a_to_b_wins = match self.rule {
            SelectionRule::Narrowest => diffs.a_to_b <= diffs.b_to_a,
            SelectionRule::Widest => diffs.a_to_b >= diffs.b_to_a,
        };
        if a_to_b_wins {
            SpreadDirection::AToB
        } else {
            SpreadDirection::BToA
        }
    }

    /// Percentage divergence of two prices against their midpoint
    ///
    /// Formula: |p1 - p2| / ((p1 + p2) / 2) * 100
    ///
    /// # Edge Cases
    /// * Returns `None` unless both prices are finite and strictly positive
    /// * Returns `None` if the result is not finite
    #[inline]
    pub fn pct_diff(p1: f64, p2: f64) -> Option<f64> {
        if !(p1.is_finite() && p2.is_finite() && p1 > 0.0 && p2 > 0.0) {
            return None;
        }
        let midpoint = (p1 + p2) / 2.0;
        let pct = (p1 - p2).abs() / midpoint * 100.0;
        pct.is_finite().then_some(pct)
    }

    /// Compute the tick's candidate from the four raw prices
    ///
    /// Returns `None` if either price of the selected direction is
    /// non-positive or non-finite (an extraction-failure sentinel).
    ///
    /// Under `Widest`, a direction holding a sentinel is only selected when
    /// the other direction holds one too.
    #[inline]
    #[must_use]
    pub fn calculate(&self, a_sell: f64, a_buy: f64, b_sell: f64, b_buy: f64) -> Option<SpreadCandidate> {
        let diffs = Self::directional_diffs(a_sell, a_buy, b_sell, b_buy);
        let direction = match self.rule {
            SelectionRule::Narrowest => self.select_direction(diffs),
            SelectionRule::Widest => {
                let a_to_b_valid = is_real_price(a_buy) && is_real_price(b_sell);
                let b_to_a_valid = is_real_price(a_sell) && is_real_price(b_buy);
                match (a_to_b_valid, b_to_a_valid) {
                    (true, false) => SpreadDirection::AToB,
                    (false, true) => SpreadDirection::BToA,
                    _ => self.select_direction(diffs),
                }
            }
        };

        let (buy_price, sell_price) = match direction {
            SpreadDirection::AToB => (a_buy, b_sell),
            SpreadDirection::BToA => (b_buy, a_sell),
        };

        let pct_diff = Self::pct_diff(buy_price, sell_price)?;

        Some(SpreadCandidate {
            direction,
            buy_price,
            sell_price,
            abs_diff: (buy_price - sell_price).abs(),
            pct_diff,
        })
    }

    /// Compute the candidate from a normalized snapshot
    #[must_use]
    pub fn calculate_snapshot(&self, snapshot: &QuoteSnapshot) -> Option<SpreadCandidate> {
        let (a_sell, a_buy, b_sell, b_buy) = snapshot.prices();
        self.calculate(a_sell, a_buy, b_sell, b_buy)
    }
}

#[inline(always)]
fn sanitize(price: f64) -> f64 {
    if price.is_finite() {
        price
    } else {
        0.0
    }
}

#[inline(always)]
fn is_real_price(price: f64) -> bool {
    price.is_finite() && price > 0.0
}

// =============================================================================
// Unit Tests
// =============================================================================
