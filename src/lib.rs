//! Cross-venue spread monitor
//!
//! Samples best buy/sell quotes for one instrument on two venues and prints
//! an alert line whenever the cross-venue divergence exceeds a threshold:
//! - Quote sources (HTTP JSON endpoints) behind the `QuoteSource` trait
//! - Quote normalization, directional spread selection, dedup signal gate
//! - Polling loop with per-read timeouts and guaranteed session release

pub mod adapters;
pub mod config;
pub mod core;
pub mod error;

pub use error::AppError;
