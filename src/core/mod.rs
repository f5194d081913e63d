//! Core module - Quote normalization, spread calculation, signal gate, alerts, monitor loop
//!
//! This module uses **explicit re-exports** instead of glob exports (`pub use module::*`)
//! to keep the public API visible in one place.
//!
//! ## Usage
//! Prefer importing from `crate::core`:
//! ```ignore
//! use crate::core::{SpreadCalculator, SignalGate, AlertFormatter};
//! ```

pub mod alert;
pub mod events;
pub mod gate;
pub mod monitoring;
pub mod quote;
pub mod runtime;
pub mod spread;

// Explicit re-exports for quote module
pub use quote::{
    parse_price, ExtractionError, Quote, QuoteNormalizer, QuoteSide, QuoteSnapshot, RawField,
    Venue, VenuePair, VenueQuotes,
};

// Explicit re-exports for spread module
pub use spread::{DirectionalDiffs, SelectionRule, SpreadCalculator, SpreadCandidate, SpreadDirection};

// Explicit re-exports for gate module
pub use gate::{AlertState, GateDecision, GateState, SignalGate};

// Explicit re-exports for alert module
pub use alert::{AlertFormatter, AlertSink, BufferSink, ColorRole, ConsoleSink, RenderedAlert};

// Explicit re-exports for events module
pub use events::{log_spread_event, log_system_event, SpreadEvent, SystemEvent};

// Explicit re-exports for monitoring module
pub use monitoring::{monitoring_task, Monitor, MonitorSummary, TickOutcome};

// Explicit re-exports for runtime module
pub use runtime::run_monitor;
