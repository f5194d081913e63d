//! Quote source adapters
//!
//! This module provides the `QuoteSource` abstraction the monitor polls and
//! the HTTP/JSON implementation used against live venues.

pub mod errors;
pub mod http;
pub mod traits;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types for convenience
pub use errors::{SourceError, SourceResult};
pub use http::{locate_field, HttpQuoteSource};
pub use traits::QuoteSource;
