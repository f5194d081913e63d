//! Quote source trait definition
//!
//! The QuoteSource trait defines the common interface that every venue
//! source must implement so the monitor loop can poll them uniformly.

use async_trait::async_trait;

use crate::adapters::errors::SourceResult;
use crate::core::quote::QuoteSide;

/// Common trait for all venue quote sources
///
/// A source owns one data session against one venue. The monitor opens it
/// once at startup, calls `read_field` once per slot per tick, and closes it
/// on every exit path.
///
/// # Example Implementation
///
/// ```ignore
/// use async_trait::async_trait;
///
/// struct FixedSource { open: bool }
///
/// #[async_trait]
/// impl QuoteSource for FixedSource {
///     async fn open(&mut self) -> SourceResult<()> {
///         self.open = true;
///         Ok(())
///     }
///     async fn read_field(&self, side: QuoteSide) -> SourceResult<Option<String>> {
///         Ok(Some("100.5".to_string()))
///     }
///     // ... other methods
/// }
/// ```
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Acquire the underlying data session
    ///
    /// Failure here is fatal at startup: the monitor refuses to loop
    /// against a source that never came up.
    async fn open(&mut self) -> SourceResult<()>;

    /// Release the data session
    ///
    /// Must be safe to call on a source that is already closed.
    async fn close(&mut self) -> SourceResult<()>;

    /// Best-effort read of the raw text of one quote slot
    ///
    /// # Returns
    /// * `Ok(Some(text))` - Field located, text returned verbatim
    /// * `Ok(None)` - Field absent on this read
    /// * `Err(...)` - Read failed; `SourceError::SessionClosed` is fatal
    async fn read_field(&self, side: QuoteSide) -> SourceResult<Option<String>>;

    /// Check if the session is currently open
    fn is_open(&self) -> bool;

    /// Venue identifier (e.g., "mexc")
    fn venue_name(&self) -> &str;
}
