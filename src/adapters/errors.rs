//! Quote source error types
//!
//! All source-related errors are wrapped in SourceError enum
//! which implements thiserror for consistent error handling.

use thiserror::Error;

/// Source-specific error types for session and read operations
#[derive(Error, Debug)]
pub enum SourceError {
    /// Opening the data session failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// HTTP request failed before a response body was read
    #[error("Request failed: {0}")]
    Request(String),

    /// Network operation timed out
    #[error("Network timeout after {0}ms")]
    NetworkTimeout(u64),

    /// Invalid or unexpected response from the venue
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Read attempted on a session that is not open (or has died)
    #[error("Session closed: {0}")]
    SessionClosed(String),
}

impl SourceError {
    /// Whether this error means the session itself is gone.
    ///
    /// Every other variant is a per-read failure and is retried next tick.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SourceError::SessionClosed(_))
    }
}

/// Result type alias for source operations
pub type SourceResult<T> = std::result::Result<T, SourceError>;
