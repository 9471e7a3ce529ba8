//! # Feed Error Types
//!
//! Retrieval failures for the catalog sheet and the FX quote.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Feed Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │   Transport     │  │    Payload      │  │     Local               │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Http           │  │  Decode         │  │  Io                     │ │
//! │  │  Status         │  │  Empty          │  │                         │ │
//! │  │  Timeout        │  │  InvalidRate    │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  Catalog: fatal only when no copy at all is available.                 │
//! │  FX: never fatal, BestEffortRates always yields a quote.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Result type alias for feed operations.
pub type FeedResult<T> = Result<T, FeedError>;

#[derive(Debug, Error)]
pub enum FeedError {
    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// Request could not be sent or the connection broke.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Server answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// No answer within the configured timeout.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    // =========================================================================
    // Payload Errors
    // =========================================================================
    /// Body could not be decoded (CSV or JSON).
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Source answered but carried nothing usable.
    #[error("Source returned no data: {0}")]
    Empty(String),

    /// Quote was zero, negative or not a number.
    #[error("Invalid exchange rate: {0}")]
    InvalidRate(f64),

    // =========================================================================
    // Local Errors
    // =========================================================================
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<csv::Error> for FeedError {
    fn from(err: csv::Error) -> Self {
        FeedError::Decode(err.to_string())
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        FeedError::Decode(err.to_string())
    }
}

impl FeedError {
    /// Maps a reqwest failure, keeping timeouts distinguishable.
    pub fn from_reqwest(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            FeedError::Timeout(timeout_secs)
        } else if err.is_decode() {
            FeedError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            FeedError::Status {
                url: err.url().map(|u| u.to_string()).unwrap_or_default(),
                status: status.as_u16(),
            }
        } else {
            FeedError::Http(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_message() {
        let err = FeedError::Status {
            url: "https://sheet.example/export".to_string(),
            status: 404,
        };
        assert_eq!(err.to_string(), "https://sheet.example/export returned HTTP 404");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "catalog.csv");
        let err: FeedError = io.into();
        assert!(matches!(err, FeedError::Io(_)));
    }
}
