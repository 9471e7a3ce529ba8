//! # API Error Type
//!
//! Unified error type for desk commands.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Costline                               │
//! │                                                                         │
//! │  Command Function → Result<T, ApiError>                                 │
//! │         │                                                               │
//! │         ├── FeedError (no catalog at all) ──────► RETRIEVAL_ERROR       │
//! │         ├── SchemaError (missing columns) ──────► SCHEMA_ERROR          │
//! │         ├── CoreError::InvalidQuantity ─────────► CART_ERROR            │
//! │         ├── CoreError::LineNotFound ────────────► NOT_FOUND             │
//! │         ├── ValidationError ────────────────────► VALIDATION_ERROR      │
//! │         └── Success ────────────────────────────► response DTO          │
//! │                                                                         │
//! │  FX failures never reach this layer: the rate falls back instead.      │
//! │  Price parse failures never reach it either: they become 0.0.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Serialization
//! With `--json` the shell prints failures as:
//! ```json
//! {
//!   "code": "SCHEMA_ERROR",
//!   "message": "Catalog is missing required columns: Supplier"
//! }
//! ```

use costline_core::{CoreError, SchemaError, ValidationError};
use costline_feed::FeedError;
use serde::Serialize;

/// API error returned from desk commands.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for command responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Product, cart line or search result does not exist
    NotFound,

    /// Input validation failed
    ValidationError,

    /// Catalog lacks required columns
    SchemaError,

    /// Catalog could not be obtained and no earlier copy exists
    RetrievalError,

    /// Cart mutation rejected
    CartError,

    /// Anything else
    Internal,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    /// Creates a cart error.
    pub fn cart(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::CartError, message)
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Schema(e) => e.into(),
            CoreError::InvalidQuantity { .. } => ApiError::cart(err.to_string()),
            CoreError::LineNotFound(id) => ApiError::not_found("Cart line", &id.to_string()),
            CoreError::ProductNotFound(name) => ApiError::not_found("Product", &name),
            CoreError::Validation(e) => e.into(),
        }
    }
}

impl From<SchemaError> for ApiError {
    fn from(err: SchemaError) -> Self {
        ApiError::new(ErrorCode::SchemaError, err.to_string())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

/// Converts retrieval errors to API errors.
///
/// Only reached when the catalog has never been fetched successfully.
impl From<FeedError> for ApiError {
    fn from(err: FeedError) -> Self {
        tracing::error!(error = %err, "Catalog retrieval failed with no cached copy");
        ApiError::new(
            ErrorCode::RetrievalError,
            format!("Catalog unavailable: {}", err),
        )
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use costline_core::LineId;

    #[test]
    fn test_schema_error_mapping() {
        let err: ApiError = CoreError::from(SchemaError {
            missing: vec!["Supplier".to_string(), "List Price".to_string()],
        })
        .into();
        assert_eq!(err.code, ErrorCode::SchemaError);
        assert!(err.message.contains("Supplier, List Price"));
    }

    #[test]
    fn test_invalid_quantity_is_cart_error() {
        let err: ApiError = CoreError::InvalidQuantity {
            line_id: LineId::new(),
            requested: 0,
        }
        .into();
        assert_eq!(err.code, ErrorCode::CartError);
    }

    #[test]
    fn test_feed_error_is_retrieval_error() {
        let err: ApiError = FeedError::Timeout(10).into();
        assert_eq!(err.code, ErrorCode::RetrievalError);
        assert!(err.message.contains("10 seconds"));
    }

    #[test]
    fn test_wire_format() {
        let json = serde_json::to_value(ApiError::not_found("Product", "Faucet")).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Product not found: Faucet");
    }
}
