//! # Error Types
//!
//! Domain-specific error types for costline-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  costline-core errors (this file)                                      │
//! │  ├── CoreError        - Cart / catalog operation failures              │
//! │  ├── SchemaError      - Catalog lacks required columns (fatal)         │
//! │  ├── ParseError       - One field failed to parse (always absorbed)    │
//! │  └── ValidationError  - User-adjustable input out of range             │
//! │                                                                         │
//! │  costline-feed errors (separate crate)                                 │
//! │  └── FeedError        - Catalog / FX retrieval failures                │
//! │                                                                         │
//! │  costline-desk errors (in app)                                         │
//! │  └── ApiError         - What the shell prints (serialized)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::types::LineId;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The catalog cannot be ingested at all.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A cart quantity edit was rejected; the line keeps its old quantity.
    ///
    /// ## User Workflow
    /// ```text
    /// qty 2 0
    ///      │
    ///      ▼
    /// InvalidQuantity { requested: 0 }
    ///      │
    ///      ▼
    /// Shell shows: "Quantity must be between 1 and 1000000 (got 0)"
    /// ```
    #[error(
        "Quantity must be between 1 and {max} (got {requested})",
        max = crate::MAX_LINE_QUANTITY
    )]
    InvalidQuantity { line_id: LineId, requested: i64 },

    /// No cart line carries this id.
    #[error("Cart line not found: {0}")]
    LineNotFound(LineId),

    /// No catalog product carries this exact name.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Schema Error
// =============================================================================

/// The catalog header row lacks one or more required columns.
///
/// Fatal for ingestion: nothing is returned, and the message names every
/// missing column so the sheet owner can fix the header row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Catalog is missing required columns: {}", missing.join(", "))]
pub struct SchemaError {
    pub missing: Vec<String>,
}

// =============================================================================
// Parse Error
// =============================================================================

/// A single field could not be read as a number.
///
/// Never propagated past ingestion: callers go through
/// [`crate::money::parse_price_or_default`], which maps every variant to `0.0`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("value is empty")]
    Empty,

    #[error("'{0}' is not a number")]
    NotANumber(String),

    #[error("'{0}' is negative")]
    Negative(String),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised for values a user types in (VAT, FX override, discount, quantity
/// lists, queries) before they reach the pricing or cart logic.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: f64, max: f64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be a finite number.
    #[error("{field} must be a finite number")]
    NotFinite { field: String },

    /// Duplicate value (e.g., duplicate cart line id).
    #[error("{field} '{value}' appears more than once")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_lists_every_missing_column() {
        let err = SchemaError {
            missing: vec!["Supplier".to_string(), "List Price".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Catalog is missing required columns: Supplier, List Price"
        );
    }

    #[test]
    fn test_invalid_quantity_message() {
        let err = CoreError::InvalidQuantity {
            line_id: LineId::new(),
            requested: 0,
        };
        assert_eq!(err.to_string(), "Quantity must be between 1 and 1000000 (got 0)");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "fx rate".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }

    #[test]
    fn test_schema_converts_to_core_error() {
        let core_err: CoreError = SchemaError {
            missing: vec!["Supplier".to_string()],
        }
        .into();
        assert!(matches!(core_err, CoreError::Schema(_)));
        assert_eq!(
            core_err.to_string(),
            "Catalog is missing required columns: Supplier"
        );
    }
}
