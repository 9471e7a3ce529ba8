//! # Validation Module
//!
//! Checks for the values a user can type into a session before they reach
//! pricing or the cart.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Shell parser (clap)                                           │
//! │  ├── Type checks (is it a number at all?)                              │
//! │  └── Immediate usage feedback                                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Command layer (costline-desk)                                 │
//! │  └── THIS MODULE: range and format rules                               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: CartStore                                                     │
//! │  └── quantity ≥ 1, unique line ids (all-or-nothing)                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use costline_core::validation::{validate_fx_rate, validate_vat_pct};
//!
//! validate_vat_pct(20.0).unwrap();
//! assert!(validate_fx_rate(0.0).is_err());
//! ```

use std::collections::HashSet;

use crate::error::ValidationError;
use crate::types::CartLine;
use crate::{MAX_LINE_QUANTITY, MAX_QUERY_CHARS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

fn ensure_finite(field: &str, value: f64) -> ValidationResult<()> {
    if !value.is_finite() {
        return Err(ValidationError::NotFinite {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Pricing Parameters
// =============================================================================

/// Validates a VAT percentage.
///
/// ## Rules
/// - Must be a finite number
/// - Must be ≥ 0 (there is no upper cap; 0 disables VAT)
pub fn validate_vat_pct(vat_pct: f64) -> ValidationResult<()> {
    ensure_finite("vat rate", vat_pct)?;

    if vat_pct < 0.0 {
        return Err(ValidationError::OutOfRange {
            field: "vat rate".to_string(),
            min: 0.0,
            max: f64::MAX,
        });
    }

    Ok(())
}

/// Validates an FX rate (local units per base unit).
///
/// ## Rules
/// - Must be a finite number
/// - Must be strictly positive
///
/// ## Example
/// ```rust
/// use costline_core::validation::validate_fx_rate;
///
/// assert!(validate_fx_rate(34.5).is_ok());
/// assert!(validate_fx_rate(-1.0).is_err());
/// assert!(validate_fx_rate(f64::NAN).is_err());
/// ```
pub fn validate_fx_rate(rate: f64) -> ValidationResult<()> {
    ensure_finite("fx rate", rate)?;

    if rate <= 0.0 {
        return Err(ValidationError::MustBePositive {
            field: "fx rate".to_string(),
        });
    }

    Ok(())
}

/// Validates a discount percentage.
///
/// ## Rules
/// - Must be a finite number in `[0, 100]`
pub fn validate_discount_pct(discount_pct: f64) -> ValidationResult<()> {
    ensure_finite("discount", discount_pct)?;

    if !(0.0..=100.0).contains(&discount_pct) {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0.0,
            max: 100.0,
        });
    }

    Ok(())
}

// =============================================================================
// Search
// =============================================================================

/// Validates a search query.
///
/// ## Rules
/// - Can be empty (returns the browse slice)
/// - At most [`MAX_QUERY_CHARS`] characters after trimming
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > MAX_QUERY_CHARS {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: MAX_QUERY_CHARS,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Cart
// =============================================================================

/// Validates a cart quantity.
///
/// ## Rules
/// - Must be ≥ 1
/// - Must be ≤ [`MAX_LINE_QUANTITY`]
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty < 1 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1.0,
            max: MAX_LINE_QUANTITY as f64,
        });
    }

    Ok(())
}

/// Validates a full replacement line collection.
///
/// ## Rules
/// - Every line has quantity ≥ 1
/// - No two lines share an id
pub fn validate_lines(lines: &[CartLine]) -> ValidationResult<()> {
    let mut seen = HashSet::with_capacity(lines.len());

    for line in lines {
        validate_quantity(line.quantity)?;
        if !seen.insert(line.id) {
            return Err(ValidationError::Duplicate {
                field: "line id".to_string(),
                value: line.id.to_string(),
            });
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
