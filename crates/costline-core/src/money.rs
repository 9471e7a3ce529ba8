//! # Money Module
//!
//! Lenient decimal parsing for catalog prices, and amount formatting.
//!
//! ## Why Lenient?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  WHAT A HAND-MAINTAINED PRICE SHEET LOOKS LIKE                          │
//! │                                                                         │
//! │    "$40,00"        → 40.00      (comma decimal)                        │
//! │    "1.234,56 ₺"    → 1234.56    (European grouping)                    │
//! │    "USD 1,234.56"  → 1234.56    (US grouping + code)                   │
//! │    "12 500"        → 12500.00   (space grouping)                       │
//! │    "$ -- "         → 0.00       (placeholder, row still kept)          │
//! │                                                                         │
//! │  parse_decimal() reports WHY a value failed.                            │
//! │  parse_price_or_default() never fails: any error becomes 0.0.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use costline_core::money::{format_amount, parse_price_or_default};
//!
//! assert_eq!(parse_price_or_default("$40,00"), 40.0);
//! assert_eq!(parse_price_or_default("call us"), 0.0);
//! assert_eq!(format_amount("₺", 1380.5), "₺1380.50");
//! ```

use tracing::debug;

use crate::error::ParseError;

/// Currency glyphs removed before parsing.
const CURRENCY_GLYPHS: &[char] = &['$', '₺', '€', '£', '¥', '₹', '₽'];

/// Currency codes removed before parsing (matched case-insensitively).
const CURRENCY_CODES: &[&str] = &["USD", "TRY", "EUR", "TL"];

/// Characters that only ever group thousands.
const GROUPING_CHARS: &[char] = &['\'', '’', '\u{00A0}', '\u{202F}'];

// =============================================================================
// Parsing
// =============================================================================

/// Parses a loosely formatted decimal amount.
///
/// ## Separator Rules
/// - both `,` and `.` present: the right-most one is the decimal separator
/// - several `,` only: thousands separators
/// - a single `,` only: decimal separator
/// - several `.` only: thousands separators
/// - whitespace, NBSP and apostrophes: thousands separators
///
/// ## Errors
/// - [`ParseError::Empty`] when nothing is left after stripping
/// - [`ParseError::NotANumber`] for anything that is not digits + one separator
/// - [`ParseError::Negative`] for values below zero
pub fn parse_decimal(raw: &str) -> Result<f64, ParseError> {
    let mut cleaned = raw.to_uppercase();
    for code in CURRENCY_CODES {
        cleaned = cleaned.replace(code, "");
    }
    let cleaned: String = cleaned
        .chars()
        .filter(|c| {
            !c.is_whitespace() && !CURRENCY_GLYPHS.contains(c) && !GROUPING_CHARS.contains(c)
        })
        .collect();

    if cleaned.is_empty() {
        return Err(ParseError::Empty);
    }

    let (negative, body) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.as_str()),
    };

    let normalized = normalize_separators(body);

    let digits_ok = !normalized.is_empty()
        && normalized.chars().any(|c| c.is_ascii_digit())
        && normalized.chars().all(|c| c.is_ascii_digit() || c == '.')
        && normalized.matches('.').count() <= 1;
    if !digits_ok {
        return Err(ParseError::NotANumber(raw.trim().to_string()));
    }

    let value: f64 = normalized
        .parse()
        .map_err(|_| ParseError::NotANumber(raw.trim().to_string()))?;

    if !value.is_finite() {
        return Err(ParseError::NotANumber(raw.trim().to_string()));
    }
    if negative && value > 0.0 {
        return Err(ParseError::Negative(raw.trim().to_string()));
    }

    Ok(value)
}

/// Rewrites `body` so that the only separator left is a single `.` decimal point.
fn normalize_separators(body: &str) -> String {
    let commas = body.matches(',').count();
    let dots = body.matches('.').count();

    match (commas, dots) {
        (0, _) if dots > 1 => body.replace('.', ""),
        (0, _) => body.to_string(),
        (1, 0) => body.replace(',', "."),
        (_, 0) => body.replace(',', ""),
        _ => {
            let last_comma = body.rfind(',').unwrap_or(0);
            let last_dot = body.rfind('.').unwrap_or(0);
            if last_comma > last_dot {
                body.replace('.', "").replace(',', ".")
            } else {
                body.replace(',', "")
            }
        }
    }
}

/// Parses a list price, falling back to `0.0` on any failure.
///
/// The `0.0` default is part of the contract: a row with an unreadable price
/// is still a valid catalog row.
pub fn parse_price_or_default(raw: &str) -> f64 {
    match parse_decimal(raw) {
        Ok(value) => value,
        Err(e) => {
            debug!(raw = %raw, error = %e, "Price unreadable, using 0.0");
            0.0
        }
    }
}

// =============================================================================
// Formatting
// =============================================================================

/// Formats an amount with a leading currency symbol and two decimals.
///
/// ## Example
/// ```rust
/// use costline_core::money::format_amount;
///
/// assert_eq!(format_amount("$", 21.6), "$21.60");
/// assert_eq!(format_amount("$", -3.0), "-$3.00");
/// ```
pub fn format_amount(symbol: &str, value: f64) -> String {
    let sign = if value < 0.0 && value.abs() >= 0.005 {
        "-"
    } else {
        ""
    };
    format!("{}{}{:.2}", sign, symbol, value.abs())
}

// =============================================================================
// Unit Tests
// =============================================================================
