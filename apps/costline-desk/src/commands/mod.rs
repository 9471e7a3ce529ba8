//! # Desk Commands
//!
//! Every user action, as an async function over the [`Desk`] context.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs      ◄─── You are here (shared helpers)
//! ├── product.rs  ◄─── Fuzzy search over the priced catalog
//! ├── cart.rs     ◄─── Cart manipulation and totals
//! └── config.rs   ◄─── VAT, FX, discount overrides, refresh
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  search_products(&desk, session_id, "membrane")                        │
//! │         │                                                               │
//! │         ├── validate input                                              │
//! │         ├── lock this session (other sessions keep running)            │
//! │         ├── desk.cycle(&session.settings)  ◄── fresh pipeline run      │
//! │         ├── core operation on the session                               │
//! │         ▼                                                               │
//! │  Result<SearchResponse, ApiError>  (serde, camelCase)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Result numbers and cart line numbers are 1-based, as displayed.
//!
//! [`Desk`]: crate::desk::Desk

pub mod cart;
pub mod config;
pub mod product;

use crate::error::ApiError;
use crate::state::Session;

/// Maps displayed result numbers to product names from the last search.
///
/// All-or-nothing: one bad number rejects the whole selection.
pub(crate) fn picked_names(session: &Session, picks: &[usize]) -> Result<Vec<String>, ApiError> {
    if picks.is_empty() {
        return Err(ApiError::validation("Select at least one result number"));
    }
    if session.last_results().is_empty() {
        return Err(ApiError::validation("No search results yet; run a search first"));
    }

    picks
        .iter()
        .map(|&number| {
            session
                .result_name(number)
                .map(str::to_string)
                .ok_or_else(|| {
                    ApiError::validation(format!(
                        "No result #{} (last search showed {})",
                        number,
                        session.last_results().len()
                    ))
                })
        })
        .collect()
}
