//! # costline-core: Pure Business Logic for Costline
//!
//! Everything that turns a loosely formatted catalog into priced line items and
//! a cart total lives here, as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Costline Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    costline-desk (shell)                        │   │
//! │  │    search ──► add ──► qty / mark / remove ──► cart totals       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ costline-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌──────────┐       │   │
//! │  │   │ catalog  │  │ pricing  │  │  search  │  │   cart   │       │   │
//! │  │   │ ingest   │─►│  price   │─►│  fuzzy   │─►│ CartStore│       │   │
//! │  │   └──────────┘  └──────────┘  └──────────┘  └──────────┘       │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • PURE FUNCTIONS                          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                ▲                                        │
//! │  ┌─────────────────────────────┴───────────────────────────────────┐   │
//! │  │            costline-feed (CSV sheet, FX quote, caches)          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, PricedProduct, CartLine, ...)
//! - [`money`] - Lenient decimal parsing and amount formatting
//! - [`catalog`] - Raw table → typed catalog ingestion
//! - [`pricing`] - Discount / VAT / FX cost computation
//! - [`search`] - Approximate product lookup
//! - [`cart`] - Session cart state machine
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation for user-adjustable values
//!
//! ## Example Usage
//!
//! ```rust
//! use costline_core::catalog::{ingest, RawTable, RequiredColumns};
//! use costline_core::pricing::{price, PricingParams};
//! use costline_core::cart::CartStore;
//!
//! let table = RawTable::new(
//!     vec!["Product Name".into(), "Supplier".into(), "List Price".into()],
//!     vec![vec!["RO Membrane 75 GPD".into(), "HSC Membrane".into(), "$40,00".into()]],
//! );
//! let (catalog, _report) = ingest(&table, &RequiredColumns::default()).unwrap();
//! let priced = price(&catalog, &PricingParams::new(20.0, 30.0));
//!
//! let mut cart = CartStore::new();
//! cart.add_many(priced.iter());
//! let totals = cart.compute_totals();
//!
//! // 40 × (1 - 0.55) = 18.00 net, × 1.20 VAT = 21.60
//! assert!((totals.total_cost_base - 21.6).abs() < 1e-9);
//! ```

pub mod cart;
pub mod catalog;
pub mod error;
pub mod money;
pub mod pricing;
pub mod search;
pub mod types;
pub mod validation;

// Re-exports so callers can write `costline_core::CartStore`
pub use cart::{CartStatus, CartStore, CartTotals};
pub use catalog::{ingest, IngestReport, RawTable, RequiredColumns};
pub use error::{CoreError, CoreResult, ParseError, SchemaError, ValidationError};
pub use pricing::{price, DiscountOverrides, PricingParams};
pub use search::{search, SearchHit, SearchOptions, SimilarityScorer, WeightedRatio};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// VAT percentage applied to supplier rows when nothing else is configured.
pub const DEFAULT_VAT_PCT: f64 = 20.0;

/// FX rate (local units per base unit) used when no live quote is obtainable.
pub const FALLBACK_FX_RATE: f64 = 34.50;

/// Raw matches considered by a fuzzy search before thresholding.
pub const DEFAULT_SEARCH_LIMIT: usize = 20;

/// Fuzzy scores must be strictly greater than this to be returned.
pub const DEFAULT_SCORE_THRESHOLD: f64 = 60.0;

/// Catalog rows shown when the search box is empty.
pub const DEFAULT_BROWSE_LIMIT: usize = 50;

/// Longest accepted search query, in characters.
pub const MAX_QUERY_CHARS: usize = 100;

/// Largest quantity one cart line may carry.
pub const MAX_LINE_QUANTITY: i64 = 1_000_000;
