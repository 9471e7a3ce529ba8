//! # costline-feed: Catalog and FX Collaborators
//!
//! The I/O half of Costline. Fetches the raw catalog table and the exchange
//! rate, caches both for a bounded time, and degrades gracefully when the
//! network does not cooperate.
//!
//! ## Failure Policy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Catalog:  fresh cache → origin → stale cache → FeedError (fatal)      │
//! │  FX rate:  fresh cache → provider → last known good → fallback 34.50   │
//! │                                                                         │
//! │  Both caches are dropped to "stale" by an explicit refresh.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`catalog_source`] - CSV sheet over HTTP or from disk
//! - [`fx`] - Exchange-rate providers and the best-effort wrapper
//! - [`cache`] - Single-value TTL cache
//! - [`error`] - Retrieval errors

pub mod cache;
pub mod catalog_source;
pub mod error;
pub mod fx;

pub use cache::TtlCache;
pub use catalog_source::{parse_csv, CachedCatalogSource, CatalogSource, FileCsvSource, HttpCsvSource};
pub use error::{FeedError, FeedResult};
pub use fx::{BestEffortRates, FxQuote, FxSource, RateProvider, StaticRateProvider, YahooRateProvider};
