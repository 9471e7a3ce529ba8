//! # Desk Context
//!
//! The application context handed to every command, plus the evaluation
//! cycle each command runs before touching a session.
//!
//! ## One Cycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Desk::cycle(settings)                                                  │
//! │                                                                         │
//! │  1. feed.fetch_catalog()   RawTable   (cache / origin / stale copy)    │
//! │           │                  └── nothing at all ──► RETRIEVAL_ERROR    │
//! │           ▼                                                             │
//! │  2. ingest(table, columns) Catalog    (bad prices → 0.0, rows skipped) │
//! │           │                  └── missing columns ─► SCHEMA_ERROR       │
//! │           ▼                                                             │
//! │  3. FX quote               manual override, else best-effort provider  │
//! │           ▼                                                             │
//! │  4. settings.snapshot(fx)  PricingParams (fixed for this cycle)        │
//! │           ▼                                                             │
//! │  5. price(catalog, params) PricedCatalog                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Only steps 1 and 3 suspend; everything after them is synchronous core
//! code.

use std::time::Instant;

use costline_core::{ingest, price, Catalog, IngestReport, PricedCatalog, PricingParams, SearchOptions};
use costline_feed::FxQuote;
use tracing::info;

use crate::config::{ConfigResult, DeskConfig};
use crate::error::ApiError;
use crate::state::{FeedState, SessionSettings, SessionStore};

/// Result of one evaluation cycle.
#[derive(Debug, Clone)]
pub struct Cycle {
    pub catalog: Catalog,
    pub report: IngestReport,
    pub fx: FxQuote,
    pub params: PricingParams,
    pub priced: PricedCatalog,
}

pub struct Desk {
    feed: FeedState,
    sessions: SessionStore,
    search: SearchOptions,
}

impl Desk {
    pub fn new(feed: FeedState, sessions: SessionStore, search: SearchOptions) -> Self {
        Desk {
            feed,
            sessions,
            search,
        }
    }

    pub fn from_config(config: &DeskConfig) -> ConfigResult<Self> {
        Ok(Desk::new(
            FeedState::from_config(config)?,
            SessionStore::new(SessionSettings::new(config.pricing.vat_pct)),
            config.search_options(),
        ))
    }

    pub fn feed(&self) -> &FeedState {
        &self.feed
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn search_options(&self) -> &SearchOptions {
        &self.search
    }

    /// FX quote for one session: its manual override, else the provider.
    pub async fn fx_for(&self, settings: &SessionSettings) -> FxQuote {
        match settings.fx_override {
            Some(rate) => FxQuote::manual(rate),
            None => self.feed.fx_quote().await,
        }
    }

    /// Runs the whole pipeline from the raw sheet to a priced catalog.
    pub async fn cycle(&self, settings: &SessionSettings) -> Result<Cycle, ApiError> {
        let start = Instant::now();

        let table = self.feed.fetch_catalog().await?;
        let (catalog, report) = ingest(&table, self.feed.columns())?;

        let fx = self.fx_for(settings).await;
        let params = settings.snapshot(fx.rate);
        params.validate()?;

        let priced = price(&catalog, &params);

        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            products = priced.len(),
            vat_pct = params.vat_pct,
            fx_rate = fx.rate,
            fx_source = fx.source.label(),
            "Evaluation cycle complete"
        );

        Ok(Cycle {
            catalog,
            report,
            fx,
            params,
            priced,
        })
    }
}
