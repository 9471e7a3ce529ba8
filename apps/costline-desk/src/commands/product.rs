//! # Product Commands
//!
//! Fuzzy lookup over the freshly priced catalog.
//!
//! ## Search Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  > search membrane 75                                                   │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  validate_search_query()  (trim, ≤ 100 chars)                          │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  desk.cycle()  ──► PricedCatalog (current VAT / FX / discounts)        │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  search()  empty query → first 50 rows in sheet order                  │
//! │            otherwise   → top 20 by score, then score > 60              │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  session remembers the names, so "add 1 3" can refer to them           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Instant;

use costline_core::validation::validate_search_query;
use costline_core::{search, PricedProduct, SearchHit};
use costline_feed::FxQuote;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::desk::Desk;
use crate::error::ApiError;
use crate::state::SessionId;

/// One search result as shown to the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    /// 1-based result number, used by `add` and `discount`.
    pub number: usize,
    pub name: String,
    pub supplier: String,
    pub list_price: f64,
    pub discount_pct: f64,
    /// True when the session overrides the supplier default.
    pub discount_overridden: bool,
    pub vat_pct: f64,
    pub net_price: f64,
    pub unit_cost_base: f64,
    pub unit_cost_local: f64,
    /// Similarity score; absent when browsing with an empty query.
    pub score: Option<f64>,
}

impl ProductDto {
    fn from_hit(number: usize, hit: &SearchHit<'_, PricedProduct>, overridden: bool) -> Self {
        let priced = hit.item;
        ProductDto {
            number,
            name: priced.product.name.clone(),
            supplier: priced.product.supplier.clone(),
            list_price: priced.product.list_price,
            discount_pct: priced.discount_pct,
            discount_overridden: overridden,
            vat_pct: priced.vat_applicable_pct,
            net_price: priced.net_price,
            unit_cost_base: priced.unit_cost_base,
            unit_cost_local: priced.unit_cost_local,
            score: hit.score,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub query: String,
    pub products: Vec<ProductDto>,
    /// Products in the whole catalog (not just the hits).
    pub catalog_size: usize,
    /// Sheet rows dropped as malformed or duplicate in this cycle.
    pub rows_dropped: usize,
    pub vat_pct: f64,
    pub fx: FxQuote,
}

/// Searches the catalog by product name.
///
/// ## Arguments
/// * `query` - Free text; empty lists the first rows of the sheet
///
/// ## Returns
/// Ranked results priced with the session's current settings
pub async fn search_products(
    desk: &Desk,
    session_id: SessionId,
    query: &str,
) -> Result<SearchResponse, ApiError> {
    debug!(session = %session_id, query = %query, "search_products command");
    let start = Instant::now();

    let query = validate_search_query(query)?;

    let session = desk.sessions().session(session_id).await;
    let mut session = session.lock().await;

    let cycle = desk.cycle(&session.settings).await?;
    let hits = search(cycle.priced.items(), &query, desk.search_options());

    let products: Vec<ProductDto> = hits
        .iter()
        .enumerate()
        .map(|(idx, hit)| {
            let overridden = cycle.params.discounts.get(hit.item.name()).is_some();
            ProductDto::from_hit(idx + 1, hit, overridden)
        })
        .collect();

    session.remember_results(products.iter().map(|p| p.name.clone()).collect());

    info!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        count = products.len(),
        query = %query,
        "Product search complete"
    );

    Ok(SearchResponse {
        query,
        products,
        catalog_size: cycle.catalog.len(),
        rows_dropped: cycle.report.rows_skipped + cycle.report.duplicates_skipped,
        vat_pct: cycle.params.vat_pct,
        fx: cycle.fx,
    })
}
