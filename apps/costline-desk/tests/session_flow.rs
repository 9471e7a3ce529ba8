//! End-to-end session flows through the command layer, with in-memory
//! stand-ins for the sheet and the FX provider.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use costline_core::{CartStatus, RawTable, RequiredColumns, SearchOptions};
use costline_desk::commands::cart::{self, LineRef};
use costline_desk::commands::{config, product};
use costline_desk::config::DisplaySettings;
use costline_desk::desk::Desk;
use costline_desk::error::ErrorCode;
use costline_desk::render::Renderer;
use costline_desk::shell::{Outcome, Shell};
use costline_desk::state::{FeedState, SessionId, SessionSettings, SessionStore};
use costline_feed::{CatalogSource, FeedError, FeedResult, FxSource, RateProvider};

// =============================================================================
// Stand-ins
// =============================================================================

struct Sheet {
    table: RawTable,
    down: AtomicBool,
}

#[derive(Clone)]
struct SharedSheet(Arc<Sheet>);

#[async_trait]
impl CatalogSource for SharedSheet {
    async fn fetch(&self) -> FeedResult<RawTable> {
        if self.0.down.load(Ordering::SeqCst) {
            Err(FeedError::Timeout(10))
        } else {
            Ok(self.0.table.clone())
        }
    }

    fn name(&self) -> &str {
        "stub-sheet"
    }
}

struct Rates(Option<f64>);

#[async_trait]
impl RateProvider for Rates {
    async fn fetch_rate(&self) -> FeedResult<f64> {
        self.0.ok_or_else(|| FeedError::Http("market closed".to_string()))
    }

    fn name(&self) -> &str {
        "stub-rates"
    }
}

fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
}

fn water_sheet() -> RawTable {
    RawTable::new(
        row(&["Product Name", "Supplier", "List Price"]),
        vec![
            row(&["RO Membrane 75 GPD", "HSC Membrane", "$48,00"]),
            row(&["Sediment Cartridge 10in", "Esli Filtration", "$10.00"]),
            row(&["Faucet Chrome", "Acme", "25"]),
            row(&["Booster Pump", "", "$100"]),
            row(&["Broken Row"]),
            row(&["Carbon Block", "nan", "$ -- "]),
        ],
    )
}

fn desk_over(sheet: SharedSheet, rate: Option<f64>, catalog_ttl: Duration) -> Desk {
    Desk::new(
        FeedState::new(
            Box::new(sheet),
            catalog_ttl,
            Box::new(Rates(rate)),
            Duration::from_secs(600),
            34.5,
            RequiredColumns::default(),
        ),
        SessionStore::new(SessionSettings::new(20.0)),
        SearchOptions::default(),
    )
}

fn shared(table: RawTable) -> SharedSheet {
    SharedSheet(Arc::new(Sheet {
        table,
        down: AtomicBool::new(false),
    }))
}

fn desk(rate: Option<f64>) -> Desk {
    desk_over(shared(water_sheet()), rate, Duration::from_secs(600))
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

// =============================================================================
// Search
// =============================================================================

#[tokio::test]
async fn test_search_prices_with_session_settings() {
    let desk = desk(Some(30.0));
    let sid = SessionId::new();

    let response = product::search_products(&desk, sid, "membrane").await.unwrap();

    let first = &response.products[0];
    assert_eq!(first.number, 1);
    assert_eq!(first.name, "RO Membrane 75 GPD");
    assert_eq!(first.discount_pct, 55.0);
    assert_close(first.net_price, 21.6);
    assert_close(first.unit_cost_base, 25.92);
    assert_close(first.unit_cost_local, 777.6);
    assert!(response.products.iter().all(|p| p.score.unwrap() > 60.0));

    assert_eq!(response.fx.source, FxSource::Live);
    assert_eq!(response.fx.rate, 30.0);
    assert_eq!(response.catalog_size, 5);
    assert_eq!(response.rows_dropped, 1);
}

#[tokio::test]
async fn test_empty_query_browses_in_sheet_order() {
    let desk = desk(Some(30.0));
    let response = product::search_products(&desk, SessionId::new(), "   ")
        .await
        .unwrap();

    let names: Vec<&str> = response.products.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "RO Membrane 75 GPD",
            "Sediment Cartridge 10in",
            "Faucet Chrome",
            "Booster Pump",
            "Carbon Block",
        ]
    );
    assert!(response.products.iter().all(|p| p.score.is_none()));

    // Supplier-less rows never carry VAT; an unreadable price is 0.0
    let pump = &response.products[3];
    assert_eq!(pump.vat_pct, 0.0);
    assert_close(pump.unit_cost_base, 100.0);
    let carbon = &response.products[4];
    assert_eq!(carbon.list_price, 0.0);
    assert_eq!(carbon.vat_pct, 0.0);

    assert_eq!(response.products[1].discount_pct, 52.0);
    assert_eq!(response.products[2].vat_pct, 20.0);
}

#[tokio::test]
async fn test_overlong_query_rejected() {
    let desk = desk(Some(30.0));
    let err = product::search_products(&desk, SessionId::new(), &"x".repeat(101))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);
}

// =============================================================================
// Cart
// =============================================================================

#[tokio::test]
async fn test_cart_flow() {
    let desk = desk(Some(30.0));
    let sid = SessionId::new();

    product::search_products(&desk, sid, "membrane").await.unwrap();

    // Selecting the same result twice appends two lines
    let added = cart::add_to_cart(&desk, sid, &[1, 1]).await.unwrap();
    assert_eq!(added.status, CartStatus::NonEmpty);
    assert_eq!(added.lines.len(), 2);

    let updated = cart::update_quantity(&desk, sid, LineRef::Number(1), 3)
        .await
        .unwrap();
    assert_eq!(updated.totals.total_quantity, 4);
    assert_close(updated.totals.total_cost_base, 25.92 * 4.0);
    assert_close(updated.totals.total_cost_local, 777.6 * 4.0);

    let err = cart::update_quantity(&desk, sid, LineRef::Number(2), 0)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::CartError);
    let err = cart::update_quantity(&desk, sid, LineRef::Number(2), i64::MAX)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::CartError);
    assert_eq!(cart::get_cart(&desk, sid).await.lines[1].quantity, 1);

    let marked = cart::mark_lines(&desk, sid, &[LineRef::Number(2)], true)
        .await
        .unwrap();
    assert_eq!(marked.totals.total_quantity, 4);

    let kept_id = marked.lines[0].id;
    let after = cart::remove_marked(&desk, sid).await;
    assert_eq!(after.lines.len(), 1);
    assert_eq!(after.lines[0].id, kept_id);
    assert_eq!(after.lines[0].quantity, 3);

    let cleared = cart::clear_cart(&desk, sid).await;
    assert_eq!(cleared.status, CartStatus::Empty);
    assert_eq!(cleared.totals.total_quantity, 0);
    assert_eq!(cleared.totals.total_cost_base, 0.0);
}

#[tokio::test]
async fn test_add_requires_a_search() {
    let desk = desk(Some(30.0));
    let err = cart::add_to_cart(&desk, SessionId::new(), &[1]).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);
}

#[tokio::test]
async fn test_unknown_line_is_not_found() {
    let desk = desk(Some(30.0));
    let err = cart::update_quantity(&desk, SessionId::new(), LineRef::Number(1), 2)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[tokio::test]
async fn test_lines_keep_snapshot_until_reprice() {
    let desk = desk(Some(30.0));
    let sid = SessionId::new();

    product::search_products(&desk, sid, "membrane").await.unwrap();
    cart::add_to_cart(&desk, sid, &[1]).await.unwrap();

    config::set_vat(&desk, sid, 0.0).await.unwrap();
    assert_close(cart::get_cart(&desk, sid).await.lines[0].unit_cost_base, 25.92);

    let repriced = cart::reprice_cart(&desk, sid).await.unwrap();
    assert_close(repriced.lines[0].unit_cost_base, 21.6);
    assert_close(repriced.lines[0].unit_cost_local, 648.0);
}

#[tokio::test]
async fn test_replace_lines_is_all_or_nothing() {
    let desk = desk(Some(30.0));
    let (from, to) = (SessionId::new(), SessionId::new());

    product::search_products(&desk, from, "").await.unwrap();
    cart::add_to_cart(&desk, from, &[1, 3]).await.unwrap();
    let lines = {
        let session = desk.sessions().session(from).await;
        let session = session.lock().await;
        session.cart.lines().to_vec()
    };

    let restored = cart::replace_lines(&desk, to, lines.clone()).await.unwrap();
    assert_eq!(restored.lines.len(), 2);
    assert_eq!(restored.lines[1].product_name, "Faucet Chrome");

    let mut broken = lines;
    broken[0].quantity = 0;
    let err = cart::replace_lines(&desk, to, broken).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);
    assert_eq!(cart::get_cart(&desk, to).await.lines[0].quantity, 1);
}

// =============================================================================
// Settings
// =============================================================================

#[tokio::test]
async fn test_discount_override_applies_to_next_cycle() {
    let desk = desk(Some(30.0));
    let sid = SessionId::new();

    product::search_products(&desk, sid, "membrane").await.unwrap();
    let settings = config::set_discount(&desk, sid, 1, Some(0.0)).await.unwrap();
    assert_eq!(settings.discounts.len(), 1);

    let again = product::search_products(&desk, sid, "membrane").await.unwrap();
    assert!(again.products[0].discount_overridden);
    assert_close(again.products[0].unit_cost_base, 57.6);

    product::search_products(&desk, sid, "membrane").await.unwrap();
    config::set_discount(&desk, sid, 1, None).await.unwrap();
    let restored = product::search_products(&desk, sid, "membrane").await.unwrap();
    assert_eq!(restored.products[0].discount_pct, 55.0);
}

#[tokio::test]
async fn test_fx_fallback_and_manual_override() {
    let desk = desk(None);
    let sid = SessionId::new();

    let response = product::search_products(&desk, sid, "faucet").await.unwrap();
    assert_eq!(response.fx.source, FxSource::Fallback);
    assert_eq!(response.fx.rate, 34.5);

    config::set_fx_rate(&desk, sid, Some(40.0)).await.unwrap();
    let manual = product::search_products(&desk, sid, "faucet").await.unwrap();
    assert_eq!(manual.fx.source, FxSource::Manual);
    assert_close(manual.products[0].unit_cost_local, 30.0 * 40.0);

    let err = config::set_fx_rate(&desk, sid, Some(0.0)).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let desk = desk(Some(30.0));
    let (a, b) = (SessionId::new(), SessionId::new());

    config::set_vat(&desk, a, 0.0).await.unwrap();
    product::search_products(&desk, a, "membrane").await.unwrap();
    cart::add_to_cart(&desk, a, &[1]).await.unwrap();

    let other = product::search_products(&desk, b, "membrane").await.unwrap();
    assert_eq!(other.vat_pct, 20.0);
    assert_eq!(cart::get_cart(&desk, b).await.status, CartStatus::Empty);

    assert!(config::end_session(&desk, a).await);
    assert_eq!(cart::get_cart(&desk, a).await.status, CartStatus::Empty);
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn test_missing_columns_is_schema_error() {
    let table = RawTable::new(
        row(&["Product Name", "Price"]),
        vec![row(&["Faucet Chrome", "25"])],
    );
    let desk = desk_over(shared(table), Some(30.0), Duration::from_secs(600));

    let err = product::search_products(&desk, SessionId::new(), "faucet")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::SchemaError);
    assert!(err.message.contains("Supplier"));
    assert!(err.message.contains("List Price"));
}

#[tokio::test]
async fn test_unreachable_sheet_without_copy_is_retrieval_error() {
    let sheet = shared(water_sheet());
    sheet.0.down.store(true, Ordering::SeqCst);
    let desk = desk_over(sheet, Some(30.0), Duration::from_secs(600));

    let err = product::search_products(&desk, SessionId::new(), "faucet")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::RetrievalError);
}

#[tokio::test]
async fn test_refresh_during_outage_serves_previous_sheet() {
    let sheet = shared(water_sheet());
    let desk = desk_over(sheet.clone(), Some(30.0), Duration::from_secs(600));
    let sid = SessionId::new();

    product::search_products(&desk, sid, "faucet").await.unwrap();

    sheet.0.down.store(true, Ordering::SeqCst);
    config::refresh_feeds(&desk, sid).await;

    let response = product::search_products(&desk, sid, "faucet").await.unwrap();
    assert_eq!(response.catalog_size, 5);
}

// =============================================================================
// Shell
// =============================================================================

#[tokio::test]
async fn test_shell_session() {
    let desk = desk(Some(30.0));
    let shell = Shell::new(
        &desk,
        SessionId::new(),
        Renderer::new(&DisplaySettings::default(), false),
    );

    let Outcome::Continue(text) = shell.execute("search membrane").await else {
        panic!("search should not quit");
    };
    assert!(text.contains("RO Membrane 75 GPD"));

    let Outcome::Continue(text) = shell.execute("add 1").await else {
        panic!("add should not quit");
    };
    assert!(text.contains("Cart: 1 lines, 1 units"));
    assert!(text.contains("Total: $25.92  ₺777.60"));

    let Outcome::Continue(text) = shell.execute("qty 1 0").await else {
        panic!("qty should not quit");
    };
    assert!(text.starts_with("error:"));

    assert_eq!(shell.execute("").await, Outcome::Continue(String::new()));
    assert_eq!(shell.execute("quit").await, Outcome::Quit);
}

#[tokio::test]
async fn test_shell_run_reads_until_quit() {
    let desk = desk(Some(30.0));
    let sid = SessionId::new();
    let shell = Shell::new(&desk, sid, Renderer::new(&DisplaySettings::default(), true));

    let input: &[u8] = b"search membrane\nadd 1\nquit\nsearch faucet\n";
    let mut output = Vec::new();
    shell.run(input, &mut output).await.unwrap();

    let text = String::from_utf8(output).unwrap();
    assert!(text.contains("\"productName\": \"RO Membrane 75 GPD\""));
    assert!(!text.contains("Faucet Chrome"));
    assert!(!desk.sessions().contains(sid).await);
}
