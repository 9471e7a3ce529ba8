//! # FX Rate Providers
//!
//! Live exchange-rate retrieval with a guaranteed answer.
//!
//! ## Best-Effort Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BestEffortRates::quote()                                               │
//! │                                                                         │
//! │   1. fresh cached quote  (within refresh interval)   ──► Cached         │
//! │   2. live provider fetch (bounded by timeout)        ──► Live           │
//! │   3. last known good quote (stale, kept on failure)  ──► LastKnownGood  │
//! │   4. fixed fallback constant                          ──► Fallback      │
//! │                                                                         │
//! │  Never returns an error: every failure is logged and absorbed.          │
//! │  A manual per-session override skips all of this (FxSource::Manual).   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cache::TtlCache;
use crate::error::{FeedError, FeedResult};

/// Default market-data endpoint.
pub const YAHOO_CHART_BASE: &str = "https://query1.finance.yahoo.com";

// =============================================================================
// Quote Types
// =============================================================================

/// Where a quote came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FxSource {
    Live,
    Cached,
    LastKnownGood,
    Fallback,
    Manual,
}

impl FxSource {
    pub fn label(&self) -> &'static str {
        match self {
            FxSource::Live => "live",
            FxSource::Cached => "cached",
            FxSource::LastKnownGood => "last known good",
            FxSource::Fallback => "fallback",
            FxSource::Manual => "manual",
        }
    }
}

/// One exchange rate (local units per base unit).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FxQuote {
    pub rate: f64,
    pub source: FxSource,
    pub as_of: DateTime<Utc>,
}

impl FxQuote {
    pub fn manual(rate: f64) -> Self {
        FxQuote {
            rate,
            source: FxSource::Manual,
            as_of: Utc::now(),
        }
    }
}

fn check_rate(rate: f64) -> FeedResult<f64> {
    if rate.is_finite() && rate > 0.0 {
        Ok(rate)
    } else {
        Err(FeedError::InvalidRate(rate))
    }
}

// =============================================================================
// Provider Trait
// =============================================================================

#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Fetches the current rate. Must be positive and finite on success.
    async fn fetch_rate(&self) -> FeedResult<f64>;

    fn name(&self) -> &str;
}

#[async_trait]
impl<P: RateProvider + ?Sized> RateProvider for Box<P> {
    async fn fetch_rate(&self) -> FeedResult<f64> {
        (**self).fetch_rate().await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Always answers with the same rate.
#[derive(Debug, Clone)]
pub struct StaticRateProvider {
    rate: f64,
}

impl StaticRateProvider {
    pub fn new(rate: f64) -> Self {
        StaticRateProvider { rate }
    }
}

#[async_trait]
impl RateProvider for StaticRateProvider {
    async fn fetch_rate(&self) -> FeedResult<f64> {
        check_rate(self.rate)
    }

    fn name(&self) -> &str {
        "static"
    }
}

// =============================================================================
// Yahoo Chart Provider
// =============================================================================

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
}

/// Reads `chart.result[0].meta.regularMarketPrice` from a chart response body.
pub fn parse_chart_price(body: &[u8]) -> FeedResult<f64> {
    let response: ChartResponse = serde_json::from_slice(body)?;
    let price = response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .and_then(|r| r.meta.regular_market_price)
        .ok_or_else(|| FeedError::Empty("chart response has no market price".to_string()))?;
    check_rate(price)
}

/// Yahoo Finance chart endpoint (symbol such as `TRY=X`).
#[derive(Debug, Clone)]
pub struct YahooRateProvider {
    client: reqwest::Client,
    base_url: String,
    symbol: String,
    timeout_secs: u64,
}

impl YahooRateProvider {
    pub fn new(symbol: impl Into<String>, timeout: Duration) -> FeedResult<Self> {
        Self::with_base_url(YAHOO_CHART_BASE, symbol, timeout)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        symbol: impl Into<String>,
        timeout: Duration,
    ) -> FeedResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("costline/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FeedError::Http(e.to_string()))?;

        Ok(YahooRateProvider {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            symbol: symbol.into(),
            timeout_secs: timeout.as_secs(),
        })
    }

    pub fn chart_url(&self) -> String {
        format!(
            "{}/v8/finance/chart/{}?range=1d&interval=1d",
            self.base_url, self.symbol
        )
    }
}

#[async_trait]
impl RateProvider for YahooRateProvider {
    async fn fetch_rate(&self) -> FeedResult<f64> {
        let url = self.chart_url();
        debug!(url = %url, "Fetching FX quote");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FeedError::from_reqwest(e, self.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FeedError::from_reqwest(e, self.timeout_secs))?;
        parse_chart_price(&body)
    }

    fn name(&self) -> &str {
        "yahoo"
    }
}

// =============================================================================
// Best-Effort Rates
// =============================================================================

/// Wraps a provider with a refresh-interval cache and a fixed fallback.
pub struct BestEffortRates<P> {
    primary: P,
    cache: TtlCache<f64>,
    fallback: f64,
}

impl<P: RateProvider> BestEffortRates<P> {
    pub fn new(primary: P, refresh: Duration, fallback: f64) -> Self {
        BestEffortRates {
            primary,
            cache: TtlCache::new(refresh),
            fallback,
        }
    }

    pub fn primary(&self) -> &P {
        &self.primary
    }

    pub fn fallback_rate(&self) -> f64 {
        self.fallback
    }

    /// Returns a usable rate, whatever happens upstream.
    ///
    /// After a failed fetch the provider is left alone for one refresh
    /// interval, or until [`invalidate`](Self::invalidate).
    pub async fn quote(&self) -> FxQuote {
        if let Some(hit) = self.cache.get_fresh() {
            return FxQuote {
                rate: hit.value,
                source: FxSource::Cached,
                as_of: hit.stored_at,
            };
        }

        if !self.cache.retry_due() {
            return self.degraded();
        }

        match self.primary.fetch_rate().await.and_then(check_rate) {
            Ok(rate) => {
                info!(provider = self.primary.name(), rate, "FX quote refreshed");
                self.cache.put(rate);
                FxQuote {
                    rate,
                    source: FxSource::Live,
                    as_of: Utc::now(),
                }
            }
            Err(e) => {
                warn!(
                    provider = self.primary.name(),
                    error = %e,
                    "FX provider failed, falling back"
                );
                self.cache.record_failure();
                self.degraded()
            }
        }
    }

    /// Last known good rate, else the fixed fallback.
    fn degraded(&self) -> FxQuote {
        match self.cache.get_any() {
            Some(stale) => FxQuote {
                rate: stale.value,
                source: FxSource::LastKnownGood,
                as_of: stale.stored_at,
            },
            None => FxQuote {
                rate: self.fallback,
                source: FxSource::Fallback,
                as_of: Utc::now(),
            },
        }
    }

    /// Forces the next quote to go to the provider.
    pub fn invalidate(&self) {
        debug!(provider = self.primary.name(), "FX cache invalidated");
        self.cache.invalidate();
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct ScriptedRates {
        script: Mutex<Vec<FeedResult<f64>>>,
        calls: AtomicUsize,
    }

    impl ScriptedRates {
        fn new(script: Vec<FeedResult<f64>>) -> Self {
            ScriptedRates {
                script: Mutex::new(script.into_iter().rev().collect()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl RateProvider for ScriptedRates {
        async fn fetch_rate(&self) -> FeedResult<f64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(Err(FeedError::Timeout(10)))
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    #[test]
    fn test_parse_chart_price() {
        let body = br#"{"chart":{"result":[{"meta":{"currency":"TRY","symbol":"TRY=X","regularMarketPrice":34.12}}],"error":null}}"#;
        assert_eq!(parse_chart_price(body).unwrap(), 34.12);
    }

    #[test]
    fn test_parse_chart_price_failures() {
        let no_result = br#"{"chart":{"result":null,"error":{"code":"Not Found"}}}"#;
        assert!(matches!(parse_chart_price(no_result), Err(FeedError::Empty(_))));

        let zero = br#"{"chart":{"result":[{"meta":{"regularMarketPrice":0.0}}]}}"#;
        assert!(matches!(parse_chart_price(zero), Err(FeedError::InvalidRate(_))));

        assert!(matches!(parse_chart_price(b"<html>"), Err(FeedError::Decode(_))));
    }

    #[test]
    fn test_chart_url() {
        let provider = YahooRateProvider::with_base_url(
            "https://quotes.example/",
            "TRY=X",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            provider.chart_url(),
            "https://quotes.example/v8/finance/chart/TRY=X?range=1d&interval=1d"
        );
    }

    #[tokio::test]
    async fn test_live_then_cached() {
        let rates = BestEffortRates::new(
            ScriptedRates::new(vec![Ok(33.9)]),
            Duration::from_secs(600),
            34.5,
        );

        let first = rates.quote().await;
        assert_eq!((first.rate, first.source), (33.9, FxSource::Live));

        let second = rates.quote().await;
        assert_eq!((second.rate, second.source), (33.9, FxSource::Cached));
        assert_eq!(rates.primary().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_without_history_uses_fallback() {
        let rates = BestEffortRates::new(
            ScriptedRates::new(vec![Err(FeedError::Http("dns".to_string()))]),
            Duration::from_secs(600),
            34.5,
        );

        let quote = rates.quote().await;
        assert_eq!(quote.rate, 34.5);
        assert_eq!(quote.source, FxSource::Fallback);
    }

    #[tokio::test]
    async fn test_failure_after_success_uses_last_known_good() {
        let rates = BestEffortRates::new(
            ScriptedRates::new(vec![Ok(33.9), Err(FeedError::Timeout(10))]),
            Duration::ZERO,
            34.5,
        );

        rates.quote().await;
        let quote = rates.quote().await;
        assert_eq!(quote.rate, 33.9);
        assert_eq!(quote.source, FxSource::LastKnownGood);
    }

    #[tokio::test]
    async fn test_outage_asks_provider_once_per_interval() {
        let rates = BestEffortRates::new(
            ScriptedRates::new(Vec::new()),
            Duration::from_secs(600),
            34.5,
        );

        for _ in 0..5 {
            let quote = rates.quote().await;
            assert_eq!((quote.rate, quote.source), (34.5, FxSource::Fallback));
        }
        assert_eq!(rates.primary().calls.load(Ordering::SeqCst), 1);

        rates.invalidate();
        rates.quote().await;
        assert_eq!(rates.primary().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalid_rate_is_a_failure() {
        let rates = BestEffortRates::new(
            ScriptedRates::new(vec![Ok(-1.0)]),
            Duration::from_secs(600),
            34.5,
        );
        assert_eq!(rates.quote().await.source, FxSource::Fallback);
    }

    #[tokio::test]
    async fn test_invalidate_refetches() {
        let rates = BestEffortRates::new(
            ScriptedRates::new(vec![Ok(33.9), Ok(35.1)]),
            Duration::from_secs(600),
            34.5,
        );

        rates.quote().await;
        rates.invalidate();
        let quote = rates.quote().await;
        assert_eq!((quote.rate, quote.source), (35.1, FxSource::Live));
    }

    #[tokio::test]
    async fn test_static_provider() {
        assert_eq!(StaticRateProvider::new(30.0).fetch_rate().await.unwrap(), 30.0);
        assert!(StaticRateProvider::new(0.0).fetch_rate().await.is_err());
    }
}
