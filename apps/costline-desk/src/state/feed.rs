//! # Feed State
//!
//! The shared catalog source and FX provider, cached and fallback-wrapped.
//!
//! Shared by every session: the cached sheet and the last quote are the
//! only process-wide data. Both are read-only from a session's point of
//! view apart from [`FeedState::refresh`].

use costline_core::{RawTable, RequiredColumns};
use costline_feed::{
    BestEffortRates, CachedCatalogSource, CatalogSource, FeedResult, FileCsvSource, FxQuote,
    HttpCsvSource, RateProvider, YahooRateProvider,
};
use std::time::Duration;
use tracing::info;

use crate::config::{CatalogLocation, ConfigError, ConfigResult, DeskConfig};

pub struct FeedState {
    catalog: CachedCatalogSource<Box<dyn CatalogSource>>,
    rates: BestEffortRates<Box<dyn RateProvider>>,
    columns: RequiredColumns,
}

impl FeedState {
    /// Wraps raw collaborators in their caches.
    pub fn new(
        catalog: Box<dyn CatalogSource>,
        catalog_refresh: Duration,
        rates: Box<dyn RateProvider>,
        fx_refresh: Duration,
        fallback_rate: f64,
        columns: RequiredColumns,
    ) -> Self {
        FeedState {
            catalog: CachedCatalogSource::new(catalog, catalog_refresh),
            rates: BestEffortRates::new(rates, fx_refresh, fallback_rate),
            columns,
        }
    }

    /// Builds the HTTP / file collaborators named by the configuration.
    pub fn from_config(config: &DeskConfig) -> ConfigResult<Self> {
        let source: Box<dyn CatalogSource> = match config.catalog.location()? {
            CatalogLocation::Url(url) => {
                info!(url = %url, "Catalog source: published sheet");
                Box::new(
                    HttpCsvSource::new(url, config.catalog.timeout()).map_err(|source| {
                        ConfigError::Collaborator {
                            what: "catalog client",
                            source,
                        }
                    })?,
                )
            }
            CatalogLocation::File(path) => {
                info!(path = %path.display(), "Catalog source: local file");
                Box::new(FileCsvSource::new(path))
            }
        };

        let provider = YahooRateProvider::new(config.fx.symbol.clone(), config.fx.timeout())
            .map_err(|source| ConfigError::Collaborator {
                what: "FX client",
                source,
            })?;

        Ok(Self::new(
            source,
            config.catalog.refresh(),
            Box::new(provider),
            config.fx.refresh(),
            config.fx.fallback_rate,
            config.required_columns(),
        ))
    }

    /// The raw sheet: cached, else fetched, else the stale copy.
    pub async fn fetch_catalog(&self) -> FeedResult<RawTable> {
        self.catalog.fetch().await
    }

    /// A usable FX quote. Never fails.
    pub async fn fx_quote(&self) -> FxQuote {
        self.rates.quote().await
    }

    pub fn columns(&self) -> &RequiredColumns {
        &self.columns
    }

    pub fn catalog_source_name(&self) -> &str {
        self.catalog.name()
    }

    pub fn fx_provider_name(&self) -> &str {
        self.rates.primary().name()
    }

    /// Marks both caches stale so the next cycle refetches.
    pub fn refresh(&self) {
        info!("Refreshing catalog and FX quote");
        self.catalog.invalidate();
        self.rates.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use costline_feed::{FxSource, StaticRateProvider};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn sheet() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"Product Name,Supplier,List Price\nFaucet,Acme,25\n")
            .unwrap();
        file
    }

    #[tokio::test]
    async fn test_from_config_with_file() {
        let file = sheet();
        let mut config = DeskConfig::default();
        config.catalog.set_path(file.path());

        let feed = FeedState::from_config(&config).unwrap();
        assert_eq!(feed.catalog_source_name(), "file-csv");
        assert_eq!(feed.fx_provider_name(), "yahoo");
        assert_eq!(feed.fetch_catalog().await.unwrap().row_count(), 1);
    }

    #[test]
    fn test_from_config_without_source() {
        assert!(matches!(
            FeedState::from_config(&DeskConfig::default()),
            Err(ConfigError::NoCatalogSource)
        ));
    }

    #[tokio::test]
    async fn test_quote_uses_provider() {
        let file = sheet();
        let feed = FeedState::new(
            Box::new(FileCsvSource::new(file.path())),
            Duration::from_secs(600),
            Box::new(StaticRateProvider::new(31.25)),
            Duration::from_secs(600),
            34.5,
            RequiredColumns::default(),
        );

        let quote = feed.fx_quote().await;
        assert_eq!((quote.rate, quote.source), (31.25, FxSource::Live));

        feed.refresh();
        assert_eq!(feed.fx_quote().await.source, FxSource::Live);
    }
}
