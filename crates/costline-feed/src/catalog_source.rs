//! # Catalog Sources
//!
//! Where the raw catalog table comes from.
//!
//! ## Retrieval Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CachedCatalogSource::fetch()                                           │
//! │      │                                                                  │
//! │      ├── cache fresh? ──────────────────────────► RawTable (cached)    │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  inner.fetch()  (HttpCsvSource | FileCsvSource)                         │
//! │      │                                                                  │
//! │      ├── Ok ──► cache.put ──────────────────────► RawTable (new)       │
//! │      │                                                                  │
//! │      ├── Err + older copy ──► warn! ────────────► RawTable (stale)     │
//! │      │                                                                  │
//! │      └── Err + nothing cached ──────────────────► FeedError (fatal)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use costline_core::RawTable;
use csv::ReaderBuilder;
use tracing::{debug, info, warn};

use crate::cache::TtlCache;
use crate::error::{FeedError, FeedResult};

// =============================================================================
// Trait
// =============================================================================

/// Anything that can produce the raw catalog table.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch(&self) -> FeedResult<RawTable>;

    /// Short label for logs.
    fn name(&self) -> &str;

    /// Drops any cached copy so the next fetch goes to the origin.
    fn invalidate(&self) {}
}

#[async_trait]
impl<S: CatalogSource + ?Sized> CatalogSource for Box<S> {
    async fn fetch(&self) -> FeedResult<RawTable> {
        (**self).fetch().await
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn invalidate(&self) {
        (**self).invalidate()
    }
}

// =============================================================================
// CSV Decoding
// =============================================================================

/// Decodes CSV bytes into a [`RawTable`].
///
/// - Row lengths may vary (short rows are judged later by ingestion)
/// - Completely blank rows are dropped
/// - Records the decoder rejects are dropped with a warning
///
/// ## Errors
/// [`FeedError::Empty`] if there is no header row.
pub fn parse_csv(bytes: &[u8]) -> FeedResult<RawTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(FeedError::Empty("catalog has no header row".to_string()));
    }

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!(record = idx + 1, error = %e, "Dropping undecodable catalog record");
                continue;
            }
        };

        let row: Vec<String> = record.iter().map(str::to_string).collect();
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        rows.push(row);
    }

    debug!(columns = headers.len(), rows = rows.len(), "CSV decoded");
    Ok(RawTable::new(headers, rows))
}

// =============================================================================
// HTTP Source
// =============================================================================

/// A spreadsheet published as CSV over HTTPS.
#[derive(Debug, Clone)]
pub struct HttpCsvSource {
    client: reqwest::Client,
    url: String,
    timeout_secs: u64,
}

impl HttpCsvSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> FeedResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FeedError::Http(e.to_string()))?;

        Ok(HttpCsvSource {
            client,
            url: url.into(),
            timeout_secs: timeout.as_secs(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl CatalogSource for HttpCsvSource {
    async fn fetch(&self) -> FeedResult<RawTable> {
        debug!(url = %self.url, "Fetching catalog sheet");

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| FeedError::from_reqwest(e, self.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FeedError::from_reqwest(e, self.timeout_secs))?;

        parse_csv(&body)
    }

    fn name(&self) -> &str {
        "http-csv"
    }
}

// =============================================================================
// File Source
// =============================================================================

/// A CSV file on local disk.
#[derive(Debug, Clone)]
pub struct FileCsvSource {
    path: PathBuf,
}

impl FileCsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileCsvSource { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[async_trait]
impl CatalogSource for FileCsvSource {
    async fn fetch(&self) -> FeedResult<RawTable> {
        debug!(path = %self.path.display(), "Reading catalog file");
        let bytes = tokio::fs::read(&self.path).await?;
        parse_csv(&bytes)
    }

    fn name(&self) -> &str {
        "file-csv"
    }
}

// =============================================================================
// Cached Source
// =============================================================================

/// Wraps a source with a TTL cache and stale-on-error fallback.
///
/// Once a refetch fails, the previous copy is served without asking the
/// origin again until the ttl passes or the cache is invalidated. With no
/// copy at all every fetch goes to the origin.
pub struct CachedCatalogSource<S> {
    inner: S,
    cache: TtlCache<RawTable>,
}

impl<S: CatalogSource> CachedCatalogSource<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        CachedCatalogSource {
            inner,
            cache: TtlCache::new(ttl),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: CatalogSource> CatalogSource for CachedCatalogSource<S> {
    async fn fetch(&self) -> FeedResult<RawTable> {
        if let Some(hit) = self.cache.get_fresh() {
            return Ok(hit.value);
        }
        if !self.cache.retry_due() {
            if let Some(stale) = self.cache.get_any() {
                debug!(source = self.inner.name(), "Origin failed recently, serving previous copy");
                return Ok(stale.value);
            }
        }

        match self.inner.fetch().await {
            Ok(table) => {
                info!(source = self.inner.name(), rows = table.row_count(), "Catalog refreshed");
                self.cache.put(table.clone());
                Ok(table)
            }
            Err(e) => {
                self.cache.record_failure();
                let Some(stale) = self.cache.get_any() else {
                    return Err(e);
                };
                warn!(
                    source = self.inner.name(),
                    error = %e,
                    cached_at = %stale.stored_at,
                    "Catalog refresh failed, serving previous copy"
                );
                Ok(stale.value)
            }
        }
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn invalidate(&self) {
        debug!(source = self.inner.name(), "Catalog cache invalidated");
        self.cache.invalidate();
        self.inner.invalidate();
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    const SHEET: &str = "Product Name,Supplier,List Price\n\
                         RO Membrane,HSC Membrane,\"$40,00\"\n\
                         ,,\n\
                         Faucet,Acme,25\n";

    /// Serves queued results in order; counts calls.
    struct ScriptedSource {
        script: Mutex<Vec<FeedResult<RawTable>>>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(script: Vec<FeedResult<RawTable>>) -> Self {
            ScriptedSource {
                script: Mutex::new(script.into_iter().rev().collect()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl CatalogSource for ScriptedSource {
        async fn fetch(&self) -> FeedResult<RawTable> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(FeedError::Empty("script exhausted".to_string())))
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn table(rows: usize) -> RawTable {
        RawTable::new(
            vec!["Product Name".to_string()],
            (0..rows).map(|i| vec![format!("P{i}")]).collect(),
        )
    }

    #[test]
    fn test_parse_csv_keeps_quoted_commas_and_drops_blank_rows() {
        let table = parse_csv(SHEET.as_bytes()).unwrap();
        assert_eq!(table.headers, vec!["Product Name", "Supplier", "List Price"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][2], "$40,00");
    }

    #[test]
    fn test_parse_csv_flexible_rows() {
        let table = parse_csv(b"Product Name,Supplier,List Price\nShort\nA,B,1,extra\n").unwrap();
        assert_eq!(table.rows[0], vec!["Short"]);
        assert_eq!(table.rows[1].len(), 4);
    }

    #[test]
    fn test_parse_csv_without_header() {
        assert!(matches!(parse_csv(b""), Err(FeedError::Empty(_))));
    }

    #[tokio::test]
    async fn test_file_source_reads_csv() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SHEET.as_bytes()).unwrap();

        let source = FileCsvSource::new(file.path());
        let table = source.fetch().await.unwrap();
        assert_eq!(table.rows.len(), 2);
    }

    #[tokio::test]
    async fn test_file_source_missing_file() {
        let source = FileCsvSource::new("/definitely/not/here/catalog.csv");
        assert!(matches!(source.fetch().await, Err(FeedError::Io(_))));
    }

    #[tokio::test]
    async fn test_cached_source_serves_fresh_copy() {
        let cached = CachedCatalogSource::new(
            ScriptedSource::new(vec![Ok(table(3)), Ok(table(5))]),
            Duration::from_secs(600),
        );

        assert_eq!(cached.fetch().await.unwrap().row_count(), 3);
        assert_eq!(cached.fetch().await.unwrap().row_count(), 3);
        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let cached = CachedCatalogSource::new(
            ScriptedSource::new(vec![Ok(table(3)), Ok(table(5))]),
            Duration::from_secs(600),
        );

        cached.fetch().await.unwrap();
        cached.invalidate();
        assert_eq!(cached.fetch().await.unwrap().row_count(), 5);
        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_refresh_serves_stale_copy() {
        let cached = CachedCatalogSource::new(
            ScriptedSource::new(vec![Ok(table(3)), Err(FeedError::Timeout(10))]),
            Duration::ZERO,
        );

        assert_eq!(cached.fetch().await.unwrap().row_count(), 3);
        assert_eq!(cached.fetch().await.unwrap().row_count(), 3);
        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_outage_asks_origin_once_per_interval() {
        let cached = CachedCatalogSource::new(
            ScriptedSource::new(vec![Ok(table(3)), Err(FeedError::Timeout(10))]),
            Duration::from_secs(600),
        );

        cached.fetch().await.unwrap();
        cached.invalidate();
        for _ in 0..5 {
            assert_eq!(cached.fetch().await.unwrap().row_count(), 3);
        }
        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 2);

        cached.invalidate();
        assert_eq!(cached.fetch().await.unwrap().row_count(), 3);
        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_failure_without_any_copy_is_fatal() {
        let cached = CachedCatalogSource::new(
            ScriptedSource::new(vec![Err(FeedError::Status {
                url: "https://sheet.example".to_string(),
                status: 500,
            })]),
            Duration::from_secs(600),
        );

        assert!(matches!(cached.fetch().await, Err(FeedError::Status { status: 500, .. })));
    }
}
