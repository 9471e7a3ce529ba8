//! # Desk Configuration
//!
//! Process-wide settings loaded once at startup.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Command-line flags (highest priority)                              │
//! │     --catalog-url, --catalog-file, --vat                               │
//! │                                                                         │
//! │  2. Environment Variables                                              │
//! │     COSTLINE_CATALOG_URL=https://...                                   │
//! │     COSTLINE_VAT_RATE=18                                               │
//! │                                                                         │
//! │  3. TOML Config File                                                   │
//! │     ~/.config/costline/costline.toml (Linux)                           │
//! │     ~/Library/Application Support/com.costline.desk/costline.toml     │
//! │                                                                         │
//! │  4. Default Values (lowest priority)                                   │
//! │     VAT 20%, fallback FX 34.50, limit 20, threshold 60                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # costline.toml
//! [catalog]
//! url = "https://docs.google.com/spreadsheets/d/e/.../pub?output=csv"
//! refresh_secs = 600
//! timeout_secs = 10
//!
//! [catalog.columns]
//! product_name = "Product Name"
//! supplier = "Supplier"
//! list_price = "List Price"
//!
//! [fx]
//! symbol = "TRY=X"
//! fallback_rate = 34.5
//!
//! [pricing]
//! vat_pct = 20.0
//!
//! [search]
//! limit = 20
//! score_threshold = 60.0
//! browse_limit = 50
//!
//! [display]
//! base_symbol = "$"
//! local_symbol = "₺"
//! ```
//!
//! Pricing values here are only the starting point of every new session;
//! each session edits its own copy (see [`crate::state::SessionSettings`]).

use std::path::{Path, PathBuf};
use std::time::Duration;

use costline_core::validation::{validate_fx_rate, validate_vat_pct};
use costline_core::{RequiredColumns, SearchOptions, ValidationError};
use costline_feed::FeedError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

// =============================================================================
// Errors
// =============================================================================

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("No catalog source configured (set catalog.url or catalog.path, or pass --catalog-url / --catalog-file)")]
    NoCatalogSource,

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Invalid configuration: {0}")]
    Value(#[from] ValidationError),

    /// A collaborator could not be constructed from otherwise valid settings.
    #[error("Failed to set up {what}: {source}")]
    Collaborator {
        what: &'static str,
        #[source]
        source: FeedError,
    },
}

// =============================================================================
// Catalog Settings
// =============================================================================

/// Where the catalog comes from, after layering has been resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogLocation {
    Url(String),
    File(PathBuf),
}

/// Header names of the required columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnNames {
    #[serde(default = "default_product_column")]
    pub product_name: String,
    #[serde(default = "default_supplier_column")]
    pub supplier: String,
    #[serde(default = "default_price_column")]
    pub list_price: String,
}

fn default_product_column() -> String {
    RequiredColumns::default().product_name
}

fn default_supplier_column() -> String {
    RequiredColumns::default().supplier
}

fn default_price_column() -> String {
    RequiredColumns::default().list_price
}

impl Default for ColumnNames {
    fn default() -> Self {
        ColumnNames {
            product_name: default_product_column(),
            supplier: default_supplier_column(),
            list_price: default_price_column(),
        }
    }
}

impl From<&ColumnNames> for RequiredColumns {
    fn from(names: &ColumnNames) -> Self {
        RequiredColumns::new(&names.product_name, &names.supplier, &names.list_price)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSettings {
    /// Published sheet (CSV export URL).
    #[serde(default)]
    pub url: Option<String>,

    /// Local CSV file. Mutually exclusive with `url`.
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default)]
    pub columns: ColumnNames,

    /// How long a fetched sheet is served from cache (seconds).
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,

    /// Upper bound on one sheet download (seconds).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_refresh_secs() -> u64 {
    600
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for CatalogSettings {
    fn default() -> Self {
        CatalogSettings {
            url: None,
            path: None,
            columns: ColumnNames::default(),
            refresh_secs: default_refresh_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl CatalogSettings {
    /// Points the catalog at a URL, replacing any file path.
    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = Some(url.into());
        self.path = None;
    }

    /// Points the catalog at a file, replacing any URL.
    pub fn set_path(&mut self, path: impl Into<PathBuf>) {
        self.path = Some(path.into());
        self.url = None;
    }

    pub fn location(&self) -> ConfigResult<CatalogLocation> {
        match (&self.url, &self.path) {
            (Some(_), Some(_)) => Err(ConfigError::Invalid(
                "catalog.url and catalog.path are mutually exclusive".into(),
            )),
            (Some(url), None) => Ok(CatalogLocation::Url(url.clone())),
            (None, Some(path)) => Ok(CatalogLocation::File(path.clone())),
            (None, None) => Err(ConfigError::NoCatalogSource),
        }
    }

    pub fn refresh(&self) -> Duration {
        Duration::from_secs(self.refresh_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// =============================================================================
// FX Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FxSettings {
    /// Market-data symbol of the pair (local per base).
    #[serde(default = "default_fx_symbol")]
    pub symbol: String,

    /// Rate used when no quote has ever been obtained.
    #[serde(default = "default_fallback_rate")]
    pub fallback_rate: f64,

    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_fx_symbol() -> String {
    "TRY=X".to_string()
}

fn default_fallback_rate() -> f64 {
    costline_core::FALLBACK_FX_RATE
}

impl Default for FxSettings {
    fn default() -> Self {
        FxSettings {
            symbol: default_fx_symbol(),
            fallback_rate: default_fallback_rate(),
            refresh_secs: default_refresh_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl FxSettings {
    pub fn refresh(&self) -> Duration {
        Duration::from_secs(self.refresh_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// =============================================================================
// Pricing, Search & Display Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingSettings {
    /// Starting VAT for new sessions (percent).
    #[serde(default = "default_vat_pct")]
    pub vat_pct: f64,
}

fn default_vat_pct() -> f64 {
    costline_core::DEFAULT_VAT_PCT
}

impl Default for PricingSettings {
    fn default() -> Self {
        PricingSettings {
            vat_pct: default_vat_pct(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSettings {
    #[serde(default = "default_search_limit")]
    pub limit: usize,
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f64,
    #[serde(default = "default_browse_limit")]
    pub browse_limit: usize,
}

fn default_search_limit() -> usize {
    costline_core::DEFAULT_SEARCH_LIMIT
}

fn default_score_threshold() -> f64 {
    costline_core::DEFAULT_SCORE_THRESHOLD
}

fn default_browse_limit() -> usize {
    costline_core::DEFAULT_BROWSE_LIMIT
}

impl Default for SearchSettings {
    fn default() -> Self {
        SearchSettings {
            limit: default_search_limit(),
            score_threshold: default_score_threshold(),
            browse_limit: default_browse_limit(),
        }
    }
}

impl From<&SearchSettings> for SearchOptions {
    fn from(settings: &SearchSettings) -> Self {
        SearchOptions {
            limit: settings.limit,
            score_threshold: settings.score_threshold,
            browse_limit: settings.browse_limit,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplaySettings {
    #[serde(default = "default_base_symbol")]
    pub base_symbol: String,
    #[serde(default = "default_local_symbol")]
    pub local_symbol: String,
}

fn default_base_symbol() -> String {
    "$".to_string()
}

fn default_local_symbol() -> String {
    "₺".to_string()
}

impl Default for DisplaySettings {
    fn default() -> Self {
        DisplaySettings {
            base_symbol: default_base_symbol(),
            local_symbol: default_local_symbol(),
        }
    }
}

// =============================================================================
// Command-Line Overrides
// =============================================================================

/// Values given on the command line; applied after the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub catalog_url: Option<String>,
    pub catalog_path: Option<PathBuf>,
    pub vat_pct: Option<f64>,
}

// =============================================================================
// Main Desk Configuration
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeskConfig {
    #[serde(default)]
    pub catalog: CatalogSettings,

    #[serde(default)]
    pub fx: FxSettings,

    #[serde(default)]
    pub pricing: PricingSettings,

    #[serde(default)]
    pub search: SearchSettings,

    #[serde(default)]
    pub display: DisplaySettings,
}

impl DeskConfig {
    /// Loads configuration from every source.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`config_path`, else the platform default if present)
    /// 3. Environment variables
    /// 4. Command-line overrides
    ///
    /// An explicit `config_path` that does not exist is an error; a missing
    /// default file is not.
    pub fn load(config_path: Option<PathBuf>, overrides: &ConfigOverrides) -> ConfigResult<Self> {
        let mut config = match config_path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path));
                }
                Self::from_file(&path)?
            }
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                Some(path) => {
                    debug!(?path, "Config file not found, using defaults");
                    Self::default()
                }
                None => Self::default(),
            },
        };

        config.apply_env_overrides();
        config.apply_overrides(overrides);
        config.validate()?;

        Ok(config)
    }

    fn from_file(path: &Path) -> ConfigResult<Self> {
        info!(?path, "Loading desk config from file");
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        self.catalog.location()?;

        if self.catalog.timeout_secs == 0 || self.fx.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if self.fx.symbol.trim().is_empty() {
            return Err(ConfigError::Invalid("fx.symbol must not be empty".into()));
        }

        validate_fx_rate(self.fx.fallback_rate)?;
        validate_vat_pct(self.pricing.vat_pct)?;

        if self.search.limit == 0 {
            return Err(ConfigError::Invalid(
                "search.limit must be greater than 0".into(),
            ));
        }

        if !(0.0..=100.0).contains(&self.search.score_threshold) {
            return Err(ConfigError::Invalid(format!(
                "search.score_threshold must be within 0..=100, got {}",
                self.search.score_threshold
            )));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Applies `COSTLINE_*` overrides read through `lookup`.
    ///
    /// Unparseable numbers are ignored with a warning.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("COSTLINE_CATALOG_URL") {
            debug!(url = %url, "Overriding catalog URL from environment");
            self.catalog.set_url(url);
        }

        if let Some(path) = lookup("COSTLINE_CATALOG_PATH") {
            debug!(path = %path, "Overriding catalog path from environment");
            self.catalog.set_path(path);
        }

        if let Some(symbol) = lookup("COSTLINE_FX_SYMBOL") {
            self.fx.symbol = symbol;
        }

        if let Some(raw) = lookup("COSTLINE_VAT_RATE") {
            match raw.trim().parse::<f64>() {
                Ok(vat) => self.pricing.vat_pct = vat,
                Err(_) => warn!(value = %raw, "Ignoring unparseable COSTLINE_VAT_RATE"),
            }
        }

        if let Some(raw) = lookup("COSTLINE_FX_FALLBACK") {
            match raw.trim().parse::<f64>() {
                Ok(rate) => self.fx.fallback_rate = rate,
                Err(_) => warn!(value = %raw, "Ignoring unparseable COSTLINE_FX_FALLBACK"),
            }
        }

        if let Some(raw) = lookup("COSTLINE_REFRESH_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) => {
                    debug!(secs, "Overriding refresh interval from environment");
                    self.catalog.refresh_secs = secs;
                    self.fx.refresh_secs = secs;
                }
                Err(_) => warn!(value = %raw, "Ignoring unparseable COSTLINE_REFRESH_SECS"),
            }
        }

        if let Some(raw) = lookup("COSTLINE_SEARCH_THRESHOLD") {
            match raw.trim().parse::<f64>() {
                Ok(threshold) => self.search.score_threshold = threshold,
                Err(_) => warn!(value = %raw, "Ignoring unparseable COSTLINE_SEARCH_THRESHOLD"),
            }
        }
    }

    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(url) = &overrides.catalog_url {
            self.catalog.set_url(url.clone());
        }
        if let Some(path) = &overrides.catalog_path {
            self.catalog.set_path(path.clone());
        }
        if let Some(vat) = overrides.vat_pct {
            self.pricing.vat_pct = vat;
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "costline", "desk")
            .map(|dirs| dirs.config_dir().join("costline.toml"))
    }

    pub fn required_columns(&self) -> RequiredColumns {
        RequiredColumns::from(&self.catalog.columns)
    }

    pub fn search_options(&self) -> SearchOptions {
        SearchOptions::from(&self.search)
    }
}
