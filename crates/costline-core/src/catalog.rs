//! # Catalog Ingestion
//!
//! Turns an untyped table (header row + string cells) into a typed [`Catalog`].
//!
//! ## Ingestion Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  RawTable                                                               │
//! │  headers: ["Product Name", "Supplier", "List Price", "Notes"]          │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  resolve required columns ──── any missing? ──► SchemaError (fatal)    │
//! │      │                                                                  │
//! │      ▼  for each row                                                    │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │ too short / empty name ─────────────────► skipped (malformed)   │   │
//! │  │ name already seen ──────────────────────► skipped (duplicate)   │   │
//! │  │ price unreadable ───────────────────────► list_price = 0.0      │   │
//! │  │ supplier "hsc" → 55 │ "esli" → 52 │ else 0  (default discount) │   │
//! │  │ supplier empty / "nan" / "none" ... ────► vat_exempt = true     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  (Catalog, IngestReport)                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Untyped rows never leave this module.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ParseError, SchemaError};
use crate::money::parse_decimal;
use crate::types::{Catalog, Product};

/// Supplier-substring discount rules, checked in order; first match wins.
const SUPPLIER_DISCOUNTS: &[(&str, f64)] = &[("hsc", 55.0), ("esli", 52.0)];

/// Cell values that tabular exports write for a blank supplier.
const ABSENT_MARKERS: &[&str] = &["nan", "none", "null", "n/a", "-"];

// =============================================================================
// Raw Table
// =============================================================================

/// A decoded sheet before any typing: one header row plus string cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        RawTable { headers, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

// =============================================================================
// Required Columns
// =============================================================================

/// Header names of the three fields every catalog must carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredColumns {
    pub product_name: String,
    pub supplier: String,
    pub list_price: String,
}

impl Default for RequiredColumns {
    fn default() -> Self {
        RequiredColumns {
            product_name: "Product Name".to_string(),
            supplier: "Supplier".to_string(),
            list_price: "List Price".to_string(),
        }
    }
}

impl RequiredColumns {
    pub fn new(
        product_name: impl Into<String>,
        supplier: impl Into<String>,
        list_price: impl Into<String>,
    ) -> Self {
        RequiredColumns {
            product_name: product_name.into(),
            supplier: supplier.into(),
            list_price: list_price.into(),
        }
    }

    /// Finds the index of each required column in `headers`.
    ///
    /// ## Errors
    /// [`SchemaError`] listing every column that could not be found.
    fn resolve(&self, headers: &[String]) -> Result<ColumnIndex, SchemaError> {
        let find = |wanted: &str| {
            let wanted = normalize_header(wanted);
            headers.iter().position(|h| normalize_header(h) == wanted)
        };

        let name = find(&self.product_name);
        let supplier = find(&self.supplier);
        let price = find(&self.list_price);

        match (name, supplier, price) {
            (Some(name), Some(supplier), Some(price)) => Ok(ColumnIndex {
                name,
                supplier,
                price,
            }),
            _ => {
                let missing = [
                    (name, &self.product_name),
                    (supplier, &self.supplier),
                    (price, &self.list_price),
                ]
                .into_iter()
                .filter(|(idx, _)| idx.is_none())
                .map(|(_, column)| column.clone())
                .collect();
                Err(SchemaError { missing })
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    name: usize,
    supplier: usize,
    price: usize,
}

impl ColumnIndex {
    fn max(&self) -> usize {
        self.name.max(self.supplier).max(self.price)
    }
}

fn normalize_header(header: &str) -> String {
    header.trim_start_matches('\u{feff}').trim().to_lowercase()
}

// =============================================================================
// Ingest Report
// =============================================================================

/// What happened to each row during ingestion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub duplicates_skipped: usize,
    pub prices_defaulted: usize,
}

impl IngestReport {
    pub fn products_kept(&self) -> usize {
        self.rows_read - self.rows_skipped - self.duplicates_skipped
    }
}

// =============================================================================
// Supplier Rules
// =============================================================================

/// True when a supplier cell means "no supplier".
pub fn is_absent_supplier(supplier: &str) -> bool {
    let trimmed = supplier.trim();
    trimmed.is_empty()
        || ABSENT_MARKERS
            .iter()
            .any(|marker| trimmed.eq_ignore_ascii_case(marker))
}

/// Default discount for a supplier: `hsc` → 55, else `esli` → 52, else 0.
///
/// ## Example
/// ```rust
/// use costline_core::catalog::default_discount_for;
///
/// assert_eq!(default_discount_for("HSC Membrane"), 55.0);
/// assert_eq!(default_discount_for("Esli Filtration"), 52.0);
/// assert_eq!(default_discount_for("Acme"), 0.0);
/// ```
pub fn default_discount_for(supplier: &str) -> f64 {
    let lowered = supplier.to_lowercase();
    SUPPLIER_DISCOUNTS
        .iter()
        .find(|(needle, _)| lowered.contains(needle))
        .map(|(_, pct)| *pct)
        .unwrap_or(0.0)
}

// =============================================================================
// Ingest
// =============================================================================

/// Parses a raw table into a catalog.
///
/// ## Errors
/// [`SchemaError`] when any required column is absent from the header row.
/// Nothing else fails: bad rows are skipped and bad prices become `0.0`.
pub fn ingest(
    table: &RawTable,
    columns: &RequiredColumns,
) -> Result<(Catalog, IngestReport), SchemaError> {
    let index = columns.resolve(&table.headers)?;

    let mut report = IngestReport {
        rows_read: table.rows.len(),
        ..IngestReport::default()
    };
    let mut seen: HashSet<&str> = HashSet::with_capacity(table.rows.len());
    let mut products = Vec::with_capacity(table.rows.len());

    for (row_no, row) in table.rows.iter().enumerate() {
        if row.len() <= index.max() {
            debug!(row = row_no, cells = row.len(), "Skipping short row");
            report.rows_skipped += 1;
            continue;
        }

        let name = row[index.name].trim();
        if name.is_empty() {
            debug!(row = row_no, "Skipping row without product name");
            report.rows_skipped += 1;
            continue;
        }

        if !seen.insert(name) {
            debug!(row = row_no, name = %name, "Skipping duplicate product");
            report.duplicates_skipped += 1;
            continue;
        }

        let raw_price = &row[index.price];
        let list_price = match parse_decimal(raw_price) {
            Ok(value) => value,
            Err(e) => {
                if !matches!(e, ParseError::Empty) {
                    debug!(row = row_no, raw = %raw_price, error = %e, "Price defaulted to 0.0");
                }
                report.prices_defaulted += 1;
                0.0
            }
        };

        let supplier = row[index.supplier].trim();
        let vat_exempt = is_absent_supplier(supplier);

        products.push(Product {
            name: name.to_string(),
            supplier: supplier.to_string(),
            list_price,
            default_discount_pct: default_discount_for(supplier),
            vat_exempt,
        });
    }

    info!(
        rows = report.rows_read,
        products = products.len(),
        skipped = report.rows_skipped,
        duplicates = report.duplicates_skipped,
        prices_defaulted = report.prices_defaulted,
        "Catalog ingested"
    );

    Ok((Catalog::from_products(products), report))
}

// =============================================================================
// Unit Tests
// =============================================================================
