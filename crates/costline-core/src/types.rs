//! # Domain Types
//!
//! Core domain types used throughout Costline.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌──────────────────┐   ┌─────────────────┐      │
//! │  │    Product      │   │  PricedProduct   │   │    CartLine     │      │
//! │  │  ─────────────  │   │  ──────────────  │   │  ─────────────  │      │
//! │  │  name (key)     │──►│  product         │──►│  id (LineId)    │      │
//! │  │  supplier       │   │  discount_pct    │   │  product_name   │      │
//! │  │  list_price     │   │  vat_applicable  │   │  quantity       │      │
//! │  │  default disc.  │   │  net_price       │   │  unit_cost_base │      │
//! │  │  vat_exempt     │   │  unit_cost_base  │   │  unit_cost_local│      │
//! │  └─────────────────┘   │  unit_cost_local │   │  marked         │      │
//! │                        └──────────────────┘   └─────────────────┘      │
//! │      ingest()               price()               add_many()            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! A [`CartLine`] copies the costs of the [`PricedProduct`] it was created
//! from. Later VAT / FX / discount changes leave it untouched until the cart
//! is explicitly re-priced.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Product
// =============================================================================

/// One normalized catalog row.
///
/// Immutable once ingested. The only per-product value a user can change is
/// the discount, and that change lives in
/// [`crate::pricing::DiscountOverrides`], not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Display name; its exact text is the product's unique key.
    pub name: String,

    /// Supplier as written in the sheet (may be empty).
    pub supplier: String,

    /// List price in the catalog's base currency, never negative.
    pub list_price: f64,

    /// Discount assigned from the supplier name at ingestion.
    pub default_discount_pct: f64,

    /// True when the supplier is empty or a missing-value marker: such rows
    /// never carry VAT, whatever the configured rate.
    pub vat_exempt: bool,
}

// =============================================================================
// Priced Product
// =============================================================================

/// A product annotated with the costs derived from one parameter snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedProduct {
    pub product: Product,

    /// Effective discount (the override if one is set, else the default).
    pub discount_pct: f64,

    /// VAT actually applied to this row (0 for exempt rows).
    pub vat_applicable_pct: f64,

    /// List price after discount, before tax.
    pub net_price: f64,

    /// Net price after tax, in the base currency.
    pub unit_cost_base: f64,

    /// Unit cost converted with the snapshot's FX rate.
    pub unit_cost_local: f64,
}

impl PricedProduct {
    #[inline]
    pub fn name(&self) -> &str {
        &self.product.name
    }

    #[inline]
    pub fn supplier(&self) -> &str {
        &self.product.supplier
    }
}

// =============================================================================
// Catalogs
// =============================================================================

/// Ingested products in sheet order, names unique.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// Wraps products that are already unique by name.
    pub(crate) fn from_products(products: Vec<Product>) -> Self {
        Catalog { products }
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Product> {
        self.products.iter()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.name == name)
    }
}

/// The output of one pricing pass, same order as its [`Catalog`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PricedCatalog {
    items: Vec<PricedProduct>,
}

impl PricedCatalog {
    pub(crate) fn from_items(items: Vec<PricedProduct>) -> Self {
        PricedCatalog { items }
    }

    pub fn items(&self) -> &[PricedProduct] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PricedProduct> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&PricedProduct> {
        self.items.iter().find(|p| p.name() == name)
    }
}

impl<'a> IntoIterator for &'a PricedCatalog {
    type Item = &'a PricedProduct;
    type IntoIter = std::slice::Iter<'a, PricedProduct>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

// =============================================================================
// Named
// =============================================================================

/// Anything the fuzzy matcher can rank by name.
pub trait Named {
    fn name(&self) -> &str;
}

impl Named for Product {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for PricedProduct {
    fn name(&self) -> &str {
        &self.product.name
    }
}

// =============================================================================
// Line Id
// =============================================================================

/// Identity of one cart line.
///
/// Lines are not keyed by product name: the same product selected twice
/// yields two independent lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineId(Uuid);

impl LineId {
    /// Creates a fresh random id (UUID v4).
    pub fn new() -> Self {
        LineId(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for LineId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for LineId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(LineId)
    }
}

// =============================================================================
// Cart Line
// =============================================================================

/// One quantity-bearing entry of a cart.
///
/// ## Design Notes
/// - Costs are frozen copies taken when the line was added (or re-priced).
/// - `marked_for_removal` is transient UI state and never affects totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub id: LineId,

    /// Product name at time of adding (frozen).
    pub product_name: String,

    /// Supplier at time of adding (frozen).
    pub supplier: String,

    /// Always ≥ 1 inside a [`crate::cart::CartStore`].
    pub quantity: i64,

    /// Discount in effect when the costs were captured.
    pub discount_pct: f64,

    /// Post-VAT unit cost, base currency (frozen).
    pub unit_cost_base: f64,

    /// Post-VAT unit cost, local currency (frozen).
    pub unit_cost_local: f64,

    #[serde(default)]
    pub marked_for_removal: bool,

    pub added_at: DateTime<Utc>,
}

impl CartLine {
    /// Snapshots a priced product as a new line with quantity 1.
    pub fn from_priced(priced: &PricedProduct) -> Self {
        CartLine {
            id: LineId::new(),
            product_name: priced.product.name.clone(),
            supplier: priced.product.supplier.clone(),
            quantity: 1,
            discount_pct: priced.discount_pct,
            unit_cost_base: priced.unit_cost_base,
            unit_cost_local: priced.unit_cost_local,
            marked_for_removal: false,
            added_at: Utc::now(),
        }
    }

    /// `unit_cost_base × quantity`.
    pub fn line_cost_base(&self) -> f64 {
        self.unit_cost_base * self.quantity as f64
    }

    /// `unit_cost_local × quantity`.
    pub fn line_cost_local(&self) -> f64 {
        self.unit_cost_local * self.quantity as f64
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
