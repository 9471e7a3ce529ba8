//! # Pricing Engine
//!
//! Annotates catalog products with discount, VAT and FX derived costs.
//!
//! ## Formulas
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  net_price       = list_price × (1 − discount_pct / 100)               │
//! │  unit_cost_base  = net_price  × (1 + vat_applicable_pct / 100)         │
//! │  unit_cost_local = unit_cost_base × fx_rate                             │
//! │                                                                         │
//! │  discount_pct       = override for this product, else default          │
//! │  vat_applicable_pct = 0 for VAT-exempt rows, else params.vat_pct       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`price`] is pure and total: it holds no state and the same catalog with
//! the same [`PricingParams`] always yields the same [`PricedCatalog`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::{Catalog, PricedCatalog, PricedProduct, Product};
use crate::validation::{validate_discount_pct, validate_fx_rate, validate_vat_pct};

// =============================================================================
// Discount Overrides
// =============================================================================

/// Per-product discount overrides, keyed by exact product name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiscountOverrides(BTreeMap<String, f64>);

impl DiscountOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the discount for one product.
    ///
    /// ## Errors
    /// [`ValidationError`] if `pct` is not a finite value in `[0, 100]`.
    pub fn set(&mut self, product_name: impl Into<String>, pct: f64) -> Result<(), ValidationError> {
        validate_discount_pct(pct)?;
        self.0.insert(product_name.into(), pct);
        Ok(())
    }

    /// Drops an override; returns the previous value if there was one.
    pub fn clear(&mut self, product_name: &str) -> Option<f64> {
        self.0.remove(product_name)
    }

    pub fn get(&self, product_name: &str) -> Option<f64> {
        self.0.get(product_name).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(name, pct)| (name.as_str(), *pct))
    }
}

// =============================================================================
// Pricing Params
// =============================================================================

/// The parameter snapshot one evaluation cycle prices with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingParams {
    pub vat_pct: f64,
    pub fx_rate: f64,
    #[serde(default)]
    pub discounts: DiscountOverrides,
}

impl PricingParams {
    pub fn new(vat_pct: f64, fx_rate: f64) -> Self {
        PricingParams {
            vat_pct,
            fx_rate,
            discounts: DiscountOverrides::default(),
        }
    }

    pub fn with_discounts(mut self, discounts: DiscountOverrides) -> Self {
        self.discounts = discounts;
        self
    }

    /// Checks VAT and FX ranges. Overrides are checked when they are set.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_vat_pct(self.vat_pct)?;
        validate_fx_rate(self.fx_rate)?;
        Ok(())
    }
}

// =============================================================================
// Pricing
// =============================================================================

/// Prices a single product.
pub fn price_product(product: &Product, params: &PricingParams) -> PricedProduct {
    let discount_pct = params
        .discounts
        .get(&product.name)
        .unwrap_or(product.default_discount_pct);
    let vat_applicable_pct = if product.vat_exempt {
        0.0
    } else {
        params.vat_pct
    };

    let net_price = product.list_price * (1.0 - discount_pct / 100.0);
    let unit_cost_base = net_price * (1.0 + vat_applicable_pct / 100.0);
    let unit_cost_local = unit_cost_base * params.fx_rate;

    PricedProduct {
        product: product.clone(),
        discount_pct,
        vat_applicable_pct,
        net_price,
        unit_cost_base,
        unit_cost_local,
    }
}

/// Prices every product of a catalog, keeping catalog order.
pub fn price(catalog: &Catalog, params: &PricingParams) -> PricedCatalog {
    PricedCatalog::from_items(
        catalog
            .iter()
            .map(|product| price_product(product, params))
            .collect(),
    )
}

// =============================================================================
// Unit Tests
// =============================================================================
