//! # Session Settings
//!
//! The pricing inputs a user can change during a session.
//!
//! Edits take effect on the next evaluation cycle: each cycle copies the
//! settings into an immutable [`PricingParams`] before anything is priced.

use costline_core::validation::{validate_fx_rate, validate_vat_pct};
use costline_core::{DiscountOverrides, PricingParams, ValidationError};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSettings {
    pub vat_pct: f64,

    /// Manual FX rate; `None` means "use the live quote".
    pub fx_override: Option<f64>,

    pub discounts: DiscountOverrides,
}

impl SessionSettings {
    pub fn new(vat_pct: f64) -> Self {
        SessionSettings {
            vat_pct,
            fx_override: None,
            discounts: DiscountOverrides::new(),
        }
    }

    pub fn set_vat(&mut self, vat_pct: f64) -> Result<(), ValidationError> {
        validate_vat_pct(vat_pct)?;
        debug!(vat_pct, "VAT changed");
        self.vat_pct = vat_pct;
        Ok(())
    }

    /// Pins the FX rate, or returns to the live quote with `None`.
    pub fn set_fx_override(&mut self, rate: Option<f64>) -> Result<(), ValidationError> {
        if let Some(rate) = rate {
            validate_fx_rate(rate)?;
        }
        debug!(?rate, "FX override changed");
        self.fx_override = rate;
        Ok(())
    }

    /// Overrides one product's discount, or restores its default with `None`.
    pub fn set_discount(&mut self, product_name: &str, pct: Option<f64>) -> Result<(), ValidationError> {
        match pct {
            Some(pct) => self.discounts.set(product_name, pct)?,
            None => {
                self.discounts.clear(product_name);
            }
        }
        debug!(product = %product_name, ?pct, "Discount override changed");
        Ok(())
    }

    /// Freezes the settings for one cycle.
    pub fn snapshot(&self, fx_rate: f64) -> PricingParams {
        PricingParams::new(self.vat_pct, fx_rate).with_discounts(self.discounts.clone())
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::new(costline_core::DEFAULT_VAT_PCT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_edits_keep_previous_values() {
        let mut settings = SessionSettings::default();

        assert!(settings.set_vat(-5.0).is_err());
        assert_eq!(settings.vat_pct, 20.0);

        assert!(settings.set_fx_override(Some(0.0)).is_err());
        assert_eq!(settings.fx_override, None);

        assert!(settings.set_discount("Faucet", Some(120.0)).is_err());
        assert!(settings.discounts.is_empty());
    }

    #[test]
    fn test_snapshot_carries_everything() {
        let mut settings = SessionSettings::new(18.0);
        settings.set_discount("RO Membrane", Some(40.0)).unwrap();

        let params = settings.snapshot(33.0);
        assert_eq!(params.vat_pct, 18.0);
        assert_eq!(params.fx_rate, 33.0);
        assert_eq!(params.discounts.get("RO Membrane"), Some(40.0));
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut settings = SessionSettings::default();
        let params = settings.snapshot(34.5);

        settings.set_vat(0.0).unwrap();
        settings.set_discount("Faucet", Some(10.0)).unwrap();

        assert_eq!(params.vat_pct, 20.0);
        assert!(params.discounts.is_empty());
    }

    #[test]
    fn test_clear_discount_and_fx() {
        let mut settings = SessionSettings::default();
        settings.set_discount("Faucet", Some(10.0)).unwrap();
        settings.set_discount("Faucet", None).unwrap();
        assert!(settings.discounts.get("Faucet").is_none());

        settings.set_fx_override(Some(31.0)).unwrap();
        settings.set_fx_override(None).unwrap();
        assert_eq!(settings.fx_override, None);
    }
}
