//! # Rendering
//!
//! Turns command responses into terminal text, or pretty JSON with `--json`.
//!
//! ```text
//! 3 of 214 products | VAT 20% | FX 34.12 (live)
//!   #  Product                          Supplier            Disc    Cost $     Cost ₺  Score
//!   1  RO Membrane 75 GPD               HSC Membrane         55%    $21.60    ₺736.99     90
//! ```

use costline_core::money::format_amount;
use serde::Serialize;

use crate::commands::cart::CartResponse;
use crate::commands::config::SettingsResponse;
use crate::commands::product::SearchResponse;
use crate::config::DisplaySettings;
use crate::error::ApiError;

const NAME_WIDTH: usize = 32;
const SUPPLIER_WIDTH: usize = 18;

#[derive(Debug, Clone)]
pub struct Renderer {
    base_symbol: String,
    local_symbol: String,
    json: bool,
}

impl Renderer {
    pub fn new(display: &DisplaySettings, json: bool) -> Self {
        Renderer {
            base_symbol: display.base_symbol.clone(),
            local_symbol: display.local_symbol.clone(),
            json,
        }
    }

    pub fn is_json(&self) -> bool {
        self.json
    }

    pub fn search(&self, response: &SearchResponse) -> String {
        if self.json {
            return to_json(response);
        }

        let mut out = format!(
            "{} of {} products | VAT {}% | FX {:.4} ({})",
            response.products.len(),
            response.catalog_size,
            response.vat_pct,
            response.fx.rate,
            response.fx.source.label()
        );
        if response.rows_dropped > 0 {
            out.push_str(&format!(" | {} sheet rows dropped", response.rows_dropped));
        }

        if response.products.is_empty() {
            out.push_str("\nNo products match.");
            return out;
        }

        out.push_str(&format!(
            "\n{:>3}  {:<nw$}  {:<sw$}  {:>5}  {:>10}  {:>12}  {:>5}",
            "#",
            "Product",
            "Supplier",
            "Disc",
            format!("Cost {}", self.base_symbol),
            format!("Cost {}", self.local_symbol),
            "Score",
            nw = NAME_WIDTH,
            sw = SUPPLIER_WIDTH,
        ));

        for p in &response.products {
            let disc = format!("{}%{}", p.discount_pct, if p.discount_overridden { "*" } else { "" });
            let score = p.score.map(|s| format!("{:.0}", s)).unwrap_or_default();
            out.push_str(&format!(
                "\n{:>3}  {:<nw$}  {:<sw$}  {:>5}  {:>10}  {:>12}  {:>5}",
                p.number,
                clip(&p.name, NAME_WIDTH),
                clip(&p.supplier, SUPPLIER_WIDTH),
                disc,
                format_amount(&self.base_symbol, p.unit_cost_base),
                format_amount(&self.local_symbol, p.unit_cost_local),
                score,
                nw = NAME_WIDTH,
                sw = SUPPLIER_WIDTH,
            ));
        }

        out
    }

    pub fn cart(&self, response: &CartResponse) -> String {
        if self.json {
            return to_json(response);
        }

        if response.lines.is_empty() {
            return "Cart is empty.".to_string();
        }

        let totals = &response.totals;
        let mut out = format!(
            "Cart: {} lines, {} units",
            totals.line_count, totals.total_quantity
        );

        out.push_str(&format!(
            "\n{:>3}  {:<nw$}  {:>4}  {:>10}  {:>10}  {:>12}",
            "#",
            "Product",
            "Qty",
            format!("Unit {}", self.base_symbol),
            format!("Line {}", self.base_symbol),
            format!("Line {}", self.local_symbol),
            nw = NAME_WIDTH,
        ));

        for line in &response.lines {
            out.push_str(&format!(
                "\n{:>3}  {:<nw$}  {:>4}  {:>10}  {:>10}  {:>12}{}",
                line.number,
                clip(&line.product_name, NAME_WIDTH),
                line.quantity,
                format_amount(&self.base_symbol, line.unit_cost_base),
                format_amount(&self.base_symbol, line.line_cost_base),
                format_amount(&self.local_symbol, line.line_cost_local),
                if line.marked_for_removal { "  [remove]" } else { "" },
                nw = NAME_WIDTH,
            ));
        }

        out.push_str(&format!(
            "\nTotal: {}  {}",
            format_amount(&self.base_symbol, totals.total_cost_base),
            format_amount(&self.local_symbol, totals.total_cost_local)
        ));
        out
    }

    pub fn settings(&self, response: &SettingsResponse) -> String {
        if self.json {
            return to_json(response);
        }

        let mut out = format!(
            "VAT {}% | FX {:.4} ({})",
            response.vat_pct,
            response.fx.rate,
            response.fx.source.label()
        );
        for d in &response.discounts {
            out.push_str(&format!("\n  discount {}% on {}", d.discount_pct, d.product_name));
        }
        out
    }

    pub fn error(&self, error: &ApiError) -> String {
        if self.json {
            return to_json(error);
        }
        format!("error: {}", error.message)
    }
}

const ENCODE_FAILED: &str = r#"{"code":"INTERNAL","message":"Failed to encode response"}"#;

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| {
        let err = ApiError::internal(format!("Failed to encode response: {}", e));
        serde_json::to_string_pretty(&err).unwrap_or_else(|_| ENCODE_FAILED.to_string())
    })
}

/// Shortens `text` to `width` characters, ending in '…' when cut.
fn clip(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut clipped: String = text.chars().take(width.saturating_sub(1)).collect();
    clipped.push('…');
    clipped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::cart::CartLineDto;
    use costline_core::{CartStatus, CartTotals, LineId};

    fn renderer(json: bool) -> Renderer {
        Renderer::new(&DisplaySettings::default(), json)
    }

    fn cart_with_one_line() -> CartResponse {
        CartResponse {
            status: CartStatus::NonEmpty,
            lines: vec![CartLineDto {
                number: 1,
                id: LineId::new(),
                product_name: "RO Membrane 75 GPD".to_string(),
                supplier: "HSC Membrane".to_string(),
                quantity: 3,
                discount_pct: 55.0,
                unit_cost_base: 21.6,
                unit_cost_local: 745.2,
                line_cost_base: 64.8,
                line_cost_local: 2235.6,
                marked_for_removal: true,
            }],
            totals: CartTotals {
                line_count: 1,
                total_quantity: 3,
                total_cost_base: 64.8,
                total_cost_local: 2235.6,
            },
        }
    }

    #[test]
    fn test_clip() {
        assert_eq!(clip("Faucet", 10), "Faucet");
        assert_eq!(clip("Sediment Cartridge", 9), "Sediment…");
        assert_eq!(clip("Su Arıtma Membranı", 6).chars().count(), 6);
    }

    #[test]
    fn test_cart_text() {
        let text = renderer(false).cart(&cart_with_one_line());
        assert!(text.starts_with("Cart: 1 lines, 3 units"));
        assert!(text.contains("RO Membrane 75 GPD"));
        assert!(text.contains("$64.80"));
        assert!(text.contains("₺2235.60"));
        assert!(text.contains("[remove]"));
        assert!(text.ends_with("Total: $64.80  ₺2235.60"));
    }

    #[test]
    fn test_empty_cart_text() {
        let empty = CartResponse {
            status: CartStatus::Empty,
            lines: Vec::new(),
            totals: CartTotals::default(),
        };
        assert_eq!(renderer(false).cart(&empty), "Cart is empty.");
    }

    #[test]
    fn test_json_output() {
        let json = renderer(true).cart(&cart_with_one_line());
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["status"], "nonEmpty");
        assert_eq!(value["lines"][0]["productName"], "RO Membrane 75 GPD");
        assert_eq!(value["totals"]["totalQuantity"], 3);
    }

    #[test]
    fn test_error_text_and_json() {
        let err = ApiError::validation("VAT must be at least 0");
        assert_eq!(renderer(false).error(&err), "error: VAT must be at least 0");

        let value: serde_json::Value = serde_json::from_str(&renderer(true).error(&err)).unwrap();
        assert_eq!(value["code"], "VALIDATION_ERROR");
    }

    struct Unencodable;

    impl Serialize for Unencodable {
        fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom(r#"price "$ --" has no value"#))
        }
    }

    #[test]
    fn test_encode_failure_is_valid_json() {
        let value: serde_json::Value = serde_json::from_str(&to_json(&Unencodable)).unwrap();
        assert_eq!(value["code"], "INTERNAL");
        assert!(value["message"]
            .as_str()
            .unwrap()
            .contains(r#"price "$ --" has no value"#));
    }
}
