//! # Cart Store
//!
//! The session-scoped selection of priced products.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │                add_many(≥1)                                             │
//! │     ┌───────┐ ─────────────────► ┌──────────┐ ◄─┐ add_many              │
//! │     │ Empty │                    │ NonEmpty │   │ update_quantity      │
//! │     └───────┘ ◄───────────────── └──────────┘ ──┘ mark_for_removal     │
//! │       ▲   │     reset()                │          remove_marked (some  │
//! │       │   │     remove_marked (all)    │            lines left)        │
//! │       └───┘                            │                               │
//! │     reset()     ◄──────────────────────┘                               │
//! │                                                                         │
//! │  No terminal state. Every mutation is all-or-nothing.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Duplicate Lines
//! Adding a product that is already in the cart appends a SECOND line. Lines
//! are never merged by product; each keeps its own quantity and snapshot.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CoreError, CoreResult};
use crate::types::{CartLine, LineId, PricedCatalog, PricedProduct};
use crate::validation::validate_lines;
use crate::MAX_LINE_QUANTITY;

// =============================================================================
// Status & Totals
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CartStatus {
    Empty,
    NonEmpty,
}

/// Aggregate figures over every line, marked or not.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub line_count: usize,
    pub total_quantity: i64,
    pub total_cost_base: f64,
    pub total_cost_local: f64,
}

// =============================================================================
// Cart Store
// =============================================================================

/// Ordered cart lines for one session.
///
/// ## Invariants
/// - Every line has `quantity ≥ 1`
/// - Line ids are unique
/// - A failed operation leaves the store exactly as it was
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CartStore {
    lines: Vec<CartLine>,
}

impl CartStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> CartStatus {
        if self.lines.is_empty() {
            CartStatus::Empty
        } else {
            CartStatus::NonEmpty
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines in insertion order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, id: LineId) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.id == id)
    }

    /// Replaces the whole collection.
    ///
    /// ## Errors
    /// [`CoreError::Validation`] if any line has quantity < 1 or two lines
    /// share an id. The current lines are kept in that case.
    pub fn set_lines(&mut self, lines: Vec<CartLine>) -> CoreResult<()> {
        validate_lines(&lines)?;
        debug!(from = self.lines.len(), to = lines.len(), "Cart lines replaced");
        self.lines = lines;
        Ok(())
    }

    /// Appends one line per selected product, each with quantity 1.
    ///
    /// ## Returns
    /// The ids of the new lines, in selection order.
    pub fn add_many<'a, I>(&mut self, selected: I) -> Vec<LineId>
    where
        I: IntoIterator<Item = &'a PricedProduct>,
    {
        let before = self.status();
        let added: Vec<LineId> = selected
            .into_iter()
            .map(|priced| {
                let line = CartLine::from_priced(priced);
                let id = line.id;
                self.lines.push(line);
                id
            })
            .collect();

        debug!(
            added = added.len(),
            lines = self.lines.len(),
            from = ?before,
            to = ?self.status(),
            "Cart add_many"
        );
        added
    }

    /// Sets the quantity of one line.
    ///
    /// ## Errors
    /// - [`CoreError::InvalidQuantity`] unless `1 <= quantity <= MAX_LINE_QUANTITY`
    /// - [`CoreError::LineNotFound`] if no line has this id
    pub fn update_quantity(&mut self, id: LineId, quantity: i64) -> CoreResult<()> {
        if !(1..=MAX_LINE_QUANTITY).contains(&quantity) {
            return Err(CoreError::InvalidQuantity {
                line_id: id,
                requested: quantity,
            });
        }

        let line = self.line_mut(id)?;
        debug!(line = %id, from = line.quantity, to = quantity, "Cart quantity updated");
        line.quantity = quantity;
        Ok(())
    }

    /// Sets or clears the removal mark of one line. Totals are unaffected.
    pub fn mark_for_removal(&mut self, id: LineId, marked: bool) -> CoreResult<()> {
        let line = self.line_mut(id)?;
        line.marked_for_removal = marked;
        Ok(())
    }

    /// Removes exactly the marked lines.
    ///
    /// ## Returns
    /// How many lines were removed.
    pub fn remove_marked(&mut self) -> usize {
        let before = self.lines.len();
        self.lines.retain(|l| !l.marked_for_removal);
        let removed = before - self.lines.len();
        debug!(removed, remaining = self.lines.len(), to = ?self.status(), "Cart remove_marked");
        removed
    }

    /// Clears every line.
    pub fn reset(&mut self) {
        debug!(cleared = self.lines.len(), "Cart reset");
        self.lines.clear();
    }

    /// Sums quantities and costs over all lines. Zeros when empty.
    pub fn compute_totals(&self) -> CartTotals {
        self.lines.iter().fold(
            CartTotals {
                line_count: self.lines.len(),
                ..CartTotals::default()
            },
            |mut totals, line| {
                totals.total_quantity += line.quantity;
                totals.total_cost_base += line.line_cost_base();
                totals.total_cost_local += line.line_cost_local();
                totals
            },
        )
    }

    /// Refreshes each line's costs from the same-named product in `catalog`.
    ///
    /// Lines whose product is gone keep their snapshot. Quantity, mark and
    /// id are never touched.
    ///
    /// ## Returns
    /// How many lines had at least one value change.
    pub fn reprice(&mut self, catalog: &PricedCatalog) -> usize {
        let mut changed = 0;

        for line in &mut self.lines {
            let Some(priced) = catalog.get(&line.product_name) else {
                continue;
            };
            let differs = line.unit_cost_base != priced.unit_cost_base
                || line.unit_cost_local != priced.unit_cost_local
                || line.discount_pct != priced.discount_pct
                || line.supplier != priced.product.supplier;
            if differs {
                line.unit_cost_base = priced.unit_cost_base;
                line.unit_cost_local = priced.unit_cost_local;
                line.discount_pct = priced.discount_pct;
                line.supplier = priced.product.supplier.clone();
                changed += 1;
            }
        }

        debug!(changed, lines = self.lines.len(), "Cart repriced");
        changed
    }

    fn line_mut(&mut self, id: LineId) -> CoreResult<&mut CartLine> {
        self.lines
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or(CoreError::LineNotFound(id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
