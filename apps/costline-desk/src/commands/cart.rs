//! # Cart Commands
//!
//! Commands over the session's [`CartStore`].
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  ┌──────────┐  add_to_cart   ┌──────────┐                               │
//! │  │  Empty   │───────────────►│ NonEmpty │◄── add_to_cart                │
//! │  │          │                │          │◄── update_quantity            │
//! │  └──────────┘                └──────────┘◄── mark_lines / reprice_cart  │
//! │       ▲                           │                                     │
//! │       │   clear_cart              │                                     │
//! │       │   remove_marked (all)     │                                     │
//! │       └───────────────────────────┘                                     │
//! │                                                                         │
//! │  Lines keep the costs from when they were added until reprice_cart.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use costline_core::{CartLine, CartStatus, CartStore, CartTotals, CoreError, LineId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::commands::picked_names;
use crate::desk::Desk;
use crate::error::ApiError;
use crate::state::SessionId;

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineDto {
    /// 1-based position, used by `qty` and `mark`.
    pub number: usize,
    pub id: LineId,
    pub product_name: String,
    pub supplier: String,
    pub quantity: i64,
    pub discount_pct: f64,
    pub unit_cost_base: f64,
    pub unit_cost_local: f64,
    pub line_cost_base: f64,
    pub line_cost_local: f64,
    pub marked_for_removal: bool,
}

impl CartLineDto {
    fn from_line(number: usize, line: &CartLine) -> Self {
        CartLineDto {
            number,
            id: line.id,
            product_name: line.product_name.clone(),
            supplier: line.supplier.clone(),
            quantity: line.quantity,
            discount_pct: line.discount_pct,
            unit_cost_base: line.unit_cost_base,
            unit_cost_local: line.unit_cost_local,
            line_cost_base: line.line_cost_base(),
            line_cost_local: line.line_cost_local(),
            marked_for_removal: line.marked_for_removal,
        }
    }
}

/// Cart response including lines and totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub status: CartStatus,
    pub lines: Vec<CartLineDto>,
    pub totals: CartTotals,
}

impl From<&CartStore> for CartResponse {
    fn from(cart: &CartStore) -> Self {
        CartResponse {
            status: cart.status(),
            lines: cart
                .lines()
                .iter()
                .enumerate()
                .map(|(idx, line)| CartLineDto::from_line(idx + 1, line))
                .collect(),
            totals: cart.compute_totals(),
        }
    }
}

/// How a command names a cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRef {
    Id(LineId),
    /// 1-based position as displayed.
    Number(usize),
}

impl LineRef {
    fn resolve(self, cart: &CartStore) -> Result<LineId, ApiError> {
        match self {
            LineRef::Id(id) => cart
                .line(id)
                .map(|line| line.id)
                .ok_or_else(|| CoreError::LineNotFound(id).into()),
            LineRef::Number(number) => number
                .checked_sub(1)
                .and_then(|idx| cart.lines().get(idx))
                .map(|line| line.id)
                .ok_or_else(|| ApiError::not_found("Cart line", &format!("#{}", number))),
        }
    }
}

impl From<LineId> for LineRef {
    fn from(id: LineId) -> Self {
        LineRef::Id(id)
    }
}

// =============================================================================
// Commands
// =============================================================================

/// Gets the current cart contents.
pub async fn get_cart(desk: &Desk, session_id: SessionId) -> CartResponse {
    debug!(session = %session_id, "get_cart command");
    let session = desk.sessions().session(session_id).await;
    let session = session.lock().await;
    CartResponse::from(&session.cart)
}

/// Adds search results to the cart, one new line each.
///
/// ## Behavior
/// - Picking the same result twice (or in two commands) gives two lines
/// - Costs are taken from a fresh cycle, so they reflect current settings
/// - A product that vanished from the sheet since the search fails the
///   whole call and nothing is added
///
/// ## Arguments
/// * `picks` - 1-based numbers from the last search
pub async fn add_to_cart(
    desk: &Desk,
    session_id: SessionId,
    picks: &[usize],
) -> Result<CartResponse, ApiError> {
    debug!(session = %session_id, ?picks, "add_to_cart command");

    let session = desk.sessions().session(session_id).await;
    let mut session = session.lock().await;

    let names = picked_names(&session, picks)?;
    let cycle = desk.cycle(&session.settings).await?;

    let selected = names
        .iter()
        .map(|name| {
            cycle
                .priced
                .get(name)
                .ok_or_else(|| CoreError::ProductNotFound(name.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let added = session.cart.add_many(selected);
    info!(session = %session_id, added = added.len(), "Lines added to cart");

    Ok(CartResponse::from(&session.cart))
}

/// Sets one line's quantity.
///
/// ## Errors
/// - `CART_ERROR` when `quantity < 1` (the line keeps its old quantity)
/// - `NOT_FOUND` when the line does not exist
pub async fn update_quantity(
    desk: &Desk,
    session_id: SessionId,
    line: LineRef,
    quantity: i64,
) -> Result<CartResponse, ApiError> {
    debug!(session = %session_id, ?line, quantity, "update_quantity command");

    let session = desk.sessions().session(session_id).await;
    let mut session = session.lock().await;

    let id = line.resolve(&session.cart)?;
    session.cart.update_quantity(id, quantity)?;

    Ok(CartResponse::from(&session.cart))
}

/// Sets or clears the removal mark on several lines at once.
///
/// Every reference is resolved before anything is marked.
pub async fn mark_lines(
    desk: &Desk,
    session_id: SessionId,
    lines: &[LineRef],
    marked: bool,
) -> Result<CartResponse, ApiError> {
    debug!(session = %session_id, count = lines.len(), marked, "mark_lines command");

    if lines.is_empty() {
        return Err(ApiError::validation("Select at least one cart line"));
    }

    let session = desk.sessions().session(session_id).await;
    let mut session = session.lock().await;

    let ids = lines
        .iter()
        .map(|line| line.resolve(&session.cart))
        .collect::<Result<Vec<_>, _>>()?;

    for id in ids {
        session.cart.mark_for_removal(id, marked)?;
    }

    Ok(CartResponse::from(&session.cart))
}

/// Removes every marked line.
pub async fn remove_marked(desk: &Desk, session_id: SessionId) -> CartResponse {
    debug!(session = %session_id, "remove_marked command");

    let session = desk.sessions().session(session_id).await;
    let mut session = session.lock().await;

    let removed = session.cart.remove_marked();
    info!(session = %session_id, removed, "Marked lines removed");

    CartResponse::from(&session.cart)
}

/// Empties the cart.
pub async fn clear_cart(desk: &Desk, session_id: SessionId) -> CartResponse {
    debug!(session = %session_id, "clear_cart command");

    let session = desk.sessions().session(session_id).await;
    let mut session = session.lock().await;
    session.cart.reset();

    CartResponse::from(&session.cart)
}

/// Re-prices every line from the current catalog and settings.
///
/// Lines whose product is no longer in the sheet keep their old costs.
pub async fn reprice_cart(desk: &Desk, session_id: SessionId) -> Result<CartResponse, ApiError> {
    debug!(session = %session_id, "reprice_cart command");

    let session = desk.sessions().session(session_id).await;
    let mut session = session.lock().await;

    let cycle = desk.cycle(&session.settings).await?;
    let changed = session.cart.reprice(&cycle.priced);
    info!(session = %session_id, changed, "Cart re-priced");

    Ok(CartResponse::from(&session.cart))
}

/// Replaces the whole ordered line collection (e.g. a restored cart).
///
/// Nothing changes unless every line is valid.
pub async fn replace_lines(
    desk: &Desk,
    session_id: SessionId,
    lines: Vec<CartLine>,
) -> Result<CartResponse, ApiError> {
    debug!(session = %session_id, count = lines.len(), "replace_lines command");

    let session = desk.sessions().session(session_id).await;
    let mut session = session.lock().await;
    session.cart.set_lines(lines)?;

    Ok(CartResponse::from(&session.cart))
}
