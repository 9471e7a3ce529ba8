//! # Settings Commands
//!
//! Per-session pricing inputs: VAT, manual FX rate and discount overrides,
//! plus the explicit refresh of the shared caches.
//!
//! Every change applies from the next cycle on. Cart lines keep their
//! snapshot costs until `reprice_cart`.

use costline_feed::FxQuote;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::commands::picked_names;
use crate::desk::Desk;
use crate::error::ApiError;
use crate::state::{Session, SessionId};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountDto {
    pub product_name: String,
    pub discount_pct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsResponse {
    pub vat_pct: f64,
    pub fx_override: Option<f64>,
    /// The rate the next cycle will use.
    pub fx: FxQuote,
    pub discounts: Vec<DiscountDto>,
}

async fn settings_response(desk: &Desk, session: &Session) -> SettingsResponse {
    SettingsResponse {
        vat_pct: session.settings.vat_pct,
        fx_override: session.settings.fx_override,
        fx: desk.fx_for(&session.settings).await,
        discounts: session
            .settings
            .discounts
            .iter()
            .map(|(name, pct)| DiscountDto {
                product_name: name.to_string(),
                discount_pct: pct,
            })
            .collect(),
    }
}

pub async fn get_settings(desk: &Desk, session_id: SessionId) -> SettingsResponse {
    debug!(session = %session_id, "get_settings command");
    let session = desk.sessions().session(session_id).await;
    let session = session.lock().await;
    settings_response(desk, &session).await
}

/// Sets the session's VAT percentage (≥ 0).
pub async fn set_vat(
    desk: &Desk,
    session_id: SessionId,
    vat_pct: f64,
) -> Result<SettingsResponse, ApiError> {
    debug!(session = %session_id, vat_pct, "set_vat command");
    let session = desk.sessions().session(session_id).await;
    let mut session = session.lock().await;

    session.settings.set_vat(vat_pct)?;
    Ok(settings_response(desk, &session).await)
}

/// Pins a manual FX rate, or goes back to the live quote with `None`.
pub async fn set_fx_rate(
    desk: &Desk,
    session_id: SessionId,
    rate: Option<f64>,
) -> Result<SettingsResponse, ApiError> {
    debug!(session = %session_id, ?rate, "set_fx_rate command");
    let session = desk.sessions().session(session_id).await;
    let mut session = session.lock().await;

    session.settings.set_fx_override(rate)?;
    Ok(settings_response(desk, &session).await)
}

/// Overrides the discount of a product from the last search.
///
/// ## Arguments
/// * `pick` - 1-based result number
/// * `pct` - New discount in `[0, 100]`; `None` restores the supplier default
pub async fn set_discount(
    desk: &Desk,
    session_id: SessionId,
    pick: usize,
    pct: Option<f64>,
) -> Result<SettingsResponse, ApiError> {
    debug!(session = %session_id, pick, ?pct, "set_discount command");
    let session = desk.sessions().session(session_id).await;
    let mut session = session.lock().await;

    let names = picked_names(&session, &[pick])?;
    for name in &names {
        session.settings.set_discount(name, pct)?;
    }
    Ok(settings_response(desk, &session).await)
}

/// Drops the cached sheet and quote; the next cycle refetches both.
pub async fn refresh_feeds(desk: &Desk, session_id: SessionId) -> SettingsResponse {
    debug!(session = %session_id, "refresh_feeds command");
    desk.feed().refresh();
    get_settings(desk, session_id).await
}

/// Ends the session, discarding its cart and settings.
pub async fn end_session(desk: &Desk, session_id: SessionId) -> bool {
    debug!(session = %session_id, "end_session command");
    desk.sessions().end_session(session_id).await
}
