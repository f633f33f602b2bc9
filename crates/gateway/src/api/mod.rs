//! REST API served next to the bridge.
//!
//! Every response uses the `{ success, data?, error? }` envelope.

pub mod agents;
pub mod health;
pub mod market;
pub mod wallet;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(health::health))
        .route("/api/agents", get(agents::list_agents).post(agents::create_agent))
        .route("/api/agents/:id", get(agents::get_agent))
        .route("/api/helix-data", get(market::helix_data))
        .route("/api/market", get(market::market))
        .route("/api/memecoins/trending", get(market::trending))
        .route("/api/memecoins/search", get(market::search))
        .route("/api/memecoins/freshness", get(market::freshness))
        .route("/api/memecoins/:symbol", get(market::coin_info))
        .route("/api/memecoins/:symbol/risk", get(market::coin_risk))
        .route("/api/wallet/address", get(wallet::address))
}

// ── Envelope ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn ok<T: Serialize>(data: T) -> Response {
    respond(StatusCode::OK, data)
}

pub fn respond<T: Serialize>(status: StatusCode, data: T) -> Response {
    (
        status,
        Json(Envelope {
            success: true,
            data: Some(data),
            error: None,
        }),
    )
        .into_response()
}

pub fn fail(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(Envelope::<()> {
            success: false,
            data: None,
            error: Some(message.into()),
        }),
    )
        .into_response()
}
