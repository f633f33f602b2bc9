//! Wallet address checks for chat front-ends.

use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::Response;
use serde::Deserialize;
use serde_json::json;
use tp_market::wallet;

#[derive(Debug, Default, Deserialize)]
pub struct AddressQuery {
    #[serde(default)]
    pub text: String,
}

/// GET /api/wallet/address?text=…
pub async fn address(Query(q): Query<AddressQuery>) -> Response {
    match wallet::lookup_address(&q.text) {
        Ok(address) => super::ok(json!({ "address": address })),
        Err(prompt) => super::fail(StatusCode::BAD_REQUEST, prompt),
    }
}
