use axum::extract::State;
use axum::response::Response;

use crate::state::AppState;

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Response {
    super::ok(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.started_at.elapsed().as_secs(),
        "connections": state.connections.len(),
    }))
}
