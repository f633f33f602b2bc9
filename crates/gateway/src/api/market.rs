//! Market data endpoints. Documents are re-read on every request so the
//! scraper can replace them while the server runs.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use serde::Deserialize;
use serde_json::json;
use tp_market::{analysis, source, CoinAnalysis};

use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct TrendingQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: Option<String>,
    /// Free text; the first known coin mentioned in it is searched.
    #[serde(default)]
    pub text: Option<String>,
}

fn text(report: String) -> Response {
    super::ok(json!({ "text": report }))
}

async fn analysis_or_fail(state: &AppState, failure: &str) -> Result<CoinAnalysis, Response> {
    let path = &state.config.market.analysis_path;
    source::load_analysis(path).await.map_err(|e| {
        tracing::warn!(path = %path.display(), error = %e, "coin analysis unavailable");
        super::fail(StatusCode::INTERNAL_SERVER_ERROR, failure)
    })
}

/// GET /api/helix-data
pub async fn helix_data(State(state): State<AppState>) -> Response {
    let path = &state.config.market.helix_path;
    match source::load_helix_raw(path).await {
        Ok(doc) => super::ok(doc),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "helix data unavailable");
            super::fail(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch helix data")
        }
    }
}

/// GET /api/market
pub async fn market(State(state): State<AppState>) -> Response {
    super::ok(source::market_snapshot(&state.config.market.helix_path).await)
}

/// GET /api/memecoins/trending?limit=N
pub async fn trending(State(state): State<AppState>, Query(q): Query<TrendingQuery>) -> Response {
    match analysis_or_fail(&state, "Failed to get trending coins").await {
        Ok(doc) => text(analysis::trending_report(&doc, q.limit.unwrap_or(10))),
        Err(resp) => resp,
    }
}

/// GET /api/memecoins/search?q=…
pub async fn search(State(state): State<AppState>, Query(q): Query<SearchQuery>) -> Response {
    let doc = match analysis_or_fail(&state, "Failed to search for coins").await {
        Ok(doc) => doc,
        Err(resp) => return resp,
    };
    let query = q
        .q
        .filter(|s| !s.trim().is_empty())
        .or_else(|| {
            q.text
                .as_deref()
                .and_then(|t| analysis::coins_in_text(&doc, t).into_iter().next())
        })
        .unwrap_or_default();
    text(analysis::search_report(&doc, query.trim()))
}

/// GET /api/memecoins/:symbol
pub async fn coin_info(State(state): State<AppState>, Path(symbol): Path<String>) -> Response {
    match analysis_or_fail(&state, "Failed to get coin information").await {
        Ok(doc) => text(analysis::coin_info_report(&doc, &symbol)),
        Err(resp) => resp,
    }
}

/// GET /api/memecoins/:symbol/risk
pub async fn coin_risk(State(state): State<AppState>, Path(symbol): Path<String>) -> Response {
    match analysis_or_fail(&state, "Failed to assess coin risk").await {
        Ok(doc) => text(analysis::risk_report(&doc, &symbol)),
        Err(resp) => resp,
    }
}

/// GET /api/memecoins/freshness
pub async fn freshness(State(state): State<AppState>) -> Response {
    let path = &state.config.market.analysis_path;
    match source::last_modified(path).await {
        Ok(modified) => text(analysis::freshness_report(modified, chrono::Utc::now())),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "cannot stat coin analysis");
            super::fail(StatusCode::INTERNAL_SERVER_ERROR, "Failed to check data freshness")
        }
    }
}
