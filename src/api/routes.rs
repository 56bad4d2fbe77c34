//! API route definitions.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::{routing::get, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::time::Instant;
use tracing::debug;

use super::error::ApiError;
use super::state::AppState;
use crate::storage::{Record, SortBy, SortOrder};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/urls", get(list_urls).post(add_url))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "data": {
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION"),
            "records": state.store.len().await,
            "capacity": state.store.capacity(),
        },
        "meta": {
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "version": env!("CARGO_PKG_VERSION")
        }
    }))
}

#[derive(Debug, Deserialize)]
struct ListParams {
    #[serde(rename = "sortBy")]
    sort_by: Option<String>,
    #[serde(rename = "sortOrder")]
    sort_order: Option<String>,
}

/// `GET /urls` -- the most recently stored URLs with their submission
/// counts. Defaults to `sortBy=age&sortOrder=desc`.
async fn list_urls(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Record>>, ApiError> {
    let sort_by = params
        .sort_by
        .as_deref()
        .map(str::parse::<SortBy>)
        .transpose()?
        .unwrap_or_default();
    let sort_order = params
        .sort_order
        .as_deref()
        .map(str::parse::<SortOrder>)
        .transpose()?
        .unwrap_or_default();

    let records = state.store.fetch(state.fetch_limit, sort_by, sort_order).await;
    debug!(%sort_by, %sort_order, count = records.len(), "listing URLs");
    Ok(Json(records))
}

#[derive(Debug, Deserialize)]
struct AddPayload {
    url: String,
}

/// `POST /urls` -- queue a URL for validation. Storage happens later, so
/// `202 Accepted` does not guarantee the URL will be stored.
async fn add_url(
    State(state): State<AppState>,
    payload: Result<Json<AddPayload>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(payload) = payload.map_err(ApiError::InvalidPayload)?;

    // Bound the wait so intake backpressure cannot starve the server.
    let deadline = Instant::now() + state.enqueue_timeout;
    state.processor.ingest(deadline, &payload.url).await?;

    Ok(StatusCode::ACCEPTED)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
