//! Mapping of handler failures onto HTTP responses.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::ingest::IngestError;
use crate::storage::SortError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    InvalidSort(#[from] SortError),

    #[error("invalid request payload: {0}")]
    InvalidPayload(#[source] JsonRejection),

    #[error("failed to ingest URL: {0}")]
    Ingest(#[from] IngestError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(error = %self, "request failed");

        let (status, message) = match &self {
            ApiError::InvalidSort(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::InvalidPayload(_) => {
                (StatusCode::BAD_REQUEST, "invalid request payload".to_string())
            }
            ApiError::Ingest(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "unexpected error adding URL".to_string(),
            ),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
