//! Session handler.
//!
//! `POST /api/v1/session` with body `{"pin": "<string>"}`.
//!
//! The body is read as raw bytes and parsed here so that an empty, non-JSON,
//! PIN-less or oversized body gets the same `{"error": ...}` shape as every
//! other failure instead of axum's plain-text rejection.

use crate::errors::GatewayError;
use crate::models::{SessionRequest, SessionResponse};
use crate::observability::metrics;
use crate::routes::AppState;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    Json,
};
use std::sync::Arc;
use tracing::instrument;

/// Message returned for any unparseable request body.
pub const INVALID_BODY_MESSAGE: &str = "Invalid request body";

/// Handler for POST /api/v1/session
///
/// ## Responses
///
/// - 200 `{"token": "...", "ws_url": "wss://..."}`
/// - 400 `{"error": "Invalid request body"}`
/// - 403 `{"error": "Wrong PIN"}`
/// - 502 `{"error": "Failed to create room"}`
/// - 500 `{"error": "..."}` for missing configuration or internal failures
#[instrument(skip_all, name = "sg.session.create")]
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<SessionResponse>, GatewayError> {
    let request = read_body(body)
        .and_then(|bytes| parse_request(&bytes))
        .inspect_err(|e| {
        metrics::record_session_outcome(e.outcome());
    })?;

    let response = state.orchestrator.start_session(&request).await?;

    Ok(Json(response))
}

fn read_body(body: Result<Bytes, BytesRejection>) -> Result<Bytes, GatewayError> {
    body.map_err(|rejection| {
        tracing::debug!(
            target: "sg.handlers.session",
            status = %rejection.status(),
            "Request body could not be read"
        );
        GatewayError::BadRequest(INVALID_BODY_MESSAGE.to_string())
    })
}

fn parse_request(body: &[u8]) -> Result<SessionRequest, GatewayError> {
    serde_json::from_slice(body).map_err(|e| {
        // Error text can quote the offending value, so only the position is logged
        tracing::debug!(
            target: "sg.handlers.session",
            line = e.line(),
            column = e.column(),
            "Rejected request body"
        );
        GatewayError::BadRequest(INVALID_BODY_MESSAGE.to_string())
    })
}
