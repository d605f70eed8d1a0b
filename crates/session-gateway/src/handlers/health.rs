//! Health check handler.
//!
//! Liveness only: the gateway holds no connections worth probing, and a
//! missing room service shows up per request rather than here.

use crate::models::HealthResponse;
use axum::Json;
use tracing::instrument;

/// Handler for GET /health
///
/// ```json
/// { "status": "healthy" }
/// ```
#[instrument(skip_all, name = "sg.health.check")]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}
