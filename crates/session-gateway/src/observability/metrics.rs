//! Metrics definitions for Session Gateway.
//!
//! All metrics follow Prometheus naming conventions:
//! - `sg_` prefix for Session Gateway
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion:
//! - `endpoint`: normalized to known routes, everything else is "/other"
//! - `outcome`: one value per session terminal state
//! - `status` / `error_type`: bounded by code
//! - `role`: "administrative" or "participant"
//!
//! Room names, identities and tokens are never used as labels.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize Prometheus metrics recorder and return the handle
/// for serving metrics via HTTP.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if Prometheus recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("sg_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000, 10.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        // Room creation is a remote call bounded by ROOM_SERVICE_TIMEOUT_SECONDS
        .set_buckets_for_metric(
            Matcher::Prefix("sg_room_provision".to_string()),
            &[
                0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000, 10.000,
            ],
        )
        .map_err(|e| format!("Failed to set room provision buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion
///
/// Metric: `sg_http_requests_total`, `sg_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status`
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    let normalized_endpoint = normalize_endpoint(endpoint);
    let status = categorize_status_code(status_code);

    histogram!("sg_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint.to_string(),
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("sg_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint.to_string(),
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Categorize HTTP status code into success/error/timeout
fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

/// Normalize endpoint path to prevent label cardinality explosion
fn normalize_endpoint(path: &str) -> &'static str {
    match path {
        "/api/v1/session" => "/api/v1/session",
        "/health" => "/health",
        "/metrics" => "/metrics",
        _ => "/other",
    }
}

// ============================================================================
// Session Metrics
// ============================================================================

/// Record a session reaching a terminal state.
///
/// Metric: `sg_sessions_total`
/// Labels: `outcome`
///
/// Outcomes: "completed", "rejected", "bad_request", "provision_failed",
///           "configuration_error", "internal_error"
pub fn record_session_outcome(outcome: &str) {
    counter!("sg_sessions_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record a credential issuance.
///
/// Metric: `sg_credentials_issued_total`
/// Labels: `role`
pub fn record_credential_issued(role: &str) {
    counter!("sg_credentials_issued_total",
        "role" => role.to_string()
    )
    .increment(1);
}

// ============================================================================
// Room Service Metrics
// ============================================================================

/// Record a room creation call.
///
/// Metric: `sg_room_provision_duration_seconds`, `sg_room_provisions_total`
/// Labels: `status`, `error_type`
///
/// Status: "success", "error"
/// Error types: "transport", "rejected", "malformed", "none"
pub fn record_room_provision(status: &str, error_type: Option<&str>, duration: Duration) {
    histogram!("sg_room_provision_duration_seconds",
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("sg_room_provisions_total",
        "status" => status.to_string(),
        "error_type" => error_type.unwrap_or("none").to_string()
    )
    .increment(1);
}
