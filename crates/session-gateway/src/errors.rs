//! Session Gateway error types.
//!
//! Every failure is converted to `{ "error": "<message>" }` with a status
//! code at the HTTP boundary via the `IntoResponse` impl. Client messages are
//! fixed strings: they never carry secrets, and upstream causes are logged
//! server-side only.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Failure of the room-creation call to the remote room service.
///
/// Carries the underlying cause for logging. It is never shown to clients.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Request could not be sent or timed out.
    #[error("room service unreachable: {0}")]
    Transport(String),

    /// Room service answered with a non-success status.
    #[error("room service rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Room service answered 2xx with an unusable body.
    #[error("malformed room service response: {0}")]
    MalformedResponse(String),
}

impl ProvisionError {
    /// Bounded label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProvisionError::Transport(_) => "transport",
            ProvisionError::Rejected { .. } => "rejected",
            ProvisionError::MalformedResponse(_) => "malformed",
        }
    }
}

/// Session Gateway error type.
///
/// Maps to HTTP status codes:
/// - BadRequest: 400 Bad Request
/// - AccessDenied: 403 Forbidden
/// - ProvisionFailure: 502 Bad Gateway
/// - Configuration, Internal: 500 Internal Server Error
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Access denied")]
    AccessDenied,

    #[error("Room provisioning failed: {0}")]
    ProvisionFailure(#[from] ProvisionError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal server error")]
    Internal,
}

impl GatewayError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            GatewayError::BadRequest(_) => 400,
            GatewayError::AccessDenied => 403,
            GatewayError::ProvisionFailure(_) => 502,
            GatewayError::Configuration(_) | GatewayError::Internal => 500,
        }
    }

    /// Session outcome label for metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            GatewayError::BadRequest(_) => "bad_request",
            GatewayError::AccessDenied => "rejected",
            GatewayError::ProvisionFailure(_) => "provision_failed",
            GatewayError::Configuration(_) => "configuration_error",
            GatewayError::Internal => "internal_error",
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            GatewayError::BadRequest(reason) => (StatusCode::BAD_REQUEST, reason.clone()),
            GatewayError::AccessDenied => (StatusCode::FORBIDDEN, "Wrong PIN".to_string()),
            GatewayError::ProvisionFailure(err) => {
                // Log actual cause server-side, return generic message to client
                tracing::error!(target: "sg.provisioning", error = %err, "Room provisioning failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "Failed to create room".to_string(),
                )
            }
            GatewayError::Configuration(what) => {
                tracing::error!(
                    target: "sg.config",
                    missing = %what,
                    "Request failed due to missing configuration"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Server is not configured".to_string(),
                )
            }
            GatewayError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An internal error occurred".to_string(),
            ),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
