//! Session Gateway models.
//!
//! Request/response bodies and the per-session room descriptor. None of
//! these are persisted: each request builds them fresh.

use crate::errors::GatewayError;
use common::secret::SecretString;
use serde::{Deserialize, Serialize};

/// Body of `POST /api/v1/session`.
#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    /// Caller-supplied PIN (redacted in Debug output).
    pub pin: SecretString,
}

/// Successful session response.
#[derive(Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    /// Serialized participant credential.
    pub token: String,

    /// Media transport endpoint.
    pub ws_url: String,
}

impl std::fmt::Debug for SessionResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionResponse")
            .field("token", &"[REDACTED]")
            .field("ws_url", &self.ws_url)
            .finish()
    }
}

/// Health check response.
///
/// Returned by the `/health` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service health status.
    pub status: String,
}

/// Parameters for a room created at session start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomDescriptor {
    name: String,
    empty_timeout_seconds: u32,
    max_participants: u32,
    dispatched_agents: Vec<String>,
}

impl RoomDescriptor {
    /// Build a descriptor, enforcing a non-empty name and capacity >= 1.
    pub fn new(
        name: String,
        empty_timeout_seconds: u32,
        max_participants: u32,
        dispatched_agents: Vec<String>,
    ) -> Result<Self, GatewayError> {
        if name.is_empty() {
            tracing::error!(target: "sg.models", "Room descriptor built with empty name");
            return Err(GatewayError::Internal);
        }

        if max_participants == 0 {
            return Err(GatewayError::Configuration(
                "ROOM_MAX_PARTICIPANTS".to_string(),
            ));
        }

        Ok(Self {
            name,
            empty_timeout_seconds,
            max_participants,
            dispatched_agents,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn empty_timeout_seconds(&self) -> u32 {
        self.empty_timeout_seconds
    }

    pub fn max_participants(&self) -> u32 {
        self.max_participants
    }

    /// Agents attached to the room at creation, in dispatch order.
    pub fn dispatched_agents(&self) -> &[String] {
        &self.dispatched_agents
    }
}
