//! Room provisioning against the remote room service.
//!
//! Creates a room with its lifecycle limits and agent-dispatch list, using
//! the short-lived administrative credential as a bearer token. One call per
//! session, no retries: a failure aborts the session.
//!
//! # Wire Format
//!
//! ```text
//! POST {base}/twirp/livekit.RoomService/CreateRoom
//! Authorization: Bearer <admin credential>
//!
//! {"name":"session-1700000000-9f2c01ab","empty_timeout":60,
//!  "max_participants":2,"agents":[{"agent_name":"assistant"}]}
//! ```
//!
//! A `ws`/`wss` base URL is mapped to `http`/`https` for API calls.

use crate::errors::ProvisionError;
use crate::models::RoomDescriptor;
use crate::services::credential_issuer::Credential;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Room-creation RPC path on the room service.
pub const CREATE_ROOM_PATH: &str = "/twirp/livekit.RoomService/CreateRoom";

/// Connect timeout for room service requests in seconds.
const CONNECT_TIMEOUT_SECS: u64 = 5;

/// Maximum number of response body bytes kept for logging.
const MAX_LOGGED_BODY_BYTES: usize = 512;

/// Agent dispatch entry in the room-creation payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDispatch {
    pub agent_name: String,
}

/// Room-creation payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRoomPayload {
    pub name: String,
    pub empty_timeout: u32,
    pub max_participants: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub agents: Vec<AgentDispatch>,
}

impl From<&RoomDescriptor> for CreateRoomPayload {
    fn from(descriptor: &RoomDescriptor) -> Self {
        Self {
            name: descriptor.name().to_string(),
            empty_timeout: descriptor.empty_timeout_seconds(),
            max_participants: descriptor.max_participants(),
            agents: descriptor
                .dispatched_agents()
                .iter()
                .map(|agent_name| AgentDispatch {
                    agent_name: agent_name.clone(),
                })
                .collect(),
        }
    }
}

/// Room as returned by the room service. Only the fields we check.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedRoom {
    pub name: String,
    #[serde(default)]
    pub sid: String,
}

/// Trait for room provisioning (enables mocking).
///
/// Implementations hide their transport style; the orchestrator sees one
/// awaitable call that either created the room or failed.
#[async_trait::async_trait]
pub trait RoomProvisioner: Send + Sync {
    /// Create the room described by `descriptor`.
    async fn create_room(
        &self,
        descriptor: &RoomDescriptor,
        admin_credential: &Credential,
    ) -> Result<(), ProvisionError>;
}

/// HTTP client for the room service API.
#[derive(Clone)]
pub struct HttpRoomProvisioner {
    /// HTTP client with configured timeouts.
    client: Client,

    /// Room-creation endpoint, derived from the room service base URL.
    create_room_url: String,
}

impl HttpRoomProvisioner {
    /// Create a new provisioner.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Room service URL (http, https, ws or wss)
    /// * `timeout` - Whole-request timeout for room creation
    ///
    /// # Errors
    ///
    /// Returns `ProvisionError::Transport` if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ProvisionError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS).min(timeout))
            .build()
            .map_err(|e| ProvisionError::Transport(format!("failed to build HTTP client: {e}")))?;

        let create_room_url = format!(
            "{}{}",
            api_base_url(base_url).trim_end_matches('/'),
            CREATE_ROOM_PATH
        );

        Ok(Self {
            client,
            create_room_url,
        })
    }
}

#[async_trait::async_trait]
impl RoomProvisioner for HttpRoomProvisioner {
    #[instrument(skip_all, fields(room = %descriptor.name()))]
    async fn create_room(
        &self,
        descriptor: &RoomDescriptor,
        admin_credential: &Credential,
    ) -> Result<(), ProvisionError> {
        let payload = CreateRoomPayload::from(descriptor);

        let response = self
            .client
            .post(&self.create_room_url)
            .bearer_auth(admin_credential.token())
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                warn!(target: "sg.services.room_provisioner", error = %e, "Room service request failed");
                ProvisionError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            truncate_at_char_boundary(&mut body, MAX_LOGGED_BODY_BYTES);
            warn!(
                target: "sg.services.room_provisioner",
                status = %status,
                "Room service rejected room creation"
            );
            return Err(ProvisionError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let room: CreatedRoom = response
            .json()
            .await
            .map_err(|e| ProvisionError::MalformedResponse(e.to_string()))?;

        if room.name != descriptor.name() {
            return Err(ProvisionError::MalformedResponse(format!(
                "created room '{}' does not match requested '{}'",
                room.name,
                descriptor.name()
            )));
        }

        info!(
            target: "sg.services.room_provisioner",
            room = %room.name,
            room_sid = %room.sid,
            agents = descriptor.dispatched_agents().len(),
            "Room created"
        );

        Ok(())
    }
}

/// Map a room service URL to its HTTP API base.
pub fn api_base_url(url: &str) -> String {
    if let Some(rest) = url.strip_prefix("wss://") {
        format!("https://{rest}")
    } else if let Some(rest) = url.strip_prefix("ws://") {
        format!("http://{rest}")
    } else {
        url.to_string()
    }
}

fn truncate_at_char_boundary(text: &mut String, max_bytes: usize) {
    if text.len() <= max_bytes {
        return;
    }
    let mut cut = max_bytes;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
}

/// Mock provisioner module for testing.
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Mock room provisioner for unit testing.
    pub struct MockRoomProvisioner {
        /// Number of calls made.
        call_count: AtomicUsize,
        /// Whether to return errors.
        return_error: bool,
        /// Room names seen, in call order.
        rooms: Mutex<Vec<String>>,
        /// Bearer tokens seen, in call order.
        tokens: Mutex<Vec<String>>,
    }

    impl MockRoomProvisioner {
        /// Create a mock that always succeeds.
        pub fn accepting() -> Self {
            Self::build(false)
        }

        /// Create a mock that always fails with a transport error.
        pub fn failing() -> Self {
            Self::build(true)
        }

        fn build(return_error: bool) -> Self {
            Self {
                call_count: AtomicUsize::new(0),
                return_error,
                rooms: Mutex::new(Vec::new()),
                tokens: Mutex::new(Vec::new()),
            }
        }

        /// Get the number of calls made.
        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        /// Room names passed to `create_room`.
        pub fn rooms(&self) -> Vec<String> {
            self.rooms.lock().map(|r| r.clone()).unwrap_or_default()
        }

        /// Bearer tokens passed to `create_room`.
        pub fn tokens(&self) -> Vec<String> {
            self.tokens.lock().map(|t| t.clone()).unwrap_or_default()
        }
    }

    #[async_trait::async_trait]
    impl RoomProvisioner for MockRoomProvisioner {
        async fn create_room(
            &self,
            descriptor: &RoomDescriptor,
            admin_credential: &Credential,
        ) -> Result<(), ProvisionError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);

            if let Ok(mut rooms) = self.rooms.lock() {
                rooms.push(descriptor.name().to_string());
            }
            if let Ok(mut tokens) = self.tokens.lock() {
                tokens.push(admin_credential.token().to_string());
            }

            if self.return_error {
                return Err(ProvisionError::Transport(
                    "Mock room service error".to_string(),
                ));
            }

            Ok(())
        }
    }
}
