//! Session orchestration.
//!
//! One request moves through a fixed sequence of stages:
//!
//! ```text
//! Received -> Authorized -> RoomNamed -> RoomProvisioned -> Credentialed -> Completed
//!     \            \              \              \
//!      Rejected     ConfigError    Internal       ProvisionFailed
//! ```
//!
//! Nothing is retained between requests. The administrative credential is
//! dropped as soon as the room-creation call returns and never reaches the
//! response.

use crate::config::Config;
use crate::errors::GatewayError;
use crate::models::{RoomDescriptor, SessionRequest, SessionResponse};
use crate::observability::metrics;
use crate::services::credential_issuer::{self, CredentialSpec, SigningKey};
use crate::services::pin_gate;
use crate::services::room_namer::RoomNamer;
use crate::services::room_provisioner::{HttpRoomProvisioner, RoomProvisioner};
use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

/// Stage a session request has reached. Logged on failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStage {
    Received,
    Authorized,
    RoomNamed,
    RoomProvisioned,
    Credentialed,
}

impl fmt::Display for SessionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionStage::Received => "received",
            SessionStage::Authorized => "authorized",
            SessionStage::RoomNamed => "room_named",
            SessionStage::RoomProvisioned => "room_provisioned",
            SessionStage::Credentialed => "credentialed",
        };
        f.write_str(name)
    }
}

/// Runs the session flow against a room provisioner.
pub struct SessionOrchestrator {
    config: Arc<Config>,
    namer: RoomNamer,
    provisioner: Option<Arc<dyn RoomProvisioner>>,
}

impl SessionOrchestrator {
    /// Create an orchestrator with an explicit provisioner.
    ///
    /// `None` means no room service is configured; sessions that pass the
    /// PIN gate then fail with a configuration error.
    pub fn new(config: Arc<Config>, provisioner: Option<Arc<dyn RoomProvisioner>>) -> Self {
        let namer = RoomNamer::new(config.room_name_prefix.clone());
        Self {
            config,
            namer,
            provisioner,
        }
    }

    /// Create an orchestrator talking to the configured room service over HTTP.
    ///
    /// # Errors
    ///
    /// `GatewayError::Internal` if the HTTP client cannot be built.
    pub fn from_config(config: Arc<Config>) -> Result<Self, GatewayError> {
        let provisioner: Option<Arc<dyn RoomProvisioner>> = match &config.room_service_url {
            Some(url) => {
                let client = HttpRoomProvisioner::new(
                    url,
                    Duration::from_secs(config.room_service_timeout_seconds),
                )
                .map_err(|e| {
                    tracing::error!(target: "sg.services.session", error = %e, "Failed to build room service client");
                    GatewayError::Internal
                })?;
                Some(Arc::new(client))
            }
            None => None,
        };

        Ok(Self::new(config, provisioner))
    }

    /// Verify the PIN, create a room, and return a participant credential for it.
    ///
    /// # Errors
    ///
    /// - `AccessDenied` for a wrong PIN or an unset gate; no room is created
    /// - `Configuration` if signing material or the room service URL is missing
    /// - `ProvisionFailure` if the room service call fails
    /// - `Internal` for randomness or signing failures
    #[instrument(skip_all, name = "sg.services.session.start")]
    pub async fn start_session(
        &self,
        request: &SessionRequest,
    ) -> Result<SessionResponse, GatewayError> {
        let mut stage = SessionStage::Received;

        let result = self.run(request, &mut stage).await;

        match &result {
            Ok(_) => metrics::record_session_outcome("completed"),
            Err(e) => {
                metrics::record_session_outcome(e.outcome());
                warn!(
                    target: "sg.services.session",
                    stage = %stage,
                    outcome = e.outcome(),
                    "Session request failed"
                );
            }
        }

        result
    }

    async fn run(
        &self,
        request: &SessionRequest,
        stage: &mut SessionStage,
    ) -> Result<SessionResponse, GatewayError> {
        if !pin_gate::verify(&request.pin, self.config.session_pin.as_ref()) {
            return Err(GatewayError::AccessDenied);
        }
        *stage = SessionStage::Authorized;

        let key = SigningKey::from_config(&self.config)?;
        let provisioner = self
            .provisioner
            .as_ref()
            .ok_or_else(|| GatewayError::Configuration("ROOM_SERVICE_URL".to_string()))?;
        let ws_url = self
            .config
            .room_service_url
            .as_deref()
            .ok_or_else(|| GatewayError::Configuration("ROOM_SERVICE_URL".to_string()))
            .and_then(media_endpoint)?;

        let room_name = self.namer.generate()?;
        let descriptor = RoomDescriptor::new(
            room_name,
            self.config.empty_timeout_seconds,
            self.config.max_participants,
            self.config.agent_names.clone(),
        )?;
        *stage = SessionStage::RoomNamed;

        let admin_credential = credential_issuer::issue(
            &CredentialSpec::administrative(
                &self.config.service_identity,
                Duration::from_secs(self.config.admin_token_ttl_seconds),
            ),
            &key,
            Utc::now(),
        )?;
        metrics::record_credential_issued("administrative");

        let start = Instant::now();
        let provisioned = provisioner
            .create_room(&descriptor, &admin_credential)
            .await;
        drop(admin_credential);

        match &provisioned {
            Ok(()) => metrics::record_room_provision("success", None, start.elapsed()),
            Err(e) => metrics::record_room_provision("error", Some(e.kind()), start.elapsed()),
        }
        provisioned?;
        *stage = SessionStage::RoomProvisioned;

        let participant_credential = credential_issuer::issue(
            &CredentialSpec::participant(
                &self.config.participant_identity,
                self.config.participant_name.as_deref(),
                descriptor.name(),
                Duration::from_secs(self.config.participant_token_ttl_seconds),
            ),
            &key,
            Utc::now(),
        )?;
        metrics::record_credential_issued("participant");
        *stage = SessionStage::Credentialed;

        info!(
            target: "sg.services.session",
            room = %descriptor.name(),
            "Session started"
        );

        Ok(SessionResponse {
            token: participant_credential.token().to_string(),
            ws_url,
        })
    }
}

/// Media transport endpoint for a room service URL.
///
/// `https` maps to `wss` and `http` to `ws`; websocket URLs pass through.
///
/// # Errors
///
/// `GatewayError::Configuration` for any other scheme.
pub fn media_endpoint(url: &str) -> Result<String, GatewayError> {
    if let Some(rest) = url.strip_prefix("https://") {
        Ok(format!("wss://{rest}"))
    } else if let Some(rest) = url.strip_prefix("http://") {
        Ok(format!("ws://{rest}"))
    } else if url.starts_with("wss://") || url.starts_with("ws://") {
        Ok(url.to_string())
    } else {
        Err(GatewayError::Configuration("ROOM_SERVICE_URL".to_string()))
    }
}
