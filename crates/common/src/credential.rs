//! Room credential claims shared across Session Gateway crates.
//!
//! A room credential is an HS256-signed JWT understood by the remote room
//! service and the media transport. This module defines:
//! - The capability model ([`Grants`]) used at issuance call sites
//! - The wire layout of the claims ([`RoomClaims`], [`VideoGrant`])
//! - An unverified claim reader for diagnostics and tests ([`peek_claims`])
//!
//! # Security
//!
//! - The `sub` field in [`RoomClaims`] is redacted in Debug output
//! - Tokens are size-checked BEFORE parsing
//! - [`peek_claims`] does NOT verify signatures. The gateway never verifies
//!   the credentials it issues; the room service and media transport do.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum credential size accepted by [`peek_claims`] (8KB).
///
/// Issued credentials are a few hundred bytes; anything larger is rejected
/// before base64 decoding.
pub const MAX_CREDENTIAL_SIZE_BYTES: usize = 8192;

// =============================================================================
// Error Types
// =============================================================================

/// Errors from reading a credential without verifying it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialFormatError {
    /// Credential exceeds [`MAX_CREDENTIAL_SIZE_BYTES`].
    #[error("Credential exceeds maximum size")]
    TooLarge,

    /// Credential is not a three-segment JWT with a JSON claims segment.
    #[error("Credential is malformed")]
    Malformed,
}

// =============================================================================
// Capability Model
// =============================================================================

/// Capability flags attached to a credential.
///
/// At most one room is in scope: the room named by `join_room`. Room
/// management capabilities (`create_room`, `admin_room`) are not room scoped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grants {
    /// May create rooms through the room service API.
    pub create_room: bool,

    /// May administer rooms through the room service API.
    pub admin_room: bool,

    /// May join this specific room.
    pub join_room: Option<String>,

    /// May publish media tracks.
    pub publish: bool,

    /// May subscribe to media tracks.
    pub subscribe: bool,
}

impl Grants {
    /// Grants for the server-side administrative credential.
    #[must_use]
    pub fn room_management() -> Self {
        Self {
            create_room: true,
            admin_room: true,
            ..Self::default()
        }
    }

    /// Grants for a participant joining `room`.
    #[must_use]
    pub fn participant(room: impl Into<String>) -> Self {
        Self {
            join_room: Some(room.into()),
            publish: true,
            subscribe: true,
            ..Self::default()
        }
    }

    /// Returns `true` if no capability is granted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// =============================================================================
// Wire Layout
// =============================================================================

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(value: &bool) -> bool {
    !*value
}

/// The `video` claim object as the room service expects it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoGrant {
    #[serde(default, skip_serializing_if = "is_false")]
    pub room_create: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub room_admin: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub room_join: bool,

    /// Room the join grant is scoped to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_publish: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_subscribe: Option<bool>,
}

impl From<&Grants> for VideoGrant {
    fn from(grants: &Grants) -> Self {
        Self {
            room_create: grants.create_room,
            room_admin: grants.admin_room,
            room_join: grants.join_room.is_some(),
            room: grants.join_room.clone(),
            can_publish: grants.publish.then_some(true),
            can_subscribe: grants.subscribe.then_some(true),
        }
    }
}

impl VideoGrant {
    /// Returns `true` if this grant allows joining `room`.
    #[must_use]
    pub fn can_join(&self, room: &str) -> bool {
        self.room_join && self.room.as_deref() == Some(room)
    }
}

/// Room credential claims.
///
/// # Fields
///
/// - `iss`: Signing key id (room-service API key)
/// - `sub`: Subject identity (service or participant)
/// - `name`: Optional display name
/// - `iat` / `nbf`: Issue time (Unix epoch seconds)
/// - `exp`: Expiration (Unix epoch seconds), always after `iat`
/// - `video`: Capability grant
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomClaims {
    pub iss: String,

    /// Subject identity - redacted in Debug output.
    pub sub: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub iat: i64,

    pub nbf: i64,

    pub exp: i64,

    pub video: VideoGrant,
}

impl fmt::Debug for RoomClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoomClaims")
            .field("iss", &self.iss)
            .field("sub", &"[REDACTED]")
            .field("name", &self.name)
            .field("iat", &self.iat)
            .field("nbf", &self.nbf)
            .field("exp", &self.exp)
            .field("video", &self.video)
            .finish()
    }
}

impl RoomClaims {
    /// Lifetime of the credential in seconds.
    #[must_use]
    pub fn lifetime_seconds(&self) -> i64 {
        self.exp - self.iat
    }
}

// =============================================================================
// Functions
// =============================================================================

/// Read the claims of a credential WITHOUT verifying its signature.
///
/// Intended for diagnostics and tests. Nothing here establishes trust in the
/// token; the room service verifies signatures and expiry on its own.
///
/// # Errors
///
/// - `TooLarge` - Token exceeds [`MAX_CREDENTIAL_SIZE_BYTES`]
/// - `Malformed` - Token is not three segments, or the claims segment is
///   not base64url-encoded [`RoomClaims`] JSON
pub fn peek_claims(token: &str) -> Result<RoomClaims, CredentialFormatError> {
    if token.len() > MAX_CREDENTIAL_SIZE_BYTES {
        tracing::debug!(
            target: "common.credential",
            token_size = token.len(),
            max_size = MAX_CREDENTIAL_SIZE_BYTES,
            "Credential rejected: size exceeds maximum allowed"
        );
        return Err(CredentialFormatError::TooLarge);
    }

    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(CredentialFormatError::Malformed);
    }

    let payload = parts.get(1).ok_or(CredentialFormatError::Malformed)?;
    let payload_bytes = URL_SAFE_NO_PAD.decode(payload).map_err(|e| {
        tracing::debug!(target: "common.credential", error = %e, "Failed to decode claims base64");
        CredentialFormatError::Malformed
    })?;

    serde_json::from_slice(&payload_bytes).map_err(|e| {
        tracing::debug!(target: "common.credential", error = %e, "Failed to parse claims JSON");
        CredentialFormatError::Malformed
    })
}
