//! Credential issuance.
//!
//! Builds HS256-signed room credentials from an explicit [`CredentialSpec`].
//! The gateway issues two shapes per session:
//!
//! | Role | Subject | Grants | TTL | Leaves the server |
//! |------|---------|--------|-----|-------------------|
//! | Administrative | service identity | create + admin room | ~1 minute | never |
//! | Participant | participant identity | join room, publish, subscribe | ~1 hour | yes |
//!
//! Issuance is a pure function of the [`CredentialSpec`], the signing key
//! and the issue time: identical inputs produce an identical token. Expiry is
//! embedded in the token and enforced by the room service and media
//! transport; the gateway never verifies what it issues.

use crate::config::Config;
use crate::errors::GatewayError;
use chrono::{DateTime, Utc};
use common::credential::{Grants, RoomClaims, VideoGrant};
use common::secret::{is_blank, ExposeSecret, SecretString};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use std::fmt;
use std::time::Duration;
use tracing::instrument;

/// Everything that shapes a credential, reviewable at the call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialSpec {
    pub subject: String,
    pub display_name: Option<String>,
    pub grants: Grants,
    pub ttl: Duration,
}

impl CredentialSpec {
    /// Server-side credential used only to create the room.
    pub fn administrative(service_identity: &str, ttl: Duration) -> Self {
        Self {
            subject: service_identity.to_string(),
            display_name: None,
            grants: Grants::room_management(),
            ttl,
        }
    }

    /// Credential returned to the caller for joining `room`.
    pub fn participant(
        identity: &str,
        display_name: Option<&str>,
        room: &str,
        ttl: Duration,
    ) -> Self {
        Self {
            subject: identity.to_string(),
            display_name: display_name.map(ToString::to_string),
            grants: Grants::participant(room),
            ttl,
        }
    }
}

/// Signing key id plus HMAC secret.
#[derive(Clone)]
pub struct SigningKey {
    key_id: String,
    secret: SecretString,
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("key_id", &self.key_id)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl SigningKey {
    /// Build a signing key, rejecting absent material.
    ///
    /// # Errors
    ///
    /// `GatewayError::Configuration` if the key id or secret is blank.
    pub fn new(key_id: impl Into<String>, secret: SecretString) -> Result<Self, GatewayError> {
        let key_id = key_id.into();

        if key_id.trim().is_empty() {
            return Err(GatewayError::Configuration(
                "ROOM_SERVICE_API_KEY".to_string(),
            ));
        }

        if is_blank(&secret) {
            return Err(GatewayError::Configuration(
                "ROOM_SERVICE_API_SECRET".to_string(),
            ));
        }

        Ok(Self { key_id, secret })
    }

    /// Signing key from configuration.
    ///
    /// # Errors
    ///
    /// `GatewayError::Configuration` naming the first missing setting.
    pub fn from_config(config: &Config) -> Result<Self, GatewayError> {
        let key_id = config
            .api_key
            .clone()
            .ok_or_else(|| GatewayError::Configuration("ROOM_SERVICE_API_KEY".to_string()))?;

        let secret = config
            .api_secret
            .clone()
            .ok_or_else(|| GatewayError::Configuration("ROOM_SERVICE_API_SECRET".to_string()))?;

        Self::new(key_id, secret)
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }
}

/// A signed credential and the claims it carries.
///
/// The serialized token is held as a secret; Debug never prints it.
#[derive(Clone)]
pub struct Credential {
    claims: RoomClaims,
    token: SecretString,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("claims", &self.claims)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl Credential {
    pub fn claims(&self) -> &RoomClaims {
        &self.claims
    }

    /// Serialized JWT. Callers decide whether it may leave the server.
    pub fn token(&self) -> &str {
        self.token.expose_secret()
    }
}

/// Issue a credential signed with `key`, valid from `issued_at` for `spec.ttl`.
///
/// # Errors
///
/// - `GatewayError::Internal` if `spec` grants nothing, has a TTL under one
///   second, or signing fails
#[instrument(skip_all, fields(key_id = %key.key_id(), ttl_seconds = spec.ttl.as_secs()))]
pub fn issue(
    spec: &CredentialSpec,
    key: &SigningKey,
    issued_at: DateTime<Utc>,
) -> Result<Credential, GatewayError> {
    if spec.grants.is_empty() {
        tracing::error!(target: "sg.services.credentials", "Refusing to issue credential without grants");
        return Err(GatewayError::Internal);
    }

    let ttl_seconds = i64::try_from(spec.ttl.as_secs()).map_err(|_| GatewayError::Internal)?;
    if ttl_seconds < 1 {
        tracing::error!(target: "sg.services.credentials", "Refusing to issue credential with zero TTL");
        return Err(GatewayError::Internal);
    }

    let iat = issued_at.timestamp();
    let claims = RoomClaims {
        iss: key.key_id().to_string(),
        sub: spec.subject.clone(),
        name: spec.display_name.clone(),
        iat,
        nbf: iat,
        exp: iat + ttl_seconds,
        video: VideoGrant::from(&spec.grants),
    };

    let header = Header::new(Algorithm::HS256);
    let encoding_key = EncodingKey::from_secret(key.secret.expose_secret().as_bytes());

    let token = encode(&header, &claims, &encoding_key).map_err(|e| {
        tracing::error!(target: "sg.services.credentials", error = %e, "Credential signing failed");
        GatewayError::Internal
    })?;

    Ok(Credential {
        claims,
        token: SecretString::from(token),
    })
}
