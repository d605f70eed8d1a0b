//! Session Gateway configuration.
//!
//! Configuration is loaded once from environment variables at process start
//! and shared read-only across requests. Secrets are held as `SecretString`
//! and redacted in Debug output.
//!
//! Missing secrets are not startup errors. The gate fails closed without a
//! PIN, and a missing signing key or room-service URL fails each request that
//! needs it with a configuration error. Malformed values that ARE present are
//! rejected at startup.

use common::secret::{is_blank, SecretString};
use std::collections::HashMap;
use std::env;
use std::fmt;
use thiserror::Error;

/// Default server bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default room name prefix.
pub const DEFAULT_ROOM_NAME_PREFIX: &str = "session";

/// Default agent dispatched into every new room.
pub const DEFAULT_AGENT_NAME: &str = "assistant";

/// Default seconds a room stays open with nobody in it.
pub const DEFAULT_EMPTY_TIMEOUT_SECONDS: u32 = 60;

/// Default room capacity (one participant plus the agent).
pub const DEFAULT_MAX_PARTICIPANTS: u32 = 2;

/// Default participant identity.
pub const DEFAULT_PARTICIPANT_IDENTITY: &str = "participant";

/// Default subject of the administrative credential.
pub const DEFAULT_SERVICE_IDENTITY: &str = "session-gateway";

/// Default administrative credential TTL in seconds.
pub const DEFAULT_ADMIN_TOKEN_TTL_SECONDS: u64 = 60;

/// Maximum administrative credential TTL in seconds.
pub const MAX_ADMIN_TOKEN_TTL_SECONDS: u64 = 600;

/// Default participant credential TTL in seconds.
pub const DEFAULT_PARTICIPANT_TOKEN_TTL_SECONDS: u64 = 3600;

/// Maximum participant credential TTL in seconds.
pub const MAX_PARTICIPANT_TOKEN_TTL_SECONDS: u64 = 86_400;

/// Default room-service request timeout in seconds.
pub const DEFAULT_ROOM_SERVICE_TIMEOUT_SECONDS: u64 = 10;

/// Session Gateway configuration.
#[derive(Clone)]
pub struct Config {
    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// Shared PIN gating session creation. `None` means the gate is closed.
    pub session_pin: Option<SecretString>,

    /// Room-service API key, used as the credential signing key id.
    pub api_key: Option<String>,

    /// Room-service API secret, used as the credential signing secret.
    pub api_secret: Option<SecretString>,

    /// Room-service base URL (http, https, ws or wss).
    pub room_service_url: Option<String>,

    /// Namespace prefix for generated room names.
    pub room_name_prefix: String,

    /// Agents dispatched into each room at creation, in order.
    pub agent_names: Vec<String>,

    /// Seconds an empty room is kept before the room service closes it.
    pub empty_timeout_seconds: u32,

    /// Room capacity. Always at least 1.
    pub max_participants: u32,

    /// Identity placed in the participant credential.
    pub participant_identity: String,

    /// Optional display name placed in the participant credential.
    pub participant_name: Option<String>,

    /// Identity placed in the administrative credential.
    pub service_identity: String,

    /// Administrative credential TTL in seconds.
    pub admin_token_ttl_seconds: u64,

    /// Participant credential TTL in seconds.
    pub participant_token_ttl_seconds: u64,

    /// Room-service request timeout in seconds.
    pub room_service_timeout_seconds: u64,

    /// Allowed CORS origin, `None` meaning any origin.
    pub cors_allow_origin: Option<String>,
}

/// Custom Debug implementation that redacts sensitive fields.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("session_pin", &self.session_pin.as_ref().map(|_| "[REDACTED]"))
            .field("api_key", &self.api_key)
            .field("api_secret", &self.api_secret.as_ref().map(|_| "[REDACTED]"))
            .field("room_service_url", &self.room_service_url)
            .field("room_name_prefix", &self.room_name_prefix)
            .field("agent_names", &self.agent_names)
            .field("empty_timeout_seconds", &self.empty_timeout_seconds)
            .field("max_participants", &self.max_participants)
            .field("participant_identity", &self.participant_identity)
            .field("participant_name", &self.participant_name)
            .field("service_identity", &self.service_identity)
            .field("admin_token_ttl_seconds", &self.admin_token_ttl_seconds)
            .field(
                "participant_token_ttl_seconds",
                &self.participant_token_ttl_seconds,
            )
            .field(
                "room_service_timeout_seconds",
                &self.room_service_timeout_seconds,
            )
            .field("cors_allow_origin", &self.cors_allow_origin)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid room service URL: {0}")]
    InvalidRoomServiceUrl(String),

    #[error("Invalid room configuration: {0}")]
    InvalidRoom(String),

    #[error("Invalid token TTL configuration: {0}")]
    InvalidTokenTtl(String),

    #[error("Invalid room service timeout configuration: {0}")]
    InvalidTimeout(String),

    #[error("Invalid identity configuration: {0}")]
    InvalidIdentity(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let session_pin = optional_secret(vars, "SESSION_PIN");
        let api_key = optional_value(vars, "ROOM_SERVICE_API_KEY");
        let api_secret = optional_secret(vars, "ROOM_SERVICE_API_SECRET");

        let room_service_url = optional_value(vars, "ROOM_SERVICE_URL");
        if let Some(url) = &room_service_url {
            validate_room_service_url(url)?;
        }

        let room_name_prefix = optional_value(vars, "ROOM_NAME_PREFIX")
            .unwrap_or_else(|| DEFAULT_ROOM_NAME_PREFIX.to_string());
        if !room_name_prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ConfigError::InvalidRoom(format!(
                "ROOM_NAME_PREFIX may only contain ASCII letters, digits, '-' and '_', got '{}'",
                room_name_prefix
            )));
        }

        // Explicitly empty AGENT_NAMES disables agent dispatch
        let agent_names = match vars.get("AGENT_NAMES") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(ToString::to_string)
                .collect(),
            None => vec![DEFAULT_AGENT_NAME.to_string()],
        };

        let empty_timeout_seconds = parse_number(
            vars,
            "ROOM_EMPTY_TIMEOUT_SECONDS",
            DEFAULT_EMPTY_TIMEOUT_SECONDS,
            ConfigError::InvalidRoom,
        )?;

        let max_participants = parse_number(
            vars,
            "ROOM_MAX_PARTICIPANTS",
            DEFAULT_MAX_PARTICIPANTS,
            ConfigError::InvalidRoom,
        )?;
        if max_participants == 0 {
            return Err(ConfigError::InvalidRoom(
                "ROOM_MAX_PARTICIPANTS must be greater than 0".to_string(),
            ));
        }

        let participant_identity = optional_value(vars, "PARTICIPANT_IDENTITY")
            .unwrap_or_else(|| DEFAULT_PARTICIPANT_IDENTITY.to_string());
        let participant_name = optional_value(vars, "PARTICIPANT_NAME");
        let service_identity = optional_value(vars, "SERVICE_IDENTITY")
            .unwrap_or_else(|| DEFAULT_SERVICE_IDENTITY.to_string());

        if participant_identity == service_identity {
            return Err(ConfigError::InvalidIdentity(
                "PARTICIPANT_IDENTITY must differ from SERVICE_IDENTITY".to_string(),
            ));
        }

        let admin_token_ttl_seconds = parse_ttl(
            vars,
            "ADMIN_TOKEN_TTL_SECONDS",
            DEFAULT_ADMIN_TOKEN_TTL_SECONDS,
            MAX_ADMIN_TOKEN_TTL_SECONDS,
        )?;

        let participant_token_ttl_seconds = parse_ttl(
            vars,
            "PARTICIPANT_TOKEN_TTL_SECONDS",
            DEFAULT_PARTICIPANT_TOKEN_TTL_SECONDS,
            MAX_PARTICIPANT_TOKEN_TTL_SECONDS,
        )?;

        let room_service_timeout_seconds = parse_number(
            vars,
            "ROOM_SERVICE_TIMEOUT_SECONDS",
            DEFAULT_ROOM_SERVICE_TIMEOUT_SECONDS,
            ConfigError::InvalidTimeout,
        )?;
        if room_service_timeout_seconds == 0 {
            return Err(ConfigError::InvalidTimeout(
                "ROOM_SERVICE_TIMEOUT_SECONDS must be greater than 0".to_string(),
            ));
        }

        let cors_allow_origin =
            optional_value(vars, "CORS_ALLOW_ORIGIN").filter(|origin| origin != "*");

        Ok(Config {
            bind_address,
            session_pin,
            api_key,
            api_secret,
            room_service_url,
            room_name_prefix,
            agent_names,
            empty_timeout_seconds,
            max_participants,
            participant_identity,
            participant_name,
            service_identity,
            admin_token_ttl_seconds,
            participant_token_ttl_seconds,
            room_service_timeout_seconds,
            cors_allow_origin,
        })
    }

    /// Names of required settings that are missing.
    ///
    /// Used at startup to log misconfiguration loudly; the service still
    /// starts and rejects affected requests.
    pub fn missing_settings(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.session_pin.is_none() {
            missing.push("SESSION_PIN");
        }
        if self.api_key.is_none() {
            missing.push("ROOM_SERVICE_API_KEY");
        }
        if self.api_secret.is_none() {
            missing.push("ROOM_SERVICE_API_SECRET");
        }
        if self.room_service_url.is_none() {
            missing.push("ROOM_SERVICE_URL");
        }
        missing
    }
}

/// Non-empty trimmed value, or `None`.
fn optional_value(vars: &HashMap<String, String>, name: &str) -> Option<String> {
    vars.get(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Non-blank secret, or `None`. Secrets are not trimmed.
fn optional_secret(vars: &HashMap<String, String>, name: &str) -> Option<SecretString> {
    vars.get(name)
        .map(|v| SecretString::from(v.as_str()))
        .filter(|s| !is_blank(s))
}

fn parse_number<T>(
    vars: &HashMap<String, String>,
    name: &str,
    default: T,
    error: fn(String) -> ConfigError,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match vars.get(name) {
        Some(value_str) => value_str.trim().parse().map_err(|e| {
            error(format!(
                "{} must be a valid non-negative integer, got '{}': {}",
                name, value_str, e
            ))
        }),
        None => Ok(default),
    }
}

fn parse_ttl(
    vars: &HashMap<String, String>,
    name: &str,
    default: u64,
    max: u64,
) -> Result<u64, ConfigError> {
    let value = parse_number(vars, name, default, ConfigError::InvalidTokenTtl)?;

    if value == 0 {
        return Err(ConfigError::InvalidTokenTtl(format!(
            "{} must be greater than 0",
            name
        )));
    }

    if value > max {
        return Err(ConfigError::InvalidTokenTtl(format!(
            "{} must not exceed {} seconds, got {}",
            name, max, value
        )));
    }

    Ok(value)
}

fn validate_room_service_url(url: &str) -> Result<(), ConfigError> {
    const SCHEMES: [&str; 4] = ["http://", "https://", "ws://", "wss://"];

    match SCHEMES.iter().find(|scheme| url.starts_with(*scheme)) {
        Some(scheme) if url.len() > scheme.len() => Ok(()),
        Some(_) => Err(ConfigError::InvalidRoomServiceUrl(
            "ROOM_SERVICE_URL has no host".to_string(),
        )),
        None => Err(ConfigError::InvalidRoomServiceUrl(format!(
            "ROOM_SERVICE_URL must use http, https, ws or wss, got '{}'",
            url
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use common::secret::ExposeSecret;

    fn full_vars() -> HashMap<String, String> {
        HashMap::from([
            ("SESSION_PIN".to_string(), "4242".to_string()),
            ("ROOM_SERVICE_API_KEY".to_string(), "APIkey123".to_string()),
            (
                "ROOM_SERVICE_API_SECRET".to_string(),
                "super-secret-signing-value".to_string(),
            ),
            (
                "ROOM_SERVICE_URL".to_string(),
                "https://rooms.example.com".to_string(),
            ),
        ])
    }

    #[test]
    fn test_from_vars_success_with_defaults() {
        let config = Config::from_vars(&HashMap::new()).expect("Config should load successfully");

        assert_eq!(config.bind_address, DEFAULT_BIND_ADDRESS);
        assert!(config.session_pin.is_none());
        assert!(config.api_key.is_none());
        assert!(config.api_secret.is_none());
        assert!(config.room_service_url.is_none());
        assert_eq!(config.room_name_prefix, DEFAULT_ROOM_NAME_PREFIX);
        assert_eq!(config.agent_names, vec![DEFAULT_AGENT_NAME.to_string()]);
        assert_eq!(config.empty_timeout_seconds, DEFAULT_EMPTY_TIMEOUT_SECONDS);
        assert_eq!(config.max_participants, DEFAULT_MAX_PARTICIPANTS);
        assert_eq!(config.participant_identity, DEFAULT_PARTICIPANT_IDENTITY);
        assert!(config.participant_name.is_none());
        assert_eq!(config.service_identity, DEFAULT_SERVICE_IDENTITY);
        assert_eq!(config.admin_token_ttl_seconds, 60);
        assert_eq!(config.participant_token_ttl_seconds, 3600);
        assert_eq!(config.room_service_timeout_seconds, 10);
        assert!(config.cors_allow_origin.is_none());
    }

    #[test]
    fn test_from_vars_success_with_custom_values() {
        let mut vars = full_vars();
        vars.insert("BIND_ADDRESS".to_string(), "127.0.0.1:9000".to_string());
        vars.insert("ROOM_NAME_PREFIX".to_string(), "claims-desk".to_string());
        vars.insert("AGENT_NAMES".to_string(), "triage, notes".to_string());
        vars.insert("ROOM_EMPTY_TIMEOUT_SECONDS".to_string(), "0".to_string());
        vars.insert("ROOM_MAX_PARTICIPANTS".to_string(), "5".to_string());
        vars.insert("PARTICIPANT_IDENTITY".to_string(), "operator".to_string());
        vars.insert("PARTICIPANT_NAME".to_string(), "Operator".to_string());
        vars.insert("ADMIN_TOKEN_TTL_SECONDS".to_string(), "30".to_string());
        vars.insert(
            "PARTICIPANT_TOKEN_TTL_SECONDS".to_string(),
            "7200".to_string(),
        );
        vars.insert("ROOM_SERVICE_TIMEOUT_SECONDS".to_string(), "3".to_string());
        vars.insert(
            "CORS_ALLOW_ORIGIN".to_string(),
            "https://app.example.com".to_string(),
        );

        let config = Config::from_vars(&vars).expect("Config should load successfully");

        assert_eq!(config.bind_address, "127.0.0.1:9000");
        assert_eq!(config.session_pin.unwrap().expose_secret(), "4242");
        assert_eq!(config.api_key.as_deref(), Some("APIkey123"));
        assert_eq!(
            config.room_service_url.as_deref(),
            Some("https://rooms.example.com")
        );
        assert_eq!(config.room_name_prefix, "claims-desk");
        assert_eq!(config.agent_names, vec!["triage", "notes"]);
        assert_eq!(config.empty_timeout_seconds, 0);
        assert_eq!(config.max_participants, 5);
        assert_eq!(config.participant_identity, "operator");
        assert_eq!(config.participant_name.as_deref(), Some("Operator"));
        assert_eq!(config.admin_token_ttl_seconds, 30);
        assert_eq!(config.participant_token_ttl_seconds, 7200);
        assert_eq!(config.room_service_timeout_seconds, 3);
        assert_eq!(
            config.cors_allow_origin.as_deref(),
            Some("https://app.example.com")
        );
    }

    #[test]
    fn test_blank_secrets_are_treated_as_unset() {
        let mut vars = full_vars();
        vars.insert("SESSION_PIN".to_string(), "".to_string());
        vars.insert("ROOM_SERVICE_API_SECRET".to_string(), "   ".to_string());
        vars.insert("ROOM_SERVICE_API_KEY".to_string(), " ".to_string());

        let config = Config::from_vars(&vars).unwrap();

        assert!(config.session_pin.is_none());
        assert!(config.api_secret.is_none());
        assert!(config.api_key.is_none());
        assert_eq!(
            config.missing_settings(),
            vec![
                "SESSION_PIN",
                "ROOM_SERVICE_API_KEY",
                "ROOM_SERVICE_API_SECRET"
            ]
        );
    }

    #[test]
    fn test_missing_settings_empty_when_fully_configured() {
        let config = Config::from_vars(&full_vars()).unwrap();
        assert!(config.missing_settings().is_empty());
    }

    #[test]
    fn test_empty_agent_names_disables_dispatch() {
        let mut vars = full_vars();
        vars.insert("AGENT_NAMES".to_string(), "".to_string());

        let config = Config::from_vars(&vars).unwrap();
        assert!(config.agent_names.is_empty());
    }

    #[test]
    fn test_room_service_url_accepts_websocket_scheme() {
        let mut vars = full_vars();
        vars.insert(
            "ROOM_SERVICE_URL".to_string(),
            "wss://rooms.example.com".to_string(),
        );

        assert!(Config::from_vars(&vars).is_ok());
    }

    #[test]
    fn test_room_service_url_rejects_other_schemes() {
        let mut vars = full_vars();
        vars.insert(
            "ROOM_SERVICE_URL".to_string(),
            "ftp://rooms.example.com".to_string(),
        );

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidRoomServiceUrl(msg)) if msg.contains("must use http"))
        );
    }

    #[test]
    fn test_room_service_url_rejects_missing_host() {
        let mut vars = full_vars();
        vars.insert("ROOM_SERVICE_URL".to_string(), "https://".to_string());

        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::InvalidRoomServiceUrl(_))));
    }

    #[test]
    fn test_max_participants_rejects_zero() {
        let mut vars = full_vars();
        vars.insert("ROOM_MAX_PARTICIPANTS".to_string(), "0".to_string());

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidRoom(msg)) if msg.contains("must be greater than 0"))
        );
    }

    #[test]
    fn test_empty_timeout_rejects_negative() {
        let mut vars = full_vars();
        vars.insert("ROOM_EMPTY_TIMEOUT_SECONDS".to_string(), "-5".to_string());

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidRoom(msg)) if msg.contains("must be a valid non-negative integer"))
        );
    }

    #[test]
    fn test_room_name_prefix_rejects_separators() {
        let mut vars = full_vars();
        vars.insert("ROOM_NAME_PREFIX".to_string(), "a/b".to_string());

        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::InvalidRoom(_))));
    }

    #[test]
    fn test_admin_ttl_rejects_zero() {
        let mut vars = full_vars();
        vars.insert("ADMIN_TOKEN_TTL_SECONDS".to_string(), "0".to_string());

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidTokenTtl(msg)) if msg.contains("must be greater than 0"))
        );
    }

    #[test]
    fn test_admin_ttl_rejects_too_large() {
        let mut vars = full_vars();
        vars.insert("ADMIN_TOKEN_TTL_SECONDS".to_string(), "601".to_string());

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidTokenTtl(msg)) if msg.contains("must not exceed 600"))
        );
    }

    #[test]
    fn test_participant_ttl_rejects_non_numeric() {
        let mut vars = full_vars();
        vars.insert(
            "PARTICIPANT_TOKEN_TTL_SECONDS".to_string(),
            "one-hour".to_string(),
        );

        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::InvalidTokenTtl(_))));
    }

    #[test]
    fn test_timeout_rejects_zero() {
        let mut vars = full_vars();
        vars.insert("ROOM_SERVICE_TIMEOUT_SECONDS".to_string(), "0".to_string());

        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::InvalidTimeout(_))));
    }

    #[test]
    fn test_identities_must_differ() {
        let mut vars = full_vars();
        vars.insert("PARTICIPANT_IDENTITY".to_string(), "gateway".to_string());
        vars.insert("SERVICE_IDENTITY".to_string(), "gateway".to_string());

        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::InvalidIdentity(_))));
    }

    #[test]
    fn test_wildcard_cors_origin_means_any() {
        let mut vars = full_vars();
        vars.insert("CORS_ALLOW_ORIGIN".to_string(), "*".to_string());

        let config = Config::from_vars(&vars).unwrap();
        assert!(config.cors_allow_origin.is_none());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = Config::from_vars(&full_vars()).unwrap();

        let debug_output = format!("{:?}", config);

        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("4242"));
        assert!(!debug_output.contains("super-secret-signing-value"));
        assert!(debug_output.contains("APIkey123"));
    }
}
