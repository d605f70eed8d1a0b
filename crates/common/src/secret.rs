//! Secret types for protecting sensitive values from accidental logging.
//!
//! This module re-exports types from the [`secrecy`] crate. Every value that
//! can authenticate a caller or mint a credential goes through these types:
//! the gate PIN, the room-service signing secret, and the short-lived
//! administrative token used for provisioning.
//!
//! `SecretString` implements `Debug` with redaction, so deriving `Debug` on a
//! struct that holds one cannot leak the value through `{:?}` or tracing
//! fields. Reading the value requires an explicit `expose_secret()` call,
//! which keeps every use site greppable.
//!
//! # Example
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct GateSettings {
//!     room_prefix: String,
//!     pin: SecretString,
//! }
//!
//! let settings = GateSettings {
//!     room_prefix: "session".to_string(),
//!     pin: SecretString::from("4242"),
//! };
//!
//! // The PIN is redacted in debug output
//! assert!(!format!("{settings:?}").contains("4242"));
//!
//! // Comparisons must go through expose_secret()
//! assert_eq!(settings.pin.expose_secret(), "4242");
//! ```
//!
//! # Usage Guidelines
//!
//! Use `SecretString` for:
//! - The session gate PIN
//! - Room-service API secrets (credential signing material)
//! - Bearer tokens that must never reach a client response
//!
//! A blank secret is treated as unset by configuration loading; see
//! [`is_blank`].

// Re-export the main types from secrecy
pub use secrecy::{ExposeSecret, SecretString};

/// Returns `true` when the secret is empty or whitespace only.
///
/// Blank secrets are never usable: a blank gate PIN would let an empty PIN
/// through, and a blank signing secret produces forgeable credentials.
#[must_use]
pub fn is_blank(secret: &SecretString) -> bool {
    secret.expose_secret().trim().is_empty()
}
