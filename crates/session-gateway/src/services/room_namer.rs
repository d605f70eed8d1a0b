//! Room name generation.
//!
//! Names have the form `{prefix}-{unix_seconds}-{suffix}` where `suffix` is
//! 8 lowercase hex characters (32 bits) from the system CSPRNG. The
//! timestamp alone is second-resolution, so two sessions started in the same
//! second share it; the suffix makes a same-second collision happen with
//! probability 2^-32 per pair.

use crate::errors::GatewayError;
use chrono::{DateTime, Utc};
use ring::rand::{SecureRandom, SystemRandom};

/// Random bytes appended to each room name.
const SUFFIX_BYTES: usize = 4;

/// Generates room names under a fixed namespace prefix.
#[derive(Clone)]
pub struct RoomNamer {
    prefix: String,
    rng: SystemRandom,
}

impl RoomNamer {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            rng: SystemRandom::new(),
        }
    }

    /// Generate a name for a session starting now.
    pub fn generate(&self) -> Result<String, GatewayError> {
        self.generate_at(Utc::now())
    }

    /// Generate a name for a session starting at `now`.
    pub fn generate_at(&self, now: DateTime<Utc>) -> Result<String, GatewayError> {
        let mut suffix = [0u8; SUFFIX_BYTES];

        self.rng.fill(&mut suffix).map_err(|_| {
            tracing::error!(target: "sg.services.room_namer", "Failed to generate random bytes");
            GatewayError::Internal
        })?;

        Ok(format!(
            "{}-{}-{}",
            self.prefix,
            now.timestamp(),
            hex::encode(suffix)
        ))
    }
}
