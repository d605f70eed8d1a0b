//! Common types shared across Session Gateway crates.

#![warn(clippy::pedantic)]

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for room credential claims (grant flags, wire layout)
pub mod credential;
