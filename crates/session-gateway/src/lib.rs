//! Session Gateway Service Library
//!
//! A stateless HTTP service that turns a PIN into a live media session:
//!
//! - Verifies a caller-supplied PIN against a shared secret
//! - Creates a uniquely named room on a remote room service, with an agent
//!   dispatched into it
//! - Returns a participant credential scoped to that room
//!
//! # Architecture
//!
//! ```text
//! routes/mod.rs -> handlers/*.rs -> services/session_orchestrator.rs
//!                                       |-> pin_gate
//!                                       |-> room_namer
//!                                       |-> credential_issuer
//!                                       `-> room_provisioner -> remote room service
//! ```
//!
//! # Modules
//!
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - HTTP metrics middleware
//! - `models` - Request/response bodies and room descriptor
//! - `observability` - Prometheus metrics
//! - `routes` - Axum router setup
//! - `services` - Session flow and its collaborators

pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod routes;
pub mod services;
