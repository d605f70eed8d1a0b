//! Service layer for Session Gateway.
//!
//! # Components
//!
//! - `pin_gate` - Constant-time PIN check
//! - `room_namer` - Collision-resistant room names
//! - `credential_issuer` - Signed room credentials
//! - `room_provisioner` - HTTP client for the remote room service
//! - `session_orchestrator` - End-to-end session flow

pub mod credential_issuer;
pub mod pin_gate;
pub mod room_namer;
pub mod room_provisioner;
pub mod session_orchestrator;

pub use room_provisioner::{HttpRoomProvisioner, RoomProvisioner};
pub use session_orchestrator::SessionOrchestrator;
