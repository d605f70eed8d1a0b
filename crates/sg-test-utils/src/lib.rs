//! # Session Gateway Test Utilities
//!
//! This crate provides:
//! - Server test harness (`TestGatewayServer` for E2E tests)
//! - Remote room service double (`MockRoomService`, backed by wiremock)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sg_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> Result<(), anyhow::Error> {
//!     let rooms = MockRoomService::accepting().await;
//!     let server = TestGatewayServer::spawn(&rooms.url()).await?;
//!
//!     let response = reqwest::Client::new()
//!         .post(format!("{}/api/v1/session", server.url()))
//!         .json(&serde_json::json!({ "pin": TEST_PIN }))
//!         .send()
//!         .await?;
//!
//!     assert_eq!(response.status(), 200);
//!     Ok(())
//! }
//! ```

pub mod mock_room_service;
pub mod server_harness;

// Re-export commonly used items
pub use mock_room_service::*;
pub use server_harness::*;
