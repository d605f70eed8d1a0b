//! Remote room service double.
//!
//! Serves the `CreateRoom` endpoint on a local wiremock server and records
//! every call for later inspection.

use session_gateway::services::room_provisioner::CREATE_ROOM_PATH;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Answers `CreateRoom` by echoing the requested room name back.
struct EchoRoom;

impl Respond for EchoRoom {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let name = serde_json::from_slice::<serde_json::Value>(&request.body)
            .ok()
            .and_then(|body| body.get("name").cloned())
            .unwrap_or(serde_json::Value::Null);

        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "sid": "RM_test",
            "name": name,
            "empty_timeout": 60,
            "max_participants": 2,
        }))
    }
}

/// A running room service double.
pub struct MockRoomService {
    server: MockServer,
}

impl MockRoomService {
    /// Room service that creates every requested room.
    pub async fn accepting() -> Self {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(CREATE_ROOM_PATH))
            .respond_with(EchoRoom)
            .mount(&server)
            .await;

        Self { server }
    }

    /// Room service that answers every `CreateRoom` with `status`.
    pub async fn failing(status: u16) -> Self {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(CREATE_ROOM_PATH))
            .respond_with(ResponseTemplate::new(status).set_body_string("room service failure"))
            .mount(&server)
            .await;

        Self { server }
    }

    /// Base URL to put in `ROOM_SERVICE_URL`.
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// All `CreateRoom` requests received so far.
    pub async fn create_room_requests(&self) -> Vec<Request> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.url.path() == CREATE_ROOM_PATH)
            .collect()
    }

    /// JSON bodies of the `CreateRoom` requests received so far.
    pub async fn create_room_bodies(&self) -> Vec<serde_json::Value> {
        self.create_room_requests()
            .await
            .iter()
            .map(|r| serde_json::from_slice(&r.body).expect("CreateRoom body should be JSON"))
            .collect()
    }

    /// Bearer tokens presented on `CreateRoom` requests, in order.
    pub async fn bearer_tokens(&self) -> Vec<String> {
        self.create_room_requests()
            .await
            .iter()
            .filter_map(|r| {
                r.headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.strip_prefix("Bearer "))
                    .map(ToString::to_string)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_accepting_echoes_room_name() {
        let rooms = MockRoomService::accepting().await;

        let response = reqwest::Client::new()
            .post(format!("{}{}", rooms.url(), CREATE_ROOM_PATH))
            .json(&serde_json::json!({ "name": "session-1" }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["name"], "session-1");
        assert_eq!(rooms.create_room_bodies().await.len(), 1);
    }

    #[tokio::test]
    async fn test_failing_returns_status() {
        let rooms = MockRoomService::failing(503).await;

        let response = reqwest::Client::new()
            .post(format!("{}{}", rooms.url(), CREATE_ROOM_PATH))
            .header("authorization", "Bearer a.b.c")
            .json(&serde_json::json!({ "name": "session-1" }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 503);
        assert_eq!(rooms.bearer_tokens().await, vec!["a.b.c".to_string()]);
    }
}
