//! Test server harness for E2E testing
//!
//! Provides `TestGatewayServer` for spawning real gateway instances in tests.

use session_gateway::config::Config;
use session_gateway::observability::metrics::init_metrics_recorder;
use session_gateway::routes::{self, AppState};
use session_gateway::services::SessionOrchestrator;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use tokio::task::JoinHandle;

/// PIN configured on servers spawned with [`TestGatewayServer::spawn`].
pub const TEST_PIN: &str = "4242";

/// Signing key id configured on test servers.
pub const TEST_API_KEY: &str = "APItestkey";

/// Signing secret configured on test servers.
pub const TEST_API_SECRET: &str = "sg-test-utils-signing-secret-0123456789";

static TEST_METRICS_HANDLE: OnceLock<metrics_exporter_prometheus::PrometheusHandle> =
    OnceLock::new();

/// Process-wide metrics handle.
///
/// The first server installs the global recorder; if another test already
/// did, a standalone recorder is used instead.
fn test_metrics_handle() -> metrics_exporter_prometheus::PrometheusHandle {
    TEST_METRICS_HANDLE
        .get_or_init(|| {
            init_metrics_recorder().unwrap_or_else(|_| {
                metrics_exporter_prometheus::PrometheusBuilder::new()
                    .build_recorder()
                    .handle()
            })
        })
        .clone()
}

/// Environment for a fully configured gateway pointing at `room_service_url`.
pub fn test_vars(room_service_url: &str) -> HashMap<String, String> {
    HashMap::from([
        ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
        ("SESSION_PIN".to_string(), TEST_PIN.to_string()),
        ("ROOM_SERVICE_API_KEY".to_string(), TEST_API_KEY.to_string()),
        (
            "ROOM_SERVICE_API_SECRET".to_string(),
            TEST_API_SECRET.to_string(),
        ),
        (
            "ROOM_SERVICE_URL".to_string(),
            room_service_url.to_string(),
        ),
        ("ROOM_SERVICE_TIMEOUT_SECONDS".to_string(), "2".to_string()),
    ])
}

/// Test harness for spawning the Session Gateway in E2E tests.
///
/// # Example
/// ```rust,ignore
/// let rooms = MockRoomService::accepting().await;
/// let server = TestGatewayServer::spawn(&rooms.url()).await?;
///
/// let response = reqwest::get(format!("{}/health", server.url())).await?;
/// assert_eq!(response.status(), 200);
/// ```
pub struct TestGatewayServer {
    addr: SocketAddr,
    config: Arc<Config>,
    _handle: JoinHandle<()>,
}

impl TestGatewayServer {
    /// Spawn a fully configured server talking to `room_service_url`.
    pub async fn spawn(room_service_url: &str) -> Result<Self, anyhow::Error> {
        Self::spawn_with_vars(&test_vars(room_service_url)).await
    }

    /// Spawn a server configured from `vars`.
    ///
    /// The server will:
    /// - Bind to a random available port (127.0.0.1:0)
    /// - Use the real route builder and an HTTP room provisioner
    /// - Start the HTTP server in the background
    pub async fn spawn_with_vars(vars: &HashMap<String, String>) -> Result<Self, anyhow::Error> {
        let config = Arc::new(
            Config::from_vars(vars)
                .map_err(|e| anyhow::anyhow!("Failed to create test config: {}", e))?,
        );

        let orchestrator = SessionOrchestrator::from_config(config.clone())
            .map_err(|e| anyhow::anyhow!("Failed to create orchestrator: {}", e))?;

        let state = Arc::new(AppState {
            config: config.clone(),
            orchestrator: Arc::new(orchestrator),
        });

        let app = routes::build_routes(state, test_metrics_handle());

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
            if let Err(e) = axum::serve(listener, make_service).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            config,
            _handle: handle,
        })
    }

    /// Get the base URL of the test server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the socket address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get the configuration the server was started with
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Drop for TestGatewayServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockRoomService;

    #[tokio::test]
    async fn test_server_spawns_successfully() -> Result<(), anyhow::Error> {
        let rooms = MockRoomService::accepting().await;
        let server = TestGatewayServer::spawn(&rooms.url()).await?;

        assert!(server.url().starts_with("http://127.0.0.1:"));
        assert!(server.addr().ip().is_loopback());
        assert_eq!(server.config().room_service_url.as_deref(), Some(rooms.url().as_str()));

        let response = reqwest::get(format!("{}/health", server.url())).await?;
        assert_eq!(response.status(), 200);

        let body: serde_json::Value = response.json().await?;
        assert_eq!(body["status"], "healthy");

        Ok(())
    }
}
