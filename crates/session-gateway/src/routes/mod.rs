//! HTTP routes for Session Gateway.
//!
//! Defines the Axum router and application state.

use crate::config::Config;
use crate::handlers;
use crate::middleware::http_metrics_middleware;
use crate::services::SessionOrchestrator;
use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Arc<Config>,

    /// Session flow, shared by all requests.
    pub orchestrator: Arc<SessionOrchestrator>,
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `POST /api/v1/session` - PIN-gated session creation
/// - `/health` - Liveness check
/// - `/metrics` - Prometheus metrics endpoint, public and unversioned
/// - CORS for browser callers
/// - TraceLayer for request logging
/// - 30 second request timeout
/// - HTTP metrics middleware
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let cors = cors_layer(&state.config);

    let api_routes = Router::new()
        .route("/api/v1/session", post(handlers::create_session))
        .route("/health", get(handlers::health_check))
        .with_state(state);

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    // Layer order (bottom-to-top execution):
    // 1. CorsLayer - Answer preflight and tag responses (innermost)
    // 2. TraceLayer - Log request details
    // 3. TimeoutLayer - Bound total request time
    // 4. http_metrics_middleware - Record ALL responses (outermost)
    api_routes
        .merge(metrics_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(middleware::from_fn(http_metrics_middleware))
}

/// CORS policy: any origin unless one is configured.
fn cors_layer(config: &Config) -> CorsLayer {
    let allow_origin = match config
        .cors_allow_origin
        .as_deref()
        .and_then(|origin| HeaderValue::from_str(origin).ok())
    {
        Some(origin) => AllowOrigin::exact(origin),
        None => AllowOrigin::from(Any),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::POST, Method::GET])
        .allow_headers([header::CONTENT_TYPE])
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::services::room_provisioner::mock::MockRoomProvisioner;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::collections::HashMap;
    use tower::ServiceExt;

    fn test_app(vars: &[(&str, &str)]) -> (Router, Arc<MockRoomProvisioner>) {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        let config = Arc::new(Config::from_vars(&vars).unwrap());
        let mock = Arc::new(MockRoomProvisioner::accepting());
        let orchestrator = Arc::new(SessionOrchestrator::new(
            config.clone(),
            Some(mock.clone()),
        ));
        let state = Arc::new(AppState {
            config,
            orchestrator,
        });
        let handle = PrometheusBuilder::new().build_recorder().handle();
        (build_routes(state, handle), mock)
    }

    fn configured() -> Vec<(&'static str, &'static str)> {
        vec![
            ("SESSION_PIN", "4242"),
            ("ROOM_SERVICE_API_KEY", "APIkey123"),
            ("ROOM_SERVICE_API_SECRET", "routes-test-secret-0123456789"),
            ("ROOM_SERVICE_URL", "https://rooms.example.com"),
        ]
    }

    fn session_request(body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/session")
            .header("content-type", "application/json")
            .header("origin", "https://app.example.com")
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_app_state_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }

    #[tokio::test]
    async fn test_session_route_success() {
        let (app, mock) = test_app(&configured());

        let response = app
            .oneshot(session_request(r#"{"pin":"4242"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .unwrap(),
            "*"
        );
        let json = body_json(response).await;
        assert_eq!(json["ws_url"], "wss://rooms.example.com");
        assert_eq!(json["token"].as_str().unwrap().split('.').count(), 3);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_session_route_wrong_pin() {
        let (app, mock) = test_app(&configured());

        let response = app
            .oneshot(session_request(r#"{"pin":"0000"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(response).await["error"], "Wrong PIN");
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_session_route_bad_body() {
        let (app, _mock) = test_app(&configured());

        let response = app.oneshot(session_request("")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Invalid request body");
    }

    #[tokio::test]
    async fn test_session_route_oversized_body_is_json_error() {
        let (app, mock) = test_app(&configured());

        // Past axum's default 2 MB body limit
        let body = format!(r#"{{"pin":"{}"}}"#, "4".repeat(3 * 1024 * 1024));
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/session")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/json"
        );
        assert_eq!(body_json(response).await["error"], "Invalid request body");
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let (app, _mock) = test_app(&configured());

        let request = Request::builder()
            .method("OPTIONS")
            .uri("/api/v1/session")
            .header("origin", "https://app.example.com")
            .header("access-control-request-method", "POST")
            .header("access-control-request-headers", "content-type")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_configured_cors_origin() {
        let mut vars = configured();
        vars.push(("CORS_ALLOW_ORIGIN", "https://app.example.com"));
        let (app, _mock) = test_app(&vars);

        let response = app
            .oneshot(session_request(r#"{"pin":"4242"}"#))
            .await
            .unwrap();

        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .unwrap(),
            "https://app.example.com"
        );
    }

    #[tokio::test]
    async fn test_health_route() {
        let (app, _mock) = test_app(&configured());

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "healthy");
    }
}
