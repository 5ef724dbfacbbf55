// SPDX-FileCopyrightText: 2026 Mockview Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{delete, get, post},
};
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use mockview_config::model::{MockviewConfig, ServerConfig};
use mockview_core::MockviewError;
use mockview_interview::Coordinator;

use crate::connections::ConnectionManager;
use crate::handlers;
use crate::ws;

/// Room for multipart boundaries and the small text fields next to the audio part.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub coordinator: Arc<Coordinator>,
    pub connections: Arc<ConnectionManager>,
    /// Include error debug output in responses.
    pub debug: bool,
    /// Process start time for uptime calculation.
    pub started: Instant,
    /// Largest accepted audio upload.
    pub max_upload_bytes: usize,
}

impl GatewayState {
    pub fn new(
        coordinator: Arc<Coordinator>,
        connections: Arc<ConnectionManager>,
        config: &MockviewConfig,
    ) -> Self {
        Self {
            coordinator,
            connections,
            debug: config.server.debug,
            started: Instant::now(),
            max_upload_bytes: config.audio.max_size_bytes,
        }
    }
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origin = if allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
}

/// Builds the gateway router.
///
/// Routes:
/// - GET /health
/// - /api/v1/health, /api/v1/interview/..., /api/v1/ws/...
pub fn build_router(state: GatewayState, allowed_origins: &[String]) -> Router {
    let body_limit = state.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

    let api_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .route("/interview/start", post(handlers::start_interview))
        .route("/interview/{id}", delete(handlers::reset_interview))
        .route("/interview/{id}/status", get(handlers::get_status))
        .route("/interview/{id}/question", get(handlers::get_question))
        .route("/interview/{id}/answer", post(handlers::submit_answer))
        .route("/interview/{id}/audio", post(handlers::submit_audio))
        .route("/interview/{id}/transcribe", post(handlers::transcribe))
        .route("/interview/{id}/follow-up", post(handlers::request_follow_up))
        .route("/interview/{id}/next", post(handlers::next_question))
        .route("/interview/{id}/complete", post(handlers::complete_interview))
        .route("/interview/{id}/report", post(handlers::generate_report))
        .route("/ws", get(ws::ws_handler))
        .route("/ws/stats", get(handlers::get_ws_stats))
        .route("/ws/connections", get(handlers::get_ws_connections))
        .route("/ws/{id}", get(ws::ws_session_handler));

    Router::new()
        .route("/health", get(handlers::get_health))
        .nest("/api/v1", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(allowed_origins))
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}

/// Start the gateway HTTP/WebSocket server.
///
/// Serves until `shutdown` is cancelled, then drains in-flight requests.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), MockviewError> {
    let app = build_router(state, &config.allowed_origins);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| MockviewError::Config(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!(environment = %config.environment, "gateway listening on {addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move { shutdown.cancelled().await })
    .await
    .map_err(|e| MockviewError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("gateway stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use mockview_test_utils::TestHarness;

    fn router(harness: &TestHarness) -> Router {
        let state = GatewayState::new(
            harness.coordinator.clone(),
            Arc::new(ConnectionManager::new()),
            &harness.config,
        );
        build_router(state, &["http://localhost:3000".to_string()])
    }

    async fn call(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn health_is_served_at_both_paths() {
        let harness = TestHarness::builder().build().unwrap();
        for path in ["/health", "/api/v1/health"] {
            let (status, body) = call(router(&harness), get_request(path)).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["status"], "success");
            assert_eq!(body["data"]["status"], "healthy");
            assert_eq!(body["data"]["active_connections"], 0);
        }
    }

    #[tokio::test]
    async fn start_then_answer() {
        let harness = TestHarness::builder().build().unwrap();

        let (status, body) = call(
            router(&harness),
            post_json("/api/v1/interview/start", r#"{"session_id":"web-1","style":"casual"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["session_id"], "web-1");
        assert_eq!(body["data"]["style"], "casual");
        assert_eq!(body["data"]["question_index"], 0);

        let (status, body) = call(
            router(&harness),
            post_json("/api/v1/interview/web-1/answer", r#"{"answer":"I wrote a parser in Rust."}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["action"], "next_question");
        assert_eq!(body["data"]["question_index"], 1);
    }

    #[tokio::test]
    async fn start_without_body_uses_defaults() {
        let harness = TestHarness::builder().build().unwrap();
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/interview/start")
            .body(Body::empty())
            .unwrap();
        let (status, body) = call(router(&harness), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["style"], "formal");
        assert_eq!(body["data"]["resumed"], false);
    }

    #[tokio::test]
    async fn unknown_session_is_404_envelope() {
        let harness = TestHarness::builder().build().unwrap();
        let (status, body) = call(router(&harness), get_request("/api/v1/interview/nope/status")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], "error");
        assert_eq!(body["error_code"], "session_not_found");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn malformed_json_is_400() {
        let harness = TestHarness::builder().build().unwrap();
        let sid = harness.start().await;
        let (status, body) = call(
            router(&harness),
            post_json(&format!("/api/v1/interview/{sid}/answer"), "{not json"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_code"], "validation_error");
    }

    #[tokio::test]
    async fn report_without_history_is_409() {
        let harness = TestHarness::builder().build().unwrap();
        let sid = harness.start().await;
        let (status, body) = call(
            router(&harness),
            post_json(&format!("/api/v1/interview/{sid}/report"), "{}"),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error_code"], "no_history");
    }

    #[tokio::test]
    async fn multipart_audio_turn() {
        let harness = TestHarness::builder().build().unwrap();
        let sid = harness.start().await;

        let boundary = "mockview-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"audio\"; filename=\"answer.mp3\"\r\nContent-Type: audio/mpeg\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(&[7u8; 128]);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        let request = Request::builder()
            .method("POST")
            .uri(format!("/api/v1/interview/{sid}/audio"))
            .header("content-type", format!("multipart/form-data; boundary={boundary}"))
            .body(Body::from(body))
            .unwrap();
        let (status, body) = call(router(&harness), request).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["data"]["input_type"], "audio");
        assert_eq!(body["data"]["user_input"], "This is a mock transcript.");

        let requests = harness.transcriber.requests();
        assert_eq!(requests[0].format, mockview_core::types::AudioFormat::Mp3);
    }

    #[tokio::test]
    async fn reset_then_status_is_404() {
        let harness = TestHarness::builder().build().unwrap();
        let sid = harness.start().await;

        let request = Request::builder()
            .method("DELETE")
            .uri(format!("/api/v1/interview/{sid}"))
            .body(Body::empty())
            .unwrap();
        let (status, _) = call(router(&harness), request).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = call(router(&harness), get_request(&format!("/api/v1/interview/{sid}/status"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn ws_stats_start_empty() {
        let harness = TestHarness::builder().build().unwrap();
        let (status, body) = call(router(&harness), get_request("/api/v1/ws/stats")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["total_connections"], 0);

        let (_, body) = call(router(&harness), get_request("/api/v1/ws/connections")).await;
        assert_eq!(body["data"], serde_json::json!([]));
    }
}
