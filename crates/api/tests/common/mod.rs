//! Shared harness for HTTP-level integration tests.
//!
//! Builds the production router (same middleware stack as `main.rs`)
//! over a test database pool and a scripted completion backend, so tests
//! exercise the full request path without a live generation service.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use sceneforge_core::decision::TargetStrategy;
use sqlx::PgPool;
use tower::ServiceExt;

use sceneforge_api::config::ServerConfig;
use sceneforge_api::router::build_app_router;
use sceneforge_api::state::AppState;
use sceneforge_engine::{Orchestrator, OrchestratorConfig};
use sceneforge_events::EventBus;
use sceneforge_genai::{BackendError, ChatMessage, CompletionBackend};

/// Replays a fixed sequence of completion responses.
pub struct ScriptedBackend {
    responses: Mutex<VecDeque<String>>,
}

impl ScriptedBackend {
    pub fn replying<I, S>(responses: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
        })
    }

    pub fn empty() -> Arc<Self> {
        Self::replying(Vec::<String>::new())
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, BackendError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| BackendError::Malformed("script exhausted".to_string()))
    }
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        genai_base_url: "http://localhost:1".to_string(),
        genai_api_key: "test-key".to_string(),
        genai_model: "test-model".to_string(),
        message_limit: 12,
        target_strategy: TargetStrategy::MostRecentCreated,
        confidence_floor: 0.35,
    }
}

/// Build the full application router over the given pool and backend.
pub fn build_test_app(pool: PgPool, backend: Arc<ScriptedBackend>) -> Router {
    let config = test_config();
    let event_bus = Arc::new(EventBus::default());

    let orchestrator = Arc::new(Orchestrator::new(
        pool.clone(),
        backend,
        Arc::clone(&event_bus),
        OrchestratorConfig::default(),
    ));

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        orchestrator,
        event_bus,
    };

    build_app_router(state, &config)
}

/// GET a path and return the raw response.
pub async fn get(app: Router, path: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(path)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// POST a JSON body to a path and return the raw response.
pub async fn post_json(app: Router, path: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Collect a response body into JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Assert a status and return the body JSON in one step.
pub async fn expect_json(response: Response<Body>, status: StatusCode) -> serde_json::Value {
    assert_eq!(response.status(), status);
    body_json(response).await
}
