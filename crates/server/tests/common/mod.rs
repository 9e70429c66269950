//! Common test utilities for API testing with mocks.
//!
//! Builds the full router in-process with an in-memory-ish SQLite
//! database and a recording broker, so tests exercise the real handlers
//! without a listening socket or external queue infrastructure.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use recap_core::{
    create_authenticator, testing::MockBroker, AuthConfig, AuthMethod, Config, DatabaseConfig,
    LiveConfig, MemoryStatusCache, OrchestratorConfig, PipelineOrchestrator, ServerConfig,
    SqliteProjectStore, SqliteTaskStore, StatusCache, WorkBroker,
};
use recap_server::api::create_router;
use recap_server::state::AppState;

/// Re-export fixtures for test convenience
#[allow(unused_imports)]
pub use recap_core::testing::fixtures;

/// In-process server plus handles to the collaborators tests poke at.
pub struct TestFixture {
    pub router: Router,
    /// Recording broker: every dispatched work order lands here.
    pub broker: Arc<MockBroker>,
    /// Orchestrator handle, for driving worker events directly.
    pub orchestrator: Arc<PipelineOrchestrator>,
    /// Status cache shared with the handlers.
    pub cache: Arc<dyn StatusCache>,
    /// Temporary directory holding the test database.
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture. Auth is disabled; every request acts
    /// as the anonymous user.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let config = Config {
            auth: AuthConfig {
                method: AuthMethod::None,
                api_key: None,
            },
            server: ServerConfig::default(),
            database: DatabaseConfig {
                path: db_path.clone(),
            },
            orchestrator: OrchestratorConfig::default(),
            live: LiveConfig::default(),
        };

        let authenticator: Arc<dyn recap_core::Authenticator> =
            Arc::from(create_authenticator(&config.auth).expect("Failed to create authenticator"));
        let projects = Arc::new(
            SqliteProjectStore::new(&db_path).expect("Failed to create project store"),
        );
        let tasks = Arc::new(SqliteTaskStore::new(&db_path).expect("Failed to create task store"));
        let cache: Arc<dyn StatusCache> = Arc::new(MemoryStatusCache::new());
        let broker = Arc::new(MockBroker::new());

        let orchestrator = Arc::new(PipelineOrchestrator::new(
            config.orchestrator.clone(),
            tasks.clone(),
            cache.clone(),
            Arc::clone(&broker) as Arc<dyn WorkBroker>,
        ));

        let state = Arc::new(AppState::new(
            config,
            authenticator,
            projects,
            tasks,
            cache.clone(),
            orchestrator.clone(),
        ));

        Self {
            router: create_router(state),
            broker,
            orchestrator,
            cache,
            temp_dir,
        }
    }

    /// Create a project and return its id.
    pub async fn create_project(&self, name: &str) -> String {
        let response = self
            .post("/api/v1/projects", json!({ "name": name }))
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body["id"]
            .as_str()
            .expect("project id in response")
            .to_string()
    }

    /// Register a video origin file on a project.
    pub async fn attach_video_origin(&self, project_id: &str) {
        let response = self
            .post(
                &format!("/api/v1/projects/{}/files", project_id),
                json!({
                    "slot": "origin",
                    "file": { "id": "f-origin", "name": "recording.mp4", "category": "video" }
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a PATCH request with JSON body.
    pub async fn patch(&self, path: &str, body: Value) -> TestResponse {
        self.request("PATCH", path, Some(body)).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
