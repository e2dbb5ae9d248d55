//! Shared bootstrap for the API integration tests.
//!
//! Every test gets a fresh in-memory database, a credential pool pointed at
//! a local vision-API stand-in, and the full router boxed as a cloneable
//! service so requests go through the same middleware stack as production.

use std::convert::Infallible;
use std::sync::{Arc, Once};
use std::time::Duration;

use ai::ModelRotator;
use api::auth::generate_jwt;
use api::routes::routes;
use axum::{Router, body::Body, http::Request, response::Response};
use sea_orm::DatabaseConnection;
use tower::ServiceExt;
use tower::util::BoxCloneService;
use util::config::AppConfig;
use util::state::AppState;

use crate::helpers::gemini_mock::GeminiMock;

static ENV_INIT: Once = Once::new();

/// Seeds the process environment the config loader requires, once.
///
/// `AppConfig::from_env` insists on a database path, a storage root, and a
/// JWT secret; everything a test actually cares about is overridden through
/// the per-field setters afterwards.
pub fn init_test_env() {
    ENV_INIT.call_once(|| {
        let storage = std::env::temp_dir().join("scriptmark-test-storage");
        unsafe {
            std::env::set_var("DATABASE_PATH", "sqlite::memory:");
            std::env::set_var("STORAGE_ROOT", &storage);
            std::env::set_var("JWT_SECRET", "integration-test-secret");
            std::env::set_var("JWT_DURATION_MINUTES", "60");
        }
    });
}

/// Points the storage root at a fresh temp directory and returns its guard.
/// Hold the guard for the test's lifetime; the directory is removed on drop.
pub fn temp_storage() -> tempfile::TempDir {
    init_test_env();
    let dir = tempfile::tempdir().expect("Failed to create temp storage root");
    AppConfig::set_storage_root(dir.path().to_string_lossy());
    dir
}

/// Application state backed by a migrated in-memory database and a one-key
/// credential pool aimed at the given mock server.
pub async fn make_test_state(mock: &GeminiMock) -> AppState {
    init_test_env();
    let db = db::test_utils::setup_test_db().await;
    state_for(db, mock)
}

/// Same as [`make_test_state`] but reusing an existing connection, for tests
/// that seed rows before building the app.
pub fn state_for(db: DatabaseConnection, mock: &GeminiMock) -> AppState {
    init_test_env();
    let rotator = ModelRotator::from_credentials(
        vec!["test-key".to_string()],
        15,
        "test-model",
        mock.base_url(),
        Duration::from_secs(5),
    )
    .expect("Failed to build test rotator");

    AppState::new(db, Arc::new(rotator))
}

/// The full `/api` router as a cloneable oneshot service.
pub fn make_test_app(state: AppState) -> BoxCloneService<Request<Body>, Response, Infallible> {
    let router = Router::new()
        .nest("/api", routes(state.clone()))
        .with_state(state);

    router.into_service().boxed_clone()
}

/// `Authorization` header value for a seeded user.
pub fn bearer_for(user: &db::models::user::Model) -> String {
    init_test_env();
    let (token, _) = generate_jwt(user.id, user.professor);
    format!("Bearer {token}")
}

/// Reads a response body as JSON.
pub async fn json_body(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    serde_json::from_slice(&bytes).expect("Response body is not JSON")
}

/// Hand-rolled `multipart/form-data` body builder for upload tests.
pub struct MultipartBuilder {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartBuilder {
    pub fn new() -> Self {
        Self {
            boundary: "test-boundary-7MA4YWxkTrZu0gW".to_string(),
            body: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, filename: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"; \
                 filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// Returns the `Content-Type` header value and the finished body.
    pub fn build(mut self) -> (String, Vec<u8>) {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        (
            format!("multipart/form-data; boundary={}", self.boundary),
            self.body,
        )
    }
}
