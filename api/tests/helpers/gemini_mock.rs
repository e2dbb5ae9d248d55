//! Local stand-in for the vision API.
//!
//! Binds an ephemeral port and answers the two endpoints the transport
//! layer calls: the raw file upload and `generateContent`. Every call is
//! recorded so tests can assert how often the model was actually consulted;
//! generate replies play back from a scripted queue, and uploads whose
//! `X-Goog-File-Name` contains a configured marker fail with a 500 to
//! exercise per-item error paths.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::{Value, json};
use tokio::task::JoinHandle;

#[derive(Default)]
struct MockState {
    uploads: Mutex<Vec<String>>,
    prompts: Mutex<Vec<String>>,
    replies: Mutex<VecDeque<String>>,
    fail_marker: Mutex<Option<String>>,
}

pub struct GeminiMock {
    base_url: String,
    state: Arc<MockState>,
    server: JoinHandle<()>,
}

impl GeminiMock {
    /// Starts the mock server on an ephemeral localhost port.
    pub async fn spawn() -> Self {
        let state = Arc::new(MockState::default());
        let router = Router::new()
            .route("/upload/v1beta/files", post(upload))
            .route("/v1beta/models/{model}", post(generate))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock listener");
        let addr = listener.local_addr().expect("Mock listener has no address");
        let server = tokio::spawn(async move {
            axum::serve(listener, router)
                .await
                .expect("Mock server crashed");
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
            server,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Queues the next `generateContent` reply. Replies play back in call
    /// order; an empty queue answers with a bare `"OK"`.
    pub fn push_reply(&self, reply: impl Into<String>) {
        self.state.replies.lock().unwrap().push_back(reply.into());
    }

    /// Fails every upload whose file name contains `marker` with a 500.
    pub fn fail_uploads_containing(&self, marker: impl Into<String>) {
        *self.state.fail_marker.lock().unwrap() = Some(marker.into());
    }

    /// Lets previously failing uploads succeed again.
    pub fn clear_upload_failures(&self) {
        *self.state.fail_marker.lock().unwrap() = None;
    }

    /// Number of successful uploads served so far.
    pub fn upload_count(&self) -> usize {
        self.state.uploads.lock().unwrap().len()
    }

    /// Number of `generateContent` calls served so far.
    pub fn generate_count(&self) -> usize {
        self.state.prompts.lock().unwrap().len()
    }

    /// Display names of every successfully uploaded file, in arrival order.
    pub fn uploaded_names(&self) -> Vec<String> {
        self.state.uploads.lock().unwrap().clone()
    }

    /// The text parts of every prompt seen so far, one entry per call.
    pub fn prompts(&self) -> Vec<String> {
        self.state.prompts.lock().unwrap().clone()
    }
}

impl Drop for GeminiMock {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn upload(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    _body: Bytes,
) -> Response {
    let name = headers
        .get("X-Goog-File-Name")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unnamed")
        .to_string();

    let rejected = state
        .fail_marker
        .lock()
        .unwrap()
        .as_deref()
        .is_some_and(|marker| name.contains(marker));
    if rejected {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "upload rejected" })),
        )
            .into_response();
    }

    let mime = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();

    let number = {
        let mut uploads = state.uploads.lock().unwrap();
        uploads.push(name);
        uploads.len()
    };

    Json(json!({
        "file": {
            "name": format!("files/mock-{number}"),
            "uri": format!("https://mock.invalid/files/mock-{number}"),
            "mimeType": mime,
        }
    }))
    .into_response()
}

async fn generate(
    State(state): State<Arc<MockState>>,
    Path(_model): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let prompt = body["contents"][0]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p["text"].as_str())
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default();
    state.prompts.lock().unwrap().push(prompt);

    let reply = state
        .replies
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| "OK".to_string());

    Json(json!({
        "candidates": [
            { "content": { "parts": [{ "text": reply }] } }
        ]
    }))
}
