//! Routes for document-extraction endpoints.
//!
//! Both endpoints accept multipart uploads from the professor's dashboard
//! and sit at the API root:
//! - `POST /extract-text` → full-document text extraction
//! - `POST /extract-question-labels` → rebuild the question list from
//!   labelled question-paper pages

pub mod post;

use axum::{Router, routing::post as post_method};
use util::state::AppState;

use post::{extract_question_labels, extract_text};

/// Builds the extraction route group. Mounted at the root, professor-only.
pub fn extraction_routes() -> Router<AppState> {
    Router::new()
        .route("/extract-text", post_method(extract_text))
        .route("/extract-question-labels", post_method(extract_question_labels))
}
