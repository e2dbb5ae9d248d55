//! Routes for the grading endpoints.
//!
//! Two professor-only endpoints grade a single response on demand, with or
//! without the stored region images attached; `/{exam_id}/grade-exam` lets
//! any authenticated user run the grading pipeline over every question of
//! an exam for themselves.

pub mod post;

use axum::{Router, routing::post as post_method};
use util::state::AppState;

use post::{grade_exam, grade_question, grade_question_with_diagram};

/// Professor-only grading endpoints, mounted at the root.
pub fn professor_routes() -> Router<AppState> {
    Router::new()
        .route("/grade-question", post_method(grade_question))
        .route(
            "/grade-question-with-diagram",
            post_method(grade_question_with_diagram),
        )
}

/// Endpoints any authenticated user may call for their own responses.
pub fn authenticated_routes() -> Router<AppState> {
    Router::new().route("/{exam_id}/grade-exam", post_method(grade_exam))
}
