//! Routes for the `/exam` endpoint group.
//!
//! Per-response professor actions (re-evaluation, dropping a question,
//! awarding full marks) and the evaluation views professors read while
//! moderating. The response-upsert PATCH is open to any authenticated user
//! so students can submit typed answers directly.

pub mod get;
pub mod patch;
pub mod post;

use axum::{
    Router,
    routing::{get as get_method, patch as patch_method, post as post_method},
};
use util::state::AppState;

use get::{get_grading_status, get_question_metrics, get_student_evaluation};
use patch::update_student_response;
use post::{drop_question, give_full_marks, reevaluate_response};

/// Professor-only endpoints.
///
/// - `POST /exam/{exam_id}/question/{question_id}/student/{student_id}/reevaluate`
///   → `reevaluate_response`
/// - `POST /exam/{exam_id}/question/{question_id}/drop` → `drop_question`
/// - `POST /exam/{exam_id}/question/{question_id}/full-marks` → `give_full_marks`
/// - `GET /exam/{exam_id}/student-evaluation/{student_id}` → `get_student_evaluation`
/// - `GET /exam/{exam_id}/question-metrics` → `get_question_metrics`
/// - `GET /exam/{exam_id}/grading-status` → `get_grading_status`
pub fn professor_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/{exam_id}/question/{question_id}/student/{student_id}/reevaluate",
            post_method(reevaluate_response),
        )
        .route(
            "/{exam_id}/question/{question_id}/drop",
            post_method(drop_question),
        )
        .route(
            "/{exam_id}/question/{question_id}/full-marks",
            post_method(give_full_marks),
        )
        .route(
            "/{exam_id}/student-evaluation/{student_id}",
            get_method(get_student_evaluation),
        )
        .route("/{exam_id}/question-metrics", get_method(get_question_metrics))
        .route("/{exam_id}/grading-status", get_method(get_grading_status))
}

/// Endpoints open to any authenticated user.
///
/// - `PATCH /exam/{exam_id}/question/{question_id}/student/{student_id}/update`
///   → `update_student_response`
pub fn shared_routes() -> Router<AppState> {
    Router::new().route(
        "/{exam_id}/question/{question_id}/student/{student_id}/update",
        patch_method(update_student_response),
    )
}
