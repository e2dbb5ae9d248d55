//! Routes for the `/exams` endpoint group.
//!
//! Exam CRUD, the question list, the exam stage, region-image uploads, and
//! the region-extraction triggers. Read endpoints are open to any
//! authenticated user (students poll the stage and their question list);
//! everything that mutates is professor-only.

pub mod delete;
pub mod get;
pub mod patch;
pub mod post;

use axum::{
    Router,
    routing::{delete as delete_method, get as get_method, patch as patch_method, post as post_method},
};
use util::state::AppState;

use delete::delete_questions;
use get::{get_exam, get_questions, get_stage};
use patch::{update_marks, update_question};
use post::{
    create_exam, extract_answer_text, extract_marking_text, set_stage, upload_answer_regions,
    upload_marking_regions,
};

/// Read endpoints, open to any authenticated user.
///
/// - `GET /exams/{exam_id}` → `get_exam`
/// - `GET /exams/{exam_id}/questions` → `get_questions`
/// - `GET /exams/{exam_id}/stage` → `get_stage`
pub fn shared_routes() -> Router<AppState> {
    Router::new()
        .route("/{exam_id}", get_method(get_exam))
        .route("/{exam_id}/questions", get_method(get_questions))
        .route("/{exam_id}/stage", get_method(get_stage))
}

/// Mutating endpoints, professor-only.
///
/// - `POST /exams` → `create_exam`
/// - `POST /exams/{exam_id}/stage` → `set_stage`
/// - `PATCH /exams/{exam_id}/questions/{question_id}` → `update_question`
/// - `DELETE /exams/{exam_id}/questions` → `delete_questions`
/// - `POST /exams/{exam_id}/student/{student_id}/question/{question_id}/regions`
///   → `upload_answer_regions`
/// - `POST /exams/{exam_id}/question/{question_id}/ms-regions` → `upload_marking_regions`
/// - `POST /exams/{exam_id}/student/{student_id}/extract-answer-text` → `extract_answer_text`
/// - `POST /exams/{exam_id}/extract-marking-text` → `extract_marking_text`
/// - `PATCH /exams/{exam_id}/student/{student_id}/question/{question_id}/update`
///   → `update_marks`
pub fn professor_routes() -> Router<AppState> {
    Router::new()
        .route("/", post_method(create_exam))
        .route("/{exam_id}/stage", post_method(set_stage))
        .route(
            "/{exam_id}/questions/{question_id}",
            patch_method(update_question),
        )
        .route("/{exam_id}/questions", delete_method(delete_questions))
        .route(
            "/{exam_id}/student/{student_id}/question/{question_id}/regions",
            post_method(upload_answer_regions),
        )
        .route(
            "/{exam_id}/question/{question_id}/ms-regions",
            post_method(upload_marking_regions),
        )
        .route(
            "/{exam_id}/student/{student_id}/extract-answer-text",
            post_method(extract_answer_text),
        )
        .route(
            "/{exam_id}/extract-marking-text",
            post_method(extract_marking_text),
        )
        .route(
            "/{exam_id}/student/{student_id}/question/{question_id}/update",
            patch_method(update_marks),
        )
}
