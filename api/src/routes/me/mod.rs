//! Routes for the `/me` endpoint group.
//!
//! Student self-service views: the evaluation table for an exam and the
//! per-question query box. Everything here is scoped to the calling user's
//! own responses; no ids other than the exam's appear in the paths.

pub mod get;
pub mod post;

use axum::{
    Router,
    routing::{get as get_method, post as post_method},
};
use util::state::AppState;

use get::get_my_evaluation;
use post::post_query;

/// Builds the `/me` route group.
///
/// - `GET /me/exam/{exam_id}/evaluation` → `get_my_evaluation`
/// - `POST /me/exam/{exam_id}/query` → `post_query`
pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/exam/{exam_id}/evaluation", get_method(get_my_evaluation))
        .route("/exam/{exam_id}/query", post_method(post_query))
}
