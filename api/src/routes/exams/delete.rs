//! DELETE handlers for the `/exams` endpoint group.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use util::state::AppState;

use crate::auth::guards::Empty;
use crate::response::ApiResponse;
use db::models::question;

#[derive(Debug, Default, Serialize)]
pub struct QuestionsDeleted {
    pub deleted: u64,
}

/// DELETE /exams/{exam_id}/questions
///
/// Removes every question of the exam. Responses cascade away with their
/// questions, so this is the reset professors use before re-running label
/// extraction from scratch.
pub async fn delete_questions(
    State(app_state): State<AppState>,
    Path(exam_id): Path<i64>,
) -> impl IntoResponse {
    match question::Model::delete_by_exam(app_state.db(), exam_id).await {
        Ok(deleted) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                QuestionsDeleted { deleted },
                "Questions deleted",
            )),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "question deletion failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Failed to delete questions")),
            )
                .into_response()
        }
    }
}
