//! PATCH handlers for the `/exam` endpoint group.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sea_orm::{ActiveModelTrait, ActiveValue::Set};
use serde::Deserialize;
use util::state::AppState;

use crate::auth::claims::AuthUser;
use crate::auth::guards::Empty;
use crate::response::ApiResponse;
use crate::services::results;
use db::models::question_response;

#[derive(Debug, Deserialize)]
pub struct ResponseUpdateRequest {
    pub response: Option<String>,
    pub marks_obtained: Option<f64>,
    pub reasoning: Option<String>,
}

/// PATCH /exam/{exam_id}/question/{question_id}/student/{student_id}/update
///
/// Upserts a student's response: creates the row when none exists, then
/// overwrites whichever of `response` (the answer text), `marks_obtained`,
/// and `reasoning` the body provides. The student's exam total is
/// recomputed before the reply goes out.
pub async fn update_student_response(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Path((exam_id, question_id, student_id)): Path<(i64, i64, i64)>,
    Json(req): Json<ResponseUpdateRequest>,
) -> impl IntoResponse {
    let db = app_state.db();

    let existing = match question_response::Model::find_or_create(db, question_id, student_id).await
    {
        Ok(existing) => existing,
        Err(e) => {
            tracing::error!(error = %e, "response upsert failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Database error")),
            )
                .into_response();
        }
    };

    let mut active: question_response::ActiveModel = existing.into();
    if let Some(answer_text) = req.response {
        active.answer_text = Set(Some(answer_text));
    }
    if let Some(marks) = req.marks_obtained {
        active.marks_obtained = Set(Some(marks));
    }
    if let Some(reasoning) = req.reasoning {
        active.reasoning = Set(Some(reasoning));
    }

    let updated = match active.update(db).await {
        Ok(updated) => updated,
        Err(e) => {
            tracing::error!(error = %e, "response update failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Failed to update response")),
            )
                .into_response();
        }
    };

    if let Err(e) = results::recompute_exam_result(db, exam_id, student_id, Some(claims.sub)).await
    {
        tracing::error!(error = %e, "exam result recompute failed");
    }

    (
        StatusCode::OK,
        Json(ApiResponse::success(updated, "Updated successfully")),
    )
        .into_response()
}
