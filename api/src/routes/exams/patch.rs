//! PATCH handlers for the `/exams` endpoint group.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sea_orm::{ActiveModelTrait, ActiveValue::Set, EntityTrait};
use serde::Deserialize;
use util::state::AppState;

use crate::auth::claims::AuthUser;
use crate::auth::guards::Empty;
use crate::response::ApiResponse;
use crate::services::results;
use db::models::{question, question_response};

use super::get::QuestionDetail;

#[derive(Debug, Deserialize)]
pub struct QuestionUpdateRequest {
    pub text: Option<String>,
    pub ideal_answer: Option<String>,
    pub ideal_marking_scheme: Option<String>,
    pub max_marks: Option<i32>,
}

/// PATCH /exams/{exam_id}/questions/{question_id}
///
/// Updates any of the question's editable fields. Omitted fields keep
/// their stored values.
pub async fn update_question(
    State(app_state): State<AppState>,
    Path((exam_id, question_id)): Path<(i64, i64)>,
    Json(req): Json<QuestionUpdateRequest>,
) -> impl IntoResponse {
    let db = app_state.db();

    let question = match question::Entity::find_by_id(question_id).one(db).await {
        Ok(Some(q)) if q.exam_id == exam_id => q,
        Ok(_) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::<Empty>::error("Question not found.")),
            )
                .into_response();
        }
        Err(e) => {
            tracing::error!(error = %e, "question lookup failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Database error")),
            )
                .into_response();
        }
    };

    let mut active: question::ActiveModel = question.into();
    if let Some(text) = req.text {
        active.text = Set(text);
    }
    if let Some(ideal_answer) = req.ideal_answer {
        active.ideal_answer = Set(Some(ideal_answer));
    }
    if let Some(scheme) = req.ideal_marking_scheme {
        active.ideal_marking_scheme = Set(Some(scheme));
    }
    if let Some(max_marks) = req.max_marks {
        active.max_marks = Set(max_marks);
    }

    match active.update(db).await {
        Ok(updated) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                QuestionDetail::from(&updated),
                "Question updated",
            )),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "question update failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Failed to update question")),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MarksUpdateRequest {
    pub grade: f64,
}

/// PATCH /exams/{exam_id}/student/{student_id}/question/{question_id}/update
///
/// Manually overrides the marks on a student's response, then recomputes
/// their exam total. Reasoning is left untouched, and no range check
/// applies; a professor may award beyond `max_marks`.
///
/// ### Responses
/// - `200 OK`
/// - `404 Not Found` when the student has no response to the question
pub async fn update_marks(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Path((exam_id, student_id, question_id)): Path<(i64, i64, i64)>,
    Json(req): Json<MarksUpdateRequest>,
) -> impl IntoResponse {
    let db = app_state.db();

    let response = match question_response::Model::find_by_question_and_student(
        db,
        question_id,
        student_id,
    )
    .await
    {
        Ok(Some(response)) => response,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::<Empty>::error(
                    "Response not found for this student and question.",
                )),
            )
                .into_response();
        }
        Err(e) => {
            tracing::error!(error = %e, "response lookup failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Database error")),
            )
                .into_response();
        }
    };

    if let Err(e) =
        question_response::Model::set_marks(db, response.id, Some(req.grade), None).await
    {
        tracing::error!(error = %e, "marks update failed");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::<Empty>::error("Failed to update marks")),
        )
            .into_response();
    }

    match results::recompute_exam_result(db, exam_id, student_id, Some(claims.sub)).await {
        Ok(result) => (
            StatusCode::OK,
            Json(ApiResponse::success(result, "Marks updated successfully")),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "exam result recompute failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Failed to update exam result")),
            )
                .into_response()
        }
    }
}
