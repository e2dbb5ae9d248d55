//! GET handlers for the `/exams` endpoint group.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sea_orm::EntityTrait;
use serde::Serialize;
use util::state::AppState;

use crate::auth::guards::Empty;
use crate::response::ApiResponse;
use db::models::{exam, question};

/// Question row with `part_labels` decoded for the client.
#[derive(Debug, Serialize)]
pub struct QuestionDetail {
    pub id: i64,
    pub exam_id: i64,
    pub question_number: i32,
    pub text: String,
    pub ideal_answer: Option<String>,
    pub ideal_marking_scheme: Option<String>,
    pub max_marks: i32,
    pub part_labels: Vec<String>,
}

impl From<&question::Model> for QuestionDetail {
    fn from(q: &question::Model) -> Self {
        Self {
            id: q.id,
            exam_id: q.exam_id,
            question_number: q.question_number,
            text: q.text.clone(),
            ideal_answer: q.ideal_answer.clone(),
            ideal_marking_scheme: q.ideal_marking_scheme.clone(),
            max_marks: q.max_marks,
            part_labels: q.part_label_list(),
        }
    }
}

/// GET /exams/{exam_id}
///
/// Returns the exam record.
pub async fn get_exam(
    State(app_state): State<AppState>,
    Path(exam_id): Path<i64>,
) -> impl IntoResponse {
    match exam::Entity::find_by_id(exam_id).one(app_state.db()).await {
        Ok(Some(exam)) => (
            StatusCode::OK,
            Json(ApiResponse::success(exam, "Exam retrieved")),
        )
            .into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<Empty>::error("Exam not found")),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "exam lookup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Database error")),
            )
                .into_response()
        }
    }
}

/// GET /exams/{exam_id}/questions
///
/// Returns the exam's questions ordered by question number, with part
/// labels decoded from storage.
pub async fn get_questions(
    State(app_state): State<AppState>,
    Path(exam_id): Path<i64>,
) -> impl IntoResponse {
    match question::Model::find_by_exam(app_state.db(), exam_id).await {
        Ok(questions) => {
            let details: Vec<QuestionDetail> = questions.iter().map(QuestionDetail::from).collect();
            let message = format!("{} question(s)", details.len());
            (
                StatusCode::OK,
                Json(ApiResponse::success(details, message)),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "question listing failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Database error")),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct StageResponse {
    pub exam_id: i64,
    pub stage: i32,
}

/// GET /exams/{exam_id}/stage
///
/// Returns the exam's workflow stage. Stages are opaque integers owned by
/// the frontend; the backend only stores and returns them.
pub async fn get_stage(
    State(app_state): State<AppState>,
    Path(exam_id): Path<i64>,
) -> impl IntoResponse {
    match exam::Entity::find_by_id(exam_id).one(app_state.db()).await {
        Ok(Some(exam)) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                StageResponse {
                    exam_id: exam.id,
                    stage: exam.exam_stage,
                },
                "Exam stage retrieved",
            )),
        )
            .into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<Empty>::error("Exam not found")),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "exam lookup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Database error")),
            )
                .into_response()
        }
    }
}
