//! GET handlers for the `/exam` endpoint group.

use std::collections::HashSet;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde::Serialize;
use util::state::AppState;

use crate::auth::guards::Empty;
use crate::response::ApiResponse;
use db::models::{answer_script, question, question_response};

/// Shortens long question text for table display.
fn preview_text(text: &str) -> String {
    if text.chars().count() > 50 {
        let head: String = text.chars().take(50).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

#[derive(Debug, Serialize)]
pub struct EvaluationEntry {
    pub question_id: i64,
    pub question_number: i32,
    pub text: String,
    pub full_question_text: String,
    pub student_response: Option<String>,
    pub reasoning: Option<String>,
    pub ideal_answer: Option<String>,
    pub marking_scheme: Option<String>,
    pub marks_obtained: Option<f64>,
    pub max_marks: i32,
}

/// GET /exam/{exam_id}/student-evaluation/{student_id}
///
/// Question-wise breakdown of one student's graded exam, as shown in the
/// professor's moderation table. Questions the student never answered
/// appear with null response fields.
pub async fn get_student_evaluation(
    State(app_state): State<AppState>,
    Path((exam_id, student_id)): Path<(i64, i64)>,
) -> impl IntoResponse {
    let db = app_state.db();

    let questions = match question::Model::find_by_exam(db, exam_id).await {
        Ok(questions) => questions,
        Err(e) => {
            tracing::error!(error = %e, "question listing failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Database error")),
            )
                .into_response();
        }
    };

    let mut evaluation = Vec::new();
    for q in &questions {
        let response = match question_response::Model::find_by_question_and_student(
            db, q.id, student_id,
        )
        .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, "response lookup failed");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiResponse::<Empty>::error("Database error")),
                )
                    .into_response();
            }
        };

        evaluation.push(EvaluationEntry {
            question_id: q.id,
            question_number: q.question_number,
            text: preview_text(&q.text),
            full_question_text: q.text.clone(),
            student_response: response.as_ref().and_then(|r| r.answer_text.clone()),
            reasoning: response.as_ref().and_then(|r| r.reasoning.clone()),
            ideal_answer: q.ideal_answer.clone(),
            marking_scheme: q.ideal_marking_scheme.clone(),
            marks_obtained: response.as_ref().and_then(|r| r.marks_obtained),
            max_marks: q.max_marks,
        });
    }

    (
        StatusCode::OK,
        Json(ApiResponse::success(evaluation, "Student evaluation retrieved")),
    )
        .into_response()
}

#[derive(Debug, Serialize)]
pub struct QuestionMetrics {
    pub question_id: i64,
    pub question_number: i32,
    pub text: String,
    pub ideal_answer: Option<String>,
    pub max_marks: i32,
    pub marks_distribution: Vec<f64>,
}

/// GET /exam/{exam_id}/question-metrics
///
/// Per-question mark distributions across the whole class; ungraded
/// responses are excluded from the distribution.
pub async fn get_question_metrics(
    State(app_state): State<AppState>,
    Path(exam_id): Path<i64>,
) -> impl IntoResponse {
    let db = app_state.db();

    let questions = match question::Model::find_by_exam(db, exam_id).await {
        Ok(questions) => questions,
        Err(e) => {
            tracing::error!(error = %e, "question listing failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Database error")),
            )
                .into_response();
        }
    };

    let mut metrics = Vec::new();
    for q in &questions {
        let responses = match question_response::Model::find_by_question(db, q.id).await {
            Ok(responses) => responses,
            Err(e) => {
                tracing::error!(error = %e, "response listing failed");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiResponse::<Empty>::error("Database error")),
                )
                    .into_response();
            }
        };

        metrics.push(QuestionMetrics {
            question_id: q.id,
            question_number: q.question_number,
            text: q.text.clone(),
            ideal_answer: q.ideal_answer.clone(),
            max_marks: q.max_marks,
            marks_distribution: responses.iter().filter_map(|r| r.marks_obtained).collect(),
        });
    }

    (
        StatusCode::OK,
        Json(ApiResponse::success(metrics, "Question metrics retrieved")),
    )
        .into_response()
}

#[derive(Debug, Default, Serialize)]
pub struct GradingStatus {
    pub total: u64,
    pub graded: u64,
}

/// GET /exam/{exam_id}/grading-status
///
/// Progress counter for the grading dashboard: `total` counts uploaded
/// answer scripts, `graded` counts students with at least one graded
/// response on this exam.
pub async fn get_grading_status(
    State(app_state): State<AppState>,
    Path(exam_id): Path<i64>,
) -> impl IntoResponse {
    let db = app_state.db();

    let total = match answer_script::Entity::find()
        .filter(answer_script::Column::ExamId.eq(exam_id))
        .count(db)
        .await
    {
        Ok(total) => total,
        Err(e) => {
            tracing::error!(error = %e, "answer script count failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Database error")),
            )
                .into_response();
        }
    };

    let questions = match question::Model::find_by_exam(db, exam_id).await {
        Ok(questions) => questions,
        Err(e) => {
            tracing::error!(error = %e, "question listing failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Database error")),
            )
                .into_response();
        }
    };
    let question_ids: Vec<i64> = questions.iter().map(|q| q.id).collect();

    let graded = if question_ids.is_empty() {
        0
    } else {
        match question_response::Entity::find()
            .filter(question_response::Column::QuestionId.is_in(question_ids))
            .filter(question_response::Column::MarksObtained.is_not_null())
            .all(db)
            .await
        {
            Ok(responses) => responses
                .iter()
                .map(|r| r.student_id)
                .collect::<HashSet<_>>()
                .len() as u64,
            Err(e) => {
                tracing::error!(error = %e, "graded response listing failed");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiResponse::<Empty>::error("Database error")),
                )
                    .into_response();
            }
        }
    };

    (
        StatusCode::OK,
        Json(ApiResponse::success(
            GradingStatus { total, graded },
            "Grading status retrieved",
        )),
    )
        .into_response()
}
