//! GET handlers for the `/me` endpoint group.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use regex::Regex;
use serde::Serialize;
use util::state::AppState;

use crate::auth::claims::AuthUser;
use crate::auth::guards::Empty;
use crate::response::ApiResponse;
use db::models::{question, question_response};

/// Strips inline markdown the model tends to emit so question text renders
/// cleanly in the student's plain-text table.
fn strip_markdown(text: &str) -> String {
    let mut text = text.to_string();
    for (pattern, replacement) in [
        (r"`(.+?)`", "$1"),
        (r"\*\*(.*?)\*\*", "$1"),
        (r"__(.*?)__", "$1"),
        (r"\*(.*?)\*", "$1"),
        (r"_(.*?)_", "$1"),
        (r"~~(.*?)~~", "$1"),
        (r"[>#\-\+]", ""),
    ] {
        let re = Regex::new(pattern).expect("markdown regex is valid");
        text = re.replace_all(&text, replacement).into_owned();
    }
    text.trim().to_string()
}

/// Turns stored question text into the student-facing display form: the
/// embedded max-marks note removed, markdown stripped, a `Q<n>) ` prefix
/// added, and the result truncated to 50 characters.
fn display_text(question_number: i32, text: &str) -> String {
    let max_marks_note =
        Regex::new(r"(?i)Max(?:imum)?\s*Marks\s*(?:[:\-]\s*)?\d+").expect("marks regex is valid");
    let clean = max_marks_note.replace_all(text, "");
    let clean = strip_markdown(clean.trim());

    let full = format!("Q{question_number}) {clean}");
    if full.chars().count() > 50 {
        let head: String = full.chars().take(50).collect();
        format!("{head}...")
    } else {
        full
    }
}

#[derive(Debug, Serialize)]
pub struct MyEvaluationEntry {
    pub question_id: i64,
    pub question_number: i32,
    pub text: String,
    pub full_question_text: String,
    pub max_marks: i32,
    pub marks_obtained: Option<f64>,
    pub reasoning: String,
    pub query: String,
}

/// GET /me/exam/{exam_id}/evaluation
///
/// The calling student's own evaluation table for an exam: one entry per
/// question with display-ready text, their marks (null while ungraded),
/// the grading reasoning, and any query they raised.
pub async fn get_my_evaluation(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
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

    let mut evaluation = Vec::new();
    for q in &questions {
        let response = match question_response::Model::find_by_question_and_student(
            db, q.id, claims.sub,
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

        evaluation.push(MyEvaluationEntry {
            question_id: q.id,
            question_number: q.question_number,
            text: display_text(q.question_number, &q.text),
            full_question_text: q.text.clone(),
            max_marks: q.max_marks,
            marks_obtained: response.as_ref().and_then(|r| r.marks_obtained),
            reasoning: response
                .as_ref()
                .and_then(|r| r.reasoning.clone())
                .unwrap_or_default(),
            query: response
                .as_ref()
                .and_then(|r| r.query.clone())
                .unwrap_or_default(),
        });
    }

    (
        StatusCode::OK,
        Json(ApiResponse::success(evaluation, "Evaluation retrieved")),
    )
        .into_response()
}
