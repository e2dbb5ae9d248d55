//! POST handlers for the grading endpoints.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sea_orm::EntityTrait;
use serde::{Deserialize, Serialize};
use util::state::AppState;

use crate::auth::claims::AuthUser;
use crate::auth::guards::Empty;
use crate::response::ApiResponse;
use crate::services::extraction::ExtractError;
use crate::services::grading::{self, GradingRequest};
use crate::services::results;
use db::models::question::{self, RegionCategory};
use db::models::{exam, question_response};

#[derive(Debug, Deserialize)]
pub struct GradeQuestionRequest {
    pub exam_id: i64,
    pub student_id: i64,
    pub question_id: i64,
    pub student_answer: Option<String>,
    pub ideal_answer: Option<String>,
    pub marking_scheme: Option<String>,
}

/// POST /grade-question
///
/// Grades one response from text alone. Fields omitted from the body fall
/// back to what is stored: the response's `answer_text`, the question's
/// `ideal_answer` and `ideal_marking_scheme`.
///
/// An accepted grade is written onto the existing response row (grading
/// never creates one) and the student's exam total is recomputed before the
/// reply goes out.
///
/// ### Responses
/// - `200 OK` with `{ grade, reasoning, raw_response }`
/// - `400 Bad Request` when no answer or no grading material is available
/// - `404 Not Found` when the question does not belong to the exam
pub async fn grade_question(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(req): Json<GradeQuestionRequest>,
) -> impl IntoResponse {
    grade_one(app_state, claims.sub, req, false).await
}

/// POST /grade-question-with-diagram
///
/// Same contract as `/grade-question`, additionally attaching the stored
/// region images: the response's diagram and table crops, and the
/// question's marking-scheme crops when no scheme text exists.
pub async fn grade_question_with_diagram(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(req): Json<GradeQuestionRequest>,
) -> impl IntoResponse {
    grade_one(app_state, claims.sub, req, true).await
}

async fn grade_one(
    app_state: AppState,
    graded_by: i64,
    req: GradeQuestionRequest,
    with_images: bool,
) -> axum::response::Response {
    let db = app_state.db();

    let question = match question::Entity::find_by_id(req.question_id).one(db).await {
        Ok(Some(q)) if q.exam_id == req.exam_id => q,
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

    let response = match question_response::Model::find_by_question_and_student(
        db,
        question.id,
        req.student_id,
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

    // Body fields win; stored rows fill the gaps.
    let student_answer = req
        .student_answer
        .or_else(|| response.as_ref().and_then(|r| r.answer_text.clone()));
    let ideal_answer = req.ideal_answer.or_else(|| question.ideal_answer.clone());
    let marking_scheme = req
        .marking_scheme
        .or_else(|| question.ideal_marking_scheme.clone());

    let (diagram_images, table_images) = if with_images {
        match &response {
            Some(r) => (
                r.answer_images(RegionCategory::Diagram),
                r.answer_images(RegionCategory::Table),
            ),
            None => (Vec::new(), Vec::new()),
        }
    } else {
        (Vec::new(), Vec::new())
    };
    let scheme_images = if with_images
        && marking_scheme
            .as_deref()
            .is_none_or(|s| s.trim().is_empty())
    {
        question.all_marking_images()
    } else {
        Vec::new()
    };

    let report = grading::grade_response(
        &app_state,
        &GradingRequest {
            question_text: &question.text,
            max_marks: question.max_marks,
            student_answer: student_answer.as_deref(),
            ideal_answer: ideal_answer.as_deref(),
            marking_scheme: marking_scheme.as_deref(),
            diagram_images: &diagram_images,
            table_images: &table_images,
            scheme_images: &scheme_images,
        },
    )
    .await;

    let report = match report {
        Ok(report) => report,
        Err(ExtractError::Validation(msg)) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::<Empty>::error(msg)),
            )
                .into_response();
        }
        Err(e) => {
            tracing::error!(question_id = question.id, error = %e, "grading failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Failed to grade question")),
            )
                .into_response();
        }
    };

    match grading::persist_grade(db, question.id, req.student_id, &report).await {
        Ok(true) => {
            if let Err(e) =
                results::recompute_exam_result(db, req.exam_id, req.student_id, Some(graded_by))
                    .await
            {
                tracing::error!(error = %e, "exam result recompute failed");
            }
        }
        Ok(false) => {}
        Err(e) => {
            tracing::error!(error = %e, "grade persistence failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Failed to store grade")),
            )
                .into_response();
        }
    }

    (
        StatusCode::OK,
        Json(ApiResponse::success(report, "Question graded")),
    )
        .into_response()
}

/// Per-question outcome of a whole-exam grading run.
#[derive(Debug, Serialize)]
pub struct QuestionGradeOutcome {
    pub question_id: i64,
    pub question_number: i32,
    pub grade: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct ExamGradeResults {
    pub results: Vec<QuestionGradeOutcome>,
}

/// POST /{exam_id}/grade-exam
///
/// Runs the grading pipeline over every question of the exam for the
/// calling user's own responses. One question failing (no response
/// recorded, missing material, model error) is reported in its array entry
/// and never stops the rest.
pub async fn grade_exam(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Path(exam_id): Path<i64>,
) -> impl IntoResponse {
    let db = app_state.db();

    match exam::Entity::find_by_id(exam_id).one(db).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::<Empty>::error("Exam not found")),
            )
                .into_response();
        }
        Err(e) => {
            tracing::error!(error = %e, "exam lookup failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Database error")),
            )
                .into_response();
        }
    }

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

    let mut outcomes = Vec::new();
    for question in &questions {
        let outcome = grade_exam_question(&app_state, exam_id, question, claims.sub).await;
        outcomes.push(outcome);
    }

    let message = format!("Graded {} question(s)", outcomes.len());
    (
        StatusCode::OK,
        Json(ApiResponse::success(ExamGradeResults { results: outcomes }, message)),
    )
        .into_response()
}

async fn grade_exam_question(
    app_state: &AppState,
    exam_id: i64,
    question: &question::Model,
    student_id: i64,
) -> QuestionGradeOutcome {
    let db = app_state.db();
    let failed = |error: String| QuestionGradeOutcome {
        question_id: question.id,
        question_number: question.question_number,
        grade: None,
        reasoning: None,
        error: Some(error),
    };

    let response =
        match question_response::Model::find_by_question_and_student(db, question.id, student_id)
            .await
        {
            Ok(Some(response)) => response,
            Ok(None) => return failed("No response recorded for this question".to_string()),
            Err(e) => return failed(format!("database error: {e}")),
        };

    let report = match grading::grade_stored_response(app_state, question, &response).await {
        Ok(report) => report,
        Err(e) => return failed(e.to_string()),
    };

    match grading::persist_grade(db, question.id, student_id, &report).await {
        Ok(true) => {
            if let Err(e) =
                results::recompute_exam_result(db, exam_id, student_id, Some(student_id)).await
            {
                tracing::error!(error = %e, "exam result recompute failed");
            }
        }
        Ok(false) => {}
        Err(e) => return failed(format!("database error: {e}")),
    }

    QuestionGradeOutcome {
        question_id: question.id,
        question_number: question.question_number,
        grade: report.grade,
        reasoning: Some(report.reasoning),
        error: None,
    }
}
