//! POST handlers for the extraction endpoints.

use axum::{
    Extension, Json,
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
};
use sea_orm::EntityTrait;
use serde::Serialize;
use util::state::AppState;

use crate::auth::claims::AuthUser;
use crate::auth::guards::Empty;
use crate::response::ApiResponse;
use crate::services::extraction::{self, ExtractError};
use crate::services::regions::{self, ExtractedQuestion};
use db::models::exam;
use grader::DocumentType;

/// Outcome for one uploaded file: extracted text on success, an error
/// message otherwise. A failed file never affects its siblings.
#[derive(Debug, Serialize)]
pub struct FileOutcome {
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct ExtractionResults {
    pub results: Vec<FileOutcome>,
}

/// POST /extract-text
///
/// Multipart upload of one or more exam documents. Fields:
/// - `exam_id` (required)
/// - `file_type` (required): `question_paper`, `solution_script`,
///   `marking_scheme`, or `answer_sheet`
/// - `student_id` (required for `answer_sheet`)
/// - `files` (repeated): the documents themselves
///
/// Always answers `200 OK` once the request itself is valid; the body
/// carries a per-file outcome so the client can retry exactly the files
/// that failed.
pub async fn extract_text(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let mut exam_id: Option<i64> = None;
    let mut file_type: Option<String> = None;
    let mut student_id: Option<i64> = None;
    let mut files: Vec<(String, Vec<u8>)> = Vec::new();

    while let Some(field) = multipart.next_field().await.unwrap_or(None) {
        match field.name() {
            Some("exam_id") => {
                exam_id = field.text().await.ok().and_then(|v| v.trim().parse().ok());
            }
            Some("file_type") => {
                file_type = field.text().await.ok();
            }
            Some("student_id") => {
                student_id = field.text().await.ok().and_then(|v| v.trim().parse().ok());
            }
            Some("files") => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                match field.bytes().await {
                    Ok(bytes) => files.push((filename, bytes.to_vec())),
                    Err(e) => {
                        tracing::warn!(filename, error = %e, "could not read uploaded file");
                    }
                }
            }
            _ => {}
        }
    }

    let Some(exam_id) = exam_id else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<Empty>::error("exam_id is required")),
        )
            .into_response();
    };
    let Some(document_type) = file_type.as_deref().and_then(DocumentType::parse) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<Empty>::error(
                "file_type must be one of question_paper, solution_script, marking_scheme, \
                 answer_sheet",
            )),
        )
            .into_response();
    };
    if document_type == DocumentType::AnswerSheet && student_id.is_none() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<Empty>::error(
                "student_id is required when uploading an answer sheet",
            )),
        )
            .into_response();
    }
    if files.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<Empty>::error("No files uploaded")),
        )
            .into_response();
    }

    match exam::Entity::find_by_id(exam_id).one(app_state.db()).await {
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

    let mut results = Vec::new();
    for (filename, bytes) in files {
        let outcome = extraction::extract_document(
            &app_state,
            exam_id,
            document_type,
            &filename,
            bytes,
            student_id,
            Some(claims.sub),
        )
        .await;

        match outcome {
            Ok(text) => results.push(FileOutcome {
                filename,
                text: Some(text),
                error: None,
            }),
            Err(e) => {
                tracing::error!(filename, error = %e, "document extraction failed");
                results.push(FileOutcome {
                    filename,
                    text: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    let message = format!("Processed {} file(s)", results.len());
    (
        StatusCode::OK,
        Json(ApiResponse::success(ExtractionResults { results }, message)),
    )
        .into_response()
}

#[derive(Debug, Default, Serialize)]
pub struct ExtractedQuestions {
    pub questions: Vec<ExtractedQuestion>,
}

/// POST /extract-question-labels
///
/// Multipart upload of labelled question-paper pages. Fields:
/// - `exam_id` (required)
/// - `files` (repeated): page images
///
/// Replaces the exam's question list with the labels read off the pages and
/// returns the rebuilt questions.
pub async fn extract_question_labels(
    State(app_state): State<AppState>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let mut exam_id: Option<i64> = None;
    let mut files: Vec<(String, Vec<u8>)> = Vec::new();

    while let Some(field) = multipart.next_field().await.unwrap_or(None) {
        match field.name() {
            Some("exam_id") => {
                exam_id = field.text().await.ok().and_then(|v| v.trim().parse().ok());
            }
            Some("files") => {
                let filename = field.file_name().unwrap_or("page").to_string();
                match field.bytes().await {
                    Ok(bytes) => files.push((filename, bytes.to_vec())),
                    Err(e) => {
                        tracing::warn!(filename, error = %e, "could not read uploaded page");
                    }
                }
            }
            _ => {}
        }
    }

    let Some(exam_id) = exam_id else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<Empty>::error("exam_id is required")),
        )
            .into_response();
    };
    if files.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<Empty>::error("No files uploaded")),
        )
            .into_response();
    }

    match exam::Entity::find_by_id(exam_id).one(app_state.db()).await {
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

    match regions::extract_question_labels(&app_state, exam_id, files).await {
        Ok(questions) => {
            let message = format!("Extracted {} question(s)", questions.len());
            (
                StatusCode::OK,
                Json(ApiResponse::success(ExtractedQuestions { questions }, message)),
            )
                .into_response()
        }
        Err(ExtractError::Validation(msg)) => (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<Empty>::error(msg)),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(exam_id, error = %e, "question label extraction failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Failed to extract question labels")),
            )
                .into_response()
        }
    }
}
