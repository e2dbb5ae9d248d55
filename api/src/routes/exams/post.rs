//! POST handlers for the `/exams` endpoint group.

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sea_orm::EntityTrait;
use serde::{Deserialize, Serialize};
use util::state::AppState;
use util::paths;

use crate::auth::guards::Empty;
use crate::response::ApiResponse;
use crate::services::extraction::ExtractError;
use crate::services::regions;
use db::models::question::{self, RegionCategory};
use db::models::{classroom, exam, question_response};

#[derive(Debug, Deserialize)]
pub struct CreateExamRequest {
    pub classroom_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub points_possible: Option<i32>,
}

/// POST /exams
///
/// Creates an exam in a classroom. `points_possible` defaults to 100 and
/// the workflow stage starts at 0.
///
/// ### Responses
/// - `201 Created` with the exam record
/// - `404 Not Found` when the classroom does not exist
pub async fn create_exam(
    State(app_state): State<AppState>,
    Json(req): Json<CreateExamRequest>,
) -> impl IntoResponse {
    let db = app_state.db();

    match classroom::Entity::find_by_id(req.classroom_id).one(db).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::<Empty>::error("Classroom not found")),
            )
                .into_response();
        }
        Err(e) => {
            tracing::error!(error = %e, "classroom lookup failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Database error")),
            )
                .into_response();
        }
    }

    match exam::Model::create(
        db,
        req.classroom_id,
        &req.title,
        req.description.as_deref(),
        req.points_possible.unwrap_or(100),
    )
    .await
    {
        Ok(exam) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(exam, "Exam created")),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "exam creation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Failed to create exam")),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StageUpdateRequest {
    pub stage: i32,
}

#[derive(Debug, Default, Serialize)]
pub struct StageUpdated {
    pub exam_id: i64,
    pub stage: i32,
}

/// POST /exams/{exam_id}/stage
///
/// Stores a new workflow stage for the exam. Any non-negative integer is
/// accepted; the backend attaches no meaning to the value.
///
/// ### Responses
/// - `200 OK` with `{ exam_id, stage }`
/// - `400 Bad Request` for a negative stage
/// - `404 Not Found` when the exam does not exist
pub async fn set_stage(
    State(app_state): State<AppState>,
    Path(exam_id): Path<i64>,
    Json(req): Json<StageUpdateRequest>,
) -> impl IntoResponse {
    if req.stage < 0 {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<Empty>::error(
                "Exam stage must be a non-negative integer",
            )),
        )
            .into_response();
    }

    match exam::Model::set_stage(app_state.db(), exam_id, req.stage).await {
        Ok(exam) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                StageUpdated {
                    exam_id: exam.id,
                    stage: exam.exam_stage,
                },
                "Exam stage updated",
            )),
        )
            .into_response(),
        Err(sea_orm::DbErr::RecordNotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<Empty>::error("Exam not found")),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "stage update failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Failed to update exam stage")),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct RegionUploadResponse {
    pub category: String,
    pub added: usize,
    pub total: usize,
}

/// POST /exams/{exam_id}/student/{student_id}/question/{question_id}/regions
///
/// Multipart upload of cropped answer-region images for one response.
/// Fields:
/// - `category` (required): `text`, `table`, or `diagram`
/// - `files` (repeated): the cropped images
///
/// Creates the response row if the student has none yet and appends the
/// stored image paths to the matching category column.
pub async fn upload_answer_regions(
    State(app_state): State<AppState>,
    Path((exam_id, student_id, question_id)): Path<(i64, i64, i64)>,
    multipart: Multipart,
) -> impl IntoResponse {
    let db = app_state.db();

    let (category, files) = match read_region_upload(multipart).await {
        Ok(parsed) => parsed,
        Err(response) => return response,
    };
    if let Err(response) = ensure_question_in_exam(&app_state, exam_id, question_id).await {
        return response;
    }

    let response = match question_response::Model::find_or_create(db, question_id, student_id).await
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

    let dir = paths::answer_region_dir(exam_id, student_id, question_id);
    let offset = response.answer_images(category).len();
    let stored = match store_region_files(&dir, offset, files).await {
        Ok(stored) => stored,
        Err(response) => return response,
    };

    let added = stored.len();
    match question_response::Model::append_answer_images(db, response.id, category, &stored).await {
        Ok(updated) => {
            let total = updated.answer_images(category).len();
            (
                StatusCode::OK,
                Json(ApiResponse::success(
                    RegionUploadResponse {
                        category: category.to_string(),
                        added,
                        total,
                    },
                    "Region images uploaded",
                )),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "region image append failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Failed to store region images")),
            )
                .into_response()
        }
    }
}

/// POST /exams/{exam_id}/question/{question_id}/ms-regions
///
/// Marking-scheme variant of the region upload: appends cropped
/// marking-scheme images to the question itself.
pub async fn upload_marking_regions(
    State(app_state): State<AppState>,
    Path((exam_id, question_id)): Path<(i64, i64)>,
    multipart: Multipart,
) -> impl IntoResponse {
    let db = app_state.db();

    let (category, files) = match read_region_upload(multipart).await {
        Ok(parsed) => parsed,
        Err(response) => return response,
    };
    let question = match ensure_question_in_exam(&app_state, exam_id, question_id).await {
        Ok(question) => question,
        Err(response) => return response,
    };

    let dir = paths::marking_region_dir(exam_id, question_id);
    let offset = question.marking_images(category).len();
    let stored = match store_region_files(&dir, offset, files).await {
        Ok(stored) => stored,
        Err(response) => return response,
    };

    let added = stored.len();
    match question::Model::append_marking_images(db, question_id, category, &stored).await {
        Ok(updated) => {
            let total = updated.marking_images(category).len();
            (
                StatusCode::OK,
                Json(ApiResponse::success(
                    RegionUploadResponse {
                        category: category.to_string(),
                        added,
                        total,
                    },
                    "Marking-scheme images uploaded",
                )),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "marking image append failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Failed to store marking images")),
            )
                .into_response()
        }
    }
}

/// POST /exams/{exam_id}/student/{student_id}/extract-answer-text
///
/// Runs the batched answer-region pipeline for one student and returns the
/// rebuilt answer texts.
pub async fn extract_answer_text(
    State(app_state): State<AppState>,
    Path((exam_id, student_id)): Path<(i64, i64)>,
) -> impl IntoResponse {
    if let Err(response) = ensure_exam_exists(&app_state, exam_id).await {
        return response;
    }

    match regions::extract_answer_regions(&app_state, exam_id, student_id).await {
        Ok(results) => {
            let message = format!("Updated {} response(s)", results.len());
            (
                StatusCode::OK,
                Json(ApiResponse::success(results, message)),
            )
                .into_response()
        }
        Err(ExtractError::Validation(msg)) => (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<Empty>::error(msg)),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(exam_id, student_id, error = %e, "answer-region extraction failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Failed to extract answer text")),
            )
                .into_response()
        }
    }
}

/// POST /exams/{exam_id}/extract-marking-text
///
/// Runs the batched marking-region pipeline over every question of the exam.
pub async fn extract_marking_text(
    State(app_state): State<AppState>,
    Path(exam_id): Path<i64>,
) -> impl IntoResponse {
    if let Err(response) = ensure_exam_exists(&app_state, exam_id).await {
        return response;
    }

    match regions::extract_marking_regions(&app_state, exam_id).await {
        Ok(results) => {
            let message = format!("Updated {} question(s)", results.len());
            (
                StatusCode::OK,
                Json(ApiResponse::success(results, message)),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(exam_id, error = %e, "marking-region extraction failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Failed to extract marking text")),
            )
                .into_response()
        }
    }
}

/// Reads `category` + `files` out of a region-upload multipart body.
async fn read_region_upload(
    mut multipart: Multipart,
) -> Result<(RegionCategory, Vec<(String, Vec<u8>)>), axum::response::Response> {
    let mut category: Option<RegionCategory> = None;
    let mut files: Vec<(String, Vec<u8>)> = Vec::new();

    while let Some(field) = multipart.next_field().await.unwrap_or(None) {
        match field.name() {
            Some("category") => {
                category = field
                    .text()
                    .await
                    .ok()
                    .and_then(|v| v.trim().parse::<RegionCategory>().ok());
            }
            Some("files") => {
                let filename = field.file_name().unwrap_or("region").to_string();
                match field.bytes().await {
                    Ok(bytes) => files.push((filename, bytes.to_vec())),
                    Err(e) => {
                        tracing::warn!(filename, error = %e, "could not read uploaded image");
                    }
                }
            }
            _ => {}
        }
    }

    let Some(category) = category else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<Empty>::error(
                "category must be one of text, table, diagram",
            )),
        )
            .into_response());
    };
    if files.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<Empty>::error("No files uploaded")),
        )
            .into_response());
    }
    Ok((category, files))
}

/// Writes uploaded region images under `dir`, prefixing filenames with a
/// running index so repeated uploads of the same filename never collide.
async fn store_region_files(
    dir: &std::path::Path,
    offset: usize,
    files: Vec<(String, Vec<u8>)>,
) -> Result<Vec<String>, axum::response::Response> {
    if let Err(e) = paths::ensure_dir(dir) {
        tracing::error!(dir = %dir.display(), error = %e, "could not create region directory");
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::<Empty>::error("Failed to store region images")),
        )
            .into_response());
    }

    let mut stored = Vec::new();
    for (i, (filename, bytes)) in files.into_iter().enumerate() {
        let path = dir.join(format!("{}_{}", offset + i, filename));
        if let Err(e) = tokio::fs::write(&path, &bytes).await {
            tracing::error!(path = %path.display(), error = %e, "could not write region image");
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Failed to store region images")),
            )
                .into_response());
        }
        stored.push(path.to_string_lossy().into_owned());
    }
    Ok(stored)
}

async fn ensure_exam_exists(
    app_state: &AppState,
    exam_id: i64,
) -> Result<exam::Model, axum::response::Response> {
    match exam::Entity::find_by_id(exam_id).one(app_state.db()).await {
        Ok(Some(exam)) => Ok(exam),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<Empty>::error("Exam not found")),
        )
            .into_response()),
        Err(e) => {
            tracing::error!(error = %e, "exam lookup failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Database error")),
            )
                .into_response())
        }
    }
}

async fn ensure_question_in_exam(
    app_state: &AppState,
    exam_id: i64,
    question_id: i64,
) -> Result<question::Model, axum::response::Response> {
    match question::Entity::find_by_id(question_id).one(app_state.db()).await {
        Ok(Some(question)) if question.exam_id == exam_id => Ok(question),
        Ok(_) => Err((
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<Empty>::error("Question not found.")),
        )
            .into_response()),
        Err(e) => {
            tracing::error!(error = %e, "question lookup failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Database error")),
            )
                .into_response())
        }
    }
}
