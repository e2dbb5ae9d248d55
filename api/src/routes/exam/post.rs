//! POST handlers for the `/exam` endpoint group.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sea_orm::EntityTrait;
use serde::Serialize;
use util::state::AppState;

use crate::auth::claims::AuthUser;
use crate::auth::guards::Empty;
use crate::response::ApiResponse;
use crate::services::{grading, regions, results};
use db::models::{question, question_response};

/// POST /exam/{exam_id}/question/{question_id}/student/{student_id}/reevaluate
///
/// Resets the response's marks, re-extracts its answer text from the stored
/// region images, re-grades it against the question's stored materials, and
/// recomputes the student's exam total. The total reflects the reset even
/// when re-grading fails, so a failed re-evaluation leaves the response
/// ungraded rather than stale.
pub async fn reevaluate_response(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Path((exam_id, question_id, student_id)): Path<(i64, i64, i64)>,
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
                Json(ApiResponse::<Empty>::error("Response not found")),
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

    if let Err(e) = question_response::Model::set_marks(
        db,
        response.id,
        None,
        Some("Sent for re-evaluation"),
    )
    .await
    {
        tracing::error!(error = %e, "marks reset failed");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::<Empty>::error("Failed to reset marks")),
        )
            .into_response();
    }

    // Rebuild the answer text from the stored crops; a failure here falls
    // back to the text already on the row.
    if let Err(e) =
        regions::extract_single_response_regions(&app_state, &response, question.question_number)
            .await
    {
        tracing::warn!(response_id = response.id, error = %e, "region re-extraction failed");
    }

    let refreshed = match question_response::Model::find_by_question_and_student(
        db,
        question_id,
        student_id,
    )
    .await
    {
        Ok(Some(refreshed)) => refreshed,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::<Empty>::error("Response not found")),
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

    let graded = grading::grade_stored_response(&app_state, &question, &refreshed).await;

    let persist_outcome = match &graded {
        Ok(report) => grading::persist_grade(db, question_id, student_id, report).await,
        Err(_) => Ok(false),
    };
    if let Err(e) = persist_outcome {
        tracing::error!(error = %e, "grade persistence failed");
    }

    // The reset alone changed the total, so recompute regardless of how the
    // re-grade went.
    if let Err(e) = results::recompute_exam_result(db, exam_id, student_id, Some(claims.sub)).await
    {
        tracing::error!(error = %e, "exam result recompute failed");
    }

    match graded {
        Ok(report) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                report,
                "Sent for re-evaluation and exam result updated",
            )),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(question_id, student_id, error = %e, "re-grading failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Failed to re-grade response")),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct BulkMarkResult {
    pub updated: usize,
}

/// POST /exam/{exam_id}/question/{question_id}/drop
///
/// Drops a question: every recorded response gets zero marks with an
/// explanatory reasoning, and each affected student's total is recomputed.
pub async fn drop_question(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Path((exam_id, question_id)): Path<(i64, i64)>,
) -> impl IntoResponse {
    bulk_set_marks(
        app_state,
        exam_id,
        question_id,
        claims.sub,
        BulkMarkAction::Drop,
    )
    .await
}

/// POST /exam/{exam_id}/question/{question_id}/full-marks
///
/// Awards the question's `max_marks` to every recorded response and
/// recomputes each affected student's total.
pub async fn give_full_marks(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Path((exam_id, question_id)): Path<(i64, i64)>,
) -> impl IntoResponse {
    bulk_set_marks(
        app_state,
        exam_id,
        question_id,
        claims.sub,
        BulkMarkAction::FullMarks,
    )
    .await
}

enum BulkMarkAction {
    Drop,
    FullMarks,
}

async fn bulk_set_marks(
    app_state: AppState,
    exam_id: i64,
    question_id: i64,
    graded_by: i64,
    action: BulkMarkAction,
) -> axum::response::Response {
    let db = app_state.db();

    let question = match question::Entity::find_by_id(question_id).one(db).await {
        Ok(Some(q)) if q.exam_id == exam_id => q,
        Ok(_) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::<Empty>::error("Question not found")),
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

    let (marks, reasoning, message) = match action {
        BulkMarkAction::Drop => (0.0, "Question Dropped by professor", "Question dropped"),
        BulkMarkAction::FullMarks => (
            f64::from(question.max_marks),
            "Full marks awarded by professor",
            "Full marks awarded",
        ),
    };

    let responses = match question_response::Model::find_by_question(db, question_id).await {
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

    let mut updated = 0;
    for response in &responses {
        if let Err(e) =
            question_response::Model::set_marks(db, response.id, Some(marks), Some(reasoning))
                .await
        {
            tracing::error!(response_id = response.id, error = %e, "marks update failed");
            continue;
        }
        if let Err(e) =
            results::recompute_exam_result(db, exam_id, response.student_id, Some(graded_by)).await
        {
            tracing::error!(student_id = response.student_id, error = %e, "recompute failed");
        }
        updated += 1;
    }

    (
        StatusCode::OK,
        Json(ApiResponse::success(BulkMarkResult { updated }, message)),
    )
        .into_response()
}
