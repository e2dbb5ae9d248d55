//! POST handlers for the `/me` endpoint group.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use util::state::AppState;

use crate::auth::claims::AuthUser;
use crate::auth::guards::Empty;
use crate::response::ApiResponse;
use db::models::question_response;

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub question_id: Option<i64>,
    pub query: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct QuerySaved {
    pub id: i64,
    pub query: String,
}

/// POST /me/exam/{exam_id}/query
///
/// Saves the calling student's query on one question, creating their
/// response row first if they have none yet.
///
/// ### Request Body
/// ```json
/// { "question_id": 4, "query": "Why was 1.2 marked wrong?" }
/// ```
pub async fn post_query(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Path(_exam_id): Path<i64>,
    Json(req): Json<QueryRequest>,
) -> impl IntoResponse {
    let (Some(question_id), Some(query)) = (req.question_id, req.query) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<Empty>::error("Missing question_id or query")),
        )
            .into_response();
    };

    let db = app_state.db();
    let response = match question_response::Model::find_or_create(db, question_id, claims.sub)
        .await
    {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "response upsert failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Database error")),
            )
                .into_response();
        }
    };

    match question_response::Model::set_query(db, response.id, &query).await {
        Ok(updated) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                QuerySaved {
                    id: updated.id,
                    query: updated.query.unwrap_or_default(),
                },
                "Query updated successfully",
            )),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "query update failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Failed to save query")),
            )
                .into_response()
        }
    }
}
