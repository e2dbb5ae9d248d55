//! POST handlers for the `/auth` endpoint group.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use util::state::AppState;

use crate::auth::generate_jwt;
use crate::auth::guards::Empty;
use crate::response::ApiResponse;
use db::models::user;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: String,
    pub user: user::Model,
}

/// POST /auth/login
///
/// Authenticates a user and returns a signed JWT along with the user record.
///
/// ### Request Body
/// ```json
/// { "email": "prof@university.edu", "password": "secret" }
/// ```
///
/// ### Responses
/// - `200 OK` with `{ token, expires_at, user }`
/// - `401 Unauthorized` when the email or password is wrong
pub async fn login(
    State(app_state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    let db = app_state.db();

    match user::Model::verify_credentials(db, &req.email, &req.password).await {
        Ok(Some(user)) => {
            let (token, expires_at) = generate_jwt(user.id, user.professor);
            let response = LoginResponse {
                token,
                expires_at,
                user,
            };
            (
                StatusCode::OK,
                Json(ApiResponse::success(response, "Login successful")),
            )
                .into_response()
        }
        Ok(None) => (
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::<Empty>::error("Invalid email or password")),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "login query failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<Empty>::error("Database error")),
            )
                .into_response()
        }
    }
}
