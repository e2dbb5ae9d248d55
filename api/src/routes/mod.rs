//! HTTP route entry point for `/api/...`.
//!
//! This module defines all HTTP entry points under the `/api` namespace.
//! Routes are organized by domain (extraction, grading, exams, me, auth,
//! health), each protected via the appropriate access-control middleware.
//!
//! Route groups include:
//! - `/health` → Health check endpoint (public)
//! - `/auth` → Authentication endpoints (login, public)
//! - `/extract-text`, `/extract-question-labels` → document extraction (professor-only)
//! - `/grade-question`, `/grade-question-with-diagram` → on-demand grading (professor-only)
//! - `/{exam_id}/grade-exam` → full-exam grading for the calling user (authenticated)
//! - `/exams` → exam CRUD, questions, stage, region uploads (reads authenticated, writes professor-only)
//! - `/exam` → per-response professor actions and evaluation views
//! - `/me` → student self-service views (authenticated)

use crate::auth::guards::{allow_authenticated, allow_professor};
use crate::routes::{
    auth::auth_routes, extraction::extraction_routes, health::health_routes, me::me_routes,
};
use axum::{Router, middleware::from_fn};
use util::state::AppState;

pub mod auth;
pub mod exam;
pub mod exams;
pub mod extraction;
pub mod grading;
pub mod health;
pub mod me;

/// Builds the complete application router for all HTTP endpoints.
///
/// The returned router has `AppState` as its state type and mounts
/// all core API routes under their respective base paths.
///
/// # Route Structure:
/// - `/health` → Health check endpoint (no authentication required).
/// - `/auth` → Login endpoint (no authentication required).
/// - `/extract-text`, `/extract-question-labels` → professor-only, mounted at
///   the root because the dashboard calls them without a group prefix.
/// - `/grade-question`, `/grade-question-with-diagram` → professor-only.
/// - `/{exam_id}/grade-exam` → any authenticated user, grades their own exam.
/// - `/exams/...` → stage and question reads for any authenticated user;
///   creation, uploads, extraction triggers and mark edits professor-only.
/// - `/exam/...` → response upsert for any authenticated user; re-evaluation,
///   drop/full-marks and the evaluation views professor-only.
/// - `/me/...` → the calling user's own evaluation and queries.
///
/// Mounting order matters for the root-level groups: the professor grading
/// routes use literal paths while `/{exam_id}/grade-exam` captures a path
/// parameter, so axum resolves literals first and the merge is unambiguous.
pub fn routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/health", health_routes())
        .nest("/auth", auth_routes())
        .merge(extraction_routes().route_layer(from_fn(allow_professor)))
        .merge(grading::professor_routes().route_layer(from_fn(allow_professor)))
        .merge(grading::authenticated_routes().route_layer(from_fn(allow_authenticated)))
        .nest(
            "/exams",
            exams::shared_routes()
                .route_layer(from_fn(allow_authenticated))
                .merge(exams::professor_routes().route_layer(from_fn(allow_professor))),
        )
        .nest(
            "/exam",
            exam::shared_routes()
                .route_layer(from_fn(allow_authenticated))
                .merge(exam::professor_routes().route_layer(from_fn(allow_professor))),
        )
        .nest("/me", me_routes().route_layer(from_fn(allow_authenticated)))
        .with_state(app_state)
}
