//! Routes for the `/auth` endpoint group.
//!
//! The only endpoint is `POST /auth/login`; account creation is an
//! administrative task done through seeding or the classroom tooling, so
//! there is no public registration.

pub mod post;

use axum::{Router, routing::post};
use util::state::AppState;

use post::login;

/// Builds the `/auth` route group.
///
/// - `POST /auth/login` → `login`
pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/login", post(login))
}
