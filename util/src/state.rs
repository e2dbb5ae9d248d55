//! Application state container shared across Axum route handlers and services.
//!
//! This struct holds shared resources such as the database connection and the
//! vision-model credential pool. It is cloned into route handlers via Axum's
//! `State<T>` extractor.

use ai::rotator::ModelRotator;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Central application state shared across the server.
///
/// This includes:
/// - A cloned, thread-safe database connection for use with SeaORM.
/// - The shared [`ModelRotator`] holding one vision-model client per
///   configured credential. The rotator is constructed once at startup and
///   injected here so callers never reach for process-global state.
#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
    rotator: Arc<ModelRotator>,
}

impl AppState {
    /// Creates a new `AppState` with the given database connection and rotator.
    pub fn new(db: DatabaseConnection, rotator: Arc<ModelRotator>) -> Self {
        Self { db, rotator }
    }

    /// Returns a shared reference to the internal `DatabaseConnection`.
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Returns a shared reference to the credential pool.
    pub fn rotator(&self) -> &ModelRotator {
        &self.rotator
    }

    /// Returns a cloned copy of the database connection.
    ///
    /// Useful for async contexts or spawning tasks that require ownership.
    pub fn db_clone(&self) -> DatabaseConnection {
        self.db.clone()
    }

    /// Returns a cloned handle to the credential pool.
    pub fn rotator_clone(&self) -> Arc<ModelRotator> {
        self.rotator.clone()
    }
}
