//! Shared helpers for tests that need a migrated database.

use migration::Migrator;
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use crate::models::{classroom, exam, user};

/// Fresh in-memory SQLite database with all migrations applied.
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory db");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// Inserts a professor account with a known password (`"password1"`).
pub async fn seed_professor(db: &DatabaseConnection, email: &str) -> user::Model {
    user::Model::create(db, email, "Test Professor", "password1", true)
        .await
        .expect("Failed to seed professor")
}

/// Inserts a student account with a known password (`"password1"`).
pub async fn seed_student(db: &DatabaseConnection, email: &str) -> user::Model {
    user::Model::create(db, email, "Test Student", "password1", false)
        .await
        .expect("Failed to seed student")
}

/// Inserts a classroom owned by `created_by` and one exam inside it.
pub async fn seed_exam(db: &DatabaseConnection, created_by: i64, title: &str) -> exam::Model {
    let classroom = classroom::Model::create(db, "Test Classroom", None, created_by)
        .await
        .expect("Failed to seed classroom");

    exam::Model::create(db, classroom.id, title, None, 100)
        .await
        .expect("Failed to seed exam")
}
