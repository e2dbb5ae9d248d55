use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set};

/// Represents an account in the `users` table.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Primary key ID (auto-incremented).
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Unique email address, used as the login identifier.
    pub email: String,
    /// Name shown in evaluation views.
    pub display_name: String,
    /// Securely hashed password string.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Capability bit: professors may run extraction and grading.
    pub professor: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::answer_script::Entity")]
    AnswerScripts,
    #[sea_orm(has_many = "super::question_response::Entity")]
    QuestionResponses,
}

impl Related<super::answer_script::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AnswerScripts.def()
    }
}

impl Related<super::question_response::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::QuestionResponses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create(
        db: &DatabaseConnection,
        email: &str,
        display_name: &str,
        password: &str,
        professor: bool,
    ) -> Result<Model, DbErr> {
        let now = Utc::now();

        let active_model = ActiveModel {
            email: Set(email.to_owned()),
            display_name: Set(display_name.to_owned()),
            password_hash: Set(Self::hash_password(password)?),
            professor: Set(professor),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        active_model.insert(db).await
    }

    pub async fn find_by_email(
        db: &DatabaseConnection,
        email: &str,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find().filter(Column::Email.eq(email)).one(db).await
    }

    /// Looks up the account and checks the password, returning the user only
    /// when both succeed. An unknown email and a wrong password are
    /// indistinguishable to the caller.
    pub async fn verify_credentials(
        db: &DatabaseConnection,
        email: &str,
        password: &str,
    ) -> Result<Option<Model>, DbErr> {
        if let Some(user) = Self::find_by_email(db, email).await? {
            if user.verify_password(password) {
                return Ok(Some(user));
            }
        }

        Ok(None)
    }

    pub fn hash_password(password: &str) -> Result<String, DbErr> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| DbErr::Custom(format!("password hashing failed: {}", e)))?
            .to_string();

        Ok(hash)
    }

    pub fn verify_password(&self, password: &str) -> bool {
        let parsed = match PasswordHash::new(&self.password_hash) {
            Ok(parsed) => parsed,
            Err(_) => return false,
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::setup_test_db;

    use super::*;

    #[tokio::test]
    async fn verify_credentials_accepts_only_the_right_password() {
        let db = setup_test_db().await;
        Model::create(&db, "prof@example.com", "Prof", "s3cret", true)
            .await
            .unwrap();

        let found = Model::verify_credentials(&db, "prof@example.com", "s3cret")
            .await
            .unwrap();
        assert!(found.is_some());
        assert!(found.unwrap().professor);

        let wrong = Model::verify_credentials(&db, "prof@example.com", "nope")
            .await
            .unwrap();
        assert!(wrong.is_none());

        let unknown = Model::verify_credentials(&db, "ghost@example.com", "s3cret")
            .await
            .unwrap();
        assert!(unknown.is_none());
    }

    #[tokio::test]
    async fn password_hashes_are_salted() {
        let first = Model::hash_password("same").unwrap();
        let second = Model::hash_password("same").unwrap();
        assert_ne!(first, second);
    }
}
