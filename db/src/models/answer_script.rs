use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, Set};

/// A student's scanned answer sheet for one exam.
///
/// Identified by (exam_id, student_id, title) the same way materials are, so
/// re-uploading a sheet whose text is already extracted is a cache hit.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "answer_scripts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    pub file_path: Option<String>,
    pub file_size: Option<i64>,
    pub exam_id: i64,
    pub student_id: i64,
    pub extracted_text: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::exam::Entity",
        from = "Column::ExamId",
        to = "super::exam::Column::Id"
    )]
    Exam,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::StudentId",
        to = "super::user::Column::Id"
    )]
    Student,
}

impl Related<super::exam::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Exam.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn find_by_key(
        db: &DatabaseConnection,
        exam_id: i64,
        student_id: i64,
        title: &str,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::ExamId.eq(exam_id))
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::Title.eq(title))
            .one(db)
            .await
    }

    pub async fn create(
        db: &DatabaseConnection,
        exam_id: i64,
        student_id: i64,
        title: &str,
    ) -> Result<Model, DbErr> {
        let active_model = ActiveModel {
            title: Set(title.to_owned()),
            exam_id: Set(exam_id),
            student_id: Set(student_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        active_model.insert(db).await
    }

    pub async fn find_by_exam_and_student(
        db: &DatabaseConnection,
        exam_id: i64,
        student_id: i64,
    ) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::ExamId.eq(exam_id))
            .filter(Column::StudentId.eq(student_id))
            .all(db)
            .await
    }

    pub async fn set_file(
        db: &DatabaseConnection,
        script_id: i64,
        file_path: &str,
        file_size: i64,
    ) -> Result<Model, DbErr> {
        let script = Entity::find_by_id(script_id)
            .one(db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound("Answer script not found".to_string()))?;

        let mut active_model: ActiveModel = script.into();
        active_model.file_path = Set(Some(file_path.to_owned()));
        active_model.file_size = Set(Some(file_size));
        active_model.update(db).await
    }

    pub async fn set_extracted_text(
        db: &DatabaseConnection,
        script_id: i64,
        text: &str,
    ) -> Result<Model, DbErr> {
        let script = Entity::find_by_id(script_id)
            .one(db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound("Answer script not found".to_string()))?;

        let mut active_model: ActiveModel = script.into();
        active_model.extracted_text = Set(Some(text.to_owned()));
        active_model.update(db).await
    }
}
