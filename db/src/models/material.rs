use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, DeriveActiveEnum, Set};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// An exam document uploaded by a professor (question paper, solution script
/// or marking scheme; student answer sheets live in `answer_script`).
///
/// `title` is the original filename. The (title, related_exam_id, file_type)
/// triple identifies a document, so re-uploading the same file reuses the row
/// and its `extracted_text` instead of calling the vision API again.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "materials")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub file_path: Option<String>,
    pub file_size: Option<i64>,
    pub related_exam_id: i64,
    pub author_id: Option<i64>,
    pub extracted_text: Option<String>,
    pub file_type: MaterialType,
    pub created_at: DateTime<Utc>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "material_type")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum MaterialType {
    #[sea_orm(string_value = "question_paper")]
    QuestionPaper,

    #[sea_orm(string_value = "solution_script")]
    SolutionScript,

    #[sea_orm(string_value = "marking_scheme")]
    MarkingScheme,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::exam::Entity",
        from = "Column::RelatedExamId",
        to = "super::exam::Column::Id"
    )]
    Exam,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id"
    )]
    Author,
}

impl Related<super::exam::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Exam.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn find_by_key(
        db: &DatabaseConnection,
        exam_id: i64,
        title: &str,
        file_type: MaterialType,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::RelatedExamId.eq(exam_id))
            .filter(Column::Title.eq(title))
            .filter(Column::FileType.eq(file_type))
            .one(db)
            .await
    }

    pub async fn create(
        db: &DatabaseConnection,
        exam_id: i64,
        title: &str,
        file_type: MaterialType,
        author_id: Option<i64>,
    ) -> Result<Model, DbErr> {
        let active_model = ActiveModel {
            title: Set(title.to_owned()),
            related_exam_id: Set(exam_id),
            author_id: Set(author_id),
            file_type: Set(file_type),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        active_model.insert(db).await
    }

    pub async fn find_by_exam_and_type(
        db: &DatabaseConnection,
        exam_id: i64,
        file_type: MaterialType,
    ) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::RelatedExamId.eq(exam_id))
            .filter(Column::FileType.eq(file_type))
            .all(db)
            .await
    }

    pub async fn set_file(
        db: &DatabaseConnection,
        material_id: i64,
        file_path: &str,
        file_size: i64,
    ) -> Result<Model, DbErr> {
        let material = Entity::find_by_id(material_id)
            .one(db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound("Material not found".to_string()))?;

        let mut active_model: ActiveModel = material.into();
        active_model.file_path = Set(Some(file_path.to_owned()));
        active_model.file_size = Set(Some(file_size));
        active_model.update(db).await
    }

    pub async fn set_extracted_text(
        db: &DatabaseConnection,
        material_id: i64,
        text: &str,
    ) -> Result<Model, DbErr> {
        let material = Entity::find_by_id(material_id)
            .one(db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound("Material not found".to_string()))?;

        let mut active_model: ActiveModel = material.into();
        active_model.extracted_text = Set(Some(text.to_owned()));
        active_model.update(db).await
    }
}
