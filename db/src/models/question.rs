use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, QueryOrder, Set};
use strum::{Display, EnumString};

/// Represents one top-level question of an exam.
///
/// `part_labels` holds the hierarchically sorted labels belonging to this
/// question (e.g. `["1", "1.1", "1.1.a"]`) as a JSON string; the `ms_*_images`
/// columns hold JSON lists of stored marking-scheme region image paths.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "questions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub exam_id: i64,
    /// Top-level question number; duplicates are allowed because papers
    /// sometimes repeat a number.
    pub question_number: i32,
    pub text: String,
    pub ideal_answer: Option<String>,
    pub ideal_marking_scheme: Option<String>,
    pub max_marks: i32,
    pub part_labels: Option<String>,
    pub ms_text_images: Option<String>,
    pub ms_table_images: Option<String>,
    pub ms_diagram_images: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Which kind of cropped region an image holds. Also the wire value of the
/// multipart `category` field on the region-upload routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum RegionCategory {
    Text,
    Table,
    Diagram,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::exam::Entity",
        from = "Column::ExamId",
        to = "super::exam::Column::Id"
    )]
    Exam,
    #[sea_orm(has_many = "super::question_response::Entity")]
    Responses,
}

impl Related<super::exam::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Exam.def()
    }
}

impl Related<super::question_response::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Responses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Decodes a JSON-list column, treating null and garbage as empty.
fn decode_list(raw: Option<&String>) -> Vec<String> {
    raw.map(|s| serde_json::from_str(s).unwrap_or_default())
        .unwrap_or_default()
}

fn encode_list(paths: &[String]) -> Option<String> {
    serde_json::to_string(paths).ok()
}

impl Model {
    pub async fn create(
        db: &DatabaseConnection,
        exam_id: i64,
        question_number: i32,
        text: &str,
        max_marks: i32,
        part_labels: Option<&[String]>,
    ) -> Result<Model, DbErr> {
        let active_model = ActiveModel {
            exam_id: Set(exam_id),
            question_number: Set(question_number),
            text: Set(text.to_owned()),
            max_marks: Set(max_marks),
            part_labels: Set(part_labels.and_then(encode_list)),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        active_model.insert(db).await
    }

    /// All questions of an exam, ordered by question number.
    pub async fn find_by_exam(db: &DatabaseConnection, exam_id: i64) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::ExamId.eq(exam_id))
            .order_by_asc(Column::QuestionNumber)
            .all(db)
            .await
    }

    /// Deletes every question of an exam (responses cascade). Returns the
    /// number of removed rows.
    pub async fn delete_by_exam(db: &DatabaseConnection, exam_id: i64) -> Result<u64, DbErr> {
        let result = Entity::delete_many()
            .filter(Column::ExamId.eq(exam_id))
            .exec(db)
            .await?;

        Ok(result.rows_affected)
    }

    pub fn part_label_list(&self) -> Vec<String> {
        decode_list(self.part_labels.as_ref())
    }

    pub fn marking_images(&self, category: RegionCategory) -> Vec<String> {
        let column = match category {
            RegionCategory::Text => self.ms_text_images.as_ref(),
            RegionCategory::Table => self.ms_table_images.as_ref(),
            RegionCategory::Diagram => self.ms_diagram_images.as_ref(),
        };
        decode_list(column)
    }

    /// Every stored marking-scheme image path, all categories.
    pub fn all_marking_images(&self) -> Vec<String> {
        let mut paths = self.marking_images(RegionCategory::Text);
        paths.extend(self.marking_images(RegionCategory::Table));
        paths.extend(self.marking_images(RegionCategory::Diagram));
        paths
    }

    pub async fn append_marking_images(
        db: &DatabaseConnection,
        question_id: i64,
        category: RegionCategory,
        new_paths: &[String],
    ) -> Result<Model, DbErr> {
        let question = Entity::find_by_id(question_id)
            .one(db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound("Question not found".to_string()))?;

        let mut paths = question.marking_images(category);
        paths.extend_from_slice(new_paths);
        let encoded = encode_list(&paths);

        let mut active_model: ActiveModel = question.into();
        match category {
            RegionCategory::Text => active_model.ms_text_images = Set(encoded),
            RegionCategory::Table => active_model.ms_table_images = Set(encoded),
            RegionCategory::Diagram => active_model.ms_diagram_images = Set(encoded),
        }
        active_model.update(db).await
    }

    pub async fn set_marking_scheme(
        db: &DatabaseConnection,
        question_id: i64,
        scheme: &str,
    ) -> Result<Model, DbErr> {
        let question = Entity::find_by_id(question_id)
            .one(db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound("Question not found".to_string()))?;

        let mut active_model: ActiveModel = question.into();
        active_model.ideal_marking_scheme = Set(Some(scheme.to_owned()));
        active_model.update(db).await
    }
}
