use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, Set};

use crate::models::question::RegionCategory;

/// One student's answer to one question.
///
/// There is at most one row per (question_id, student_id); every writer goes
/// through [`Model::find_or_create`] or looks the pair up first. A null
/// `marks_obtained` means ungraded — it is distinct from 0.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "question_responses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub question_id: i64,
    pub student_id: i64,
    pub answer_text: Option<String>,
    pub marks_obtained: Option<f64>,
    pub reasoning: Option<String>,
    pub query: Option<String>,
    pub ans_text_images: Option<String>,
    pub ans_table_images: Option<String>,
    pub ans_diagram_images: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::question::Entity",
        from = "Column::QuestionId",
        to = "super::question::Column::Id"
    )]
    Question,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::StudentId",
        to = "super::user::Column::Id"
    )]
    Student,
}

impl Related<super::question::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Question.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

fn decode_list(raw: Option<&String>) -> Vec<String> {
    raw.map(|s| serde_json::from_str(s).unwrap_or_default())
        .unwrap_or_default()
}

fn encode_list(paths: &[String]) -> Option<String> {
    serde_json::to_string(paths).ok()
}

impl Model {
    pub async fn find_by_question_and_student(
        db: &DatabaseConnection,
        question_id: i64,
        student_id: i64,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::QuestionId.eq(question_id))
            .filter(Column::StudentId.eq(student_id))
            .one(db)
            .await
    }

    pub async fn find_or_create(
        db: &DatabaseConnection,
        question_id: i64,
        student_id: i64,
    ) -> Result<Model, DbErr> {
        if let Some(existing) =
            Self::find_by_question_and_student(db, question_id, student_id).await?
        {
            return Ok(existing);
        }

        let active_model = ActiveModel {
            question_id: Set(question_id),
            student_id: Set(student_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        active_model.insert(db).await
    }

    /// All responses of one student across an exam's questions.
    pub async fn find_by_questions_and_student(
        db: &DatabaseConnection,
        question_ids: &[i64],
        student_id: i64,
    ) -> Result<Vec<Model>, DbErr> {
        if question_ids.is_empty() {
            return Ok(Vec::new());
        }

        Entity::find()
            .filter(Column::QuestionId.is_in(question_ids.iter().copied()))
            .filter(Column::StudentId.eq(student_id))
            .all(db)
            .await
    }

    pub async fn find_by_question(
        db: &DatabaseConnection,
        question_id: i64,
    ) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::QuestionId.eq(question_id))
            .all(db)
            .await
    }

    pub async fn set_answer_text(
        db: &DatabaseConnection,
        response_id: i64,
        answer_text: &str,
    ) -> Result<Model, DbErr> {
        let response = Entity::find_by_id(response_id)
            .one(db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound("Question response not found".to_string()))?;

        let mut active_model: ActiveModel = response.into();
        active_model.answer_text = Set(Some(answer_text.to_owned()));
        active_model.update(db).await
    }

    /// Overwrites the grade and reasoning. `marks` of `None` resets the
    /// response to ungraded.
    pub async fn set_marks(
        db: &DatabaseConnection,
        response_id: i64,
        marks: Option<f64>,
        reasoning: Option<&str>,
    ) -> Result<Model, DbErr> {
        let response = Entity::find_by_id(response_id)
            .one(db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound("Question response not found".to_string()))?;

        let mut active_model: ActiveModel = response.into();
        active_model.marks_obtained = Set(marks);
        if let Some(reasoning) = reasoning {
            active_model.reasoning = Set(Some(reasoning.to_owned()));
        }
        active_model.update(db).await
    }

    pub async fn set_query(
        db: &DatabaseConnection,
        response_id: i64,
        query: &str,
    ) -> Result<Model, DbErr> {
        let response = Entity::find_by_id(response_id)
            .one(db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound("Question response not found".to_string()))?;

        let mut active_model: ActiveModel = response.into();
        active_model.query = Set(Some(query.to_owned()));
        active_model.update(db).await
    }

    pub fn answer_images(&self, category: RegionCategory) -> Vec<String> {
        let column = match category {
            RegionCategory::Text => self.ans_text_images.as_ref(),
            RegionCategory::Table => self.ans_table_images.as_ref(),
            RegionCategory::Diagram => self.ans_diagram_images.as_ref(),
        };
        decode_list(column)
    }

    /// Every stored answer-region image path, all categories.
    pub fn all_answer_images(&self) -> Vec<String> {
        let mut paths = self.answer_images(RegionCategory::Text);
        paths.extend(self.answer_images(RegionCategory::Table));
        paths.extend(self.answer_images(RegionCategory::Diagram));
        paths
    }

    pub async fn append_answer_images(
        db: &DatabaseConnection,
        response_id: i64,
        category: RegionCategory,
        new_paths: &[String],
    ) -> Result<Model, DbErr> {
        let response = Entity::find_by_id(response_id)
            .one(db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound("Question response not found".to_string()))?;

        let mut paths = response.answer_images(category);
        paths.extend_from_slice(new_paths);
        let encoded = encode_list(&paths);

        let mut active_model: ActiveModel = response.into();
        match category {
            RegionCategory::Text => active_model.ans_text_images = Set(encoded),
            RegionCategory::Table => active_model.ans_table_images = Set(encoded),
            RegionCategory::Diagram => active_model.ans_diagram_images = Set(encoded),
        }
        active_model.update(db).await
    }
}
