use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, Set};

/// Represents an exam in the `exams` table.
///
/// `exam_stage` tracks where the exam sits in the grading workflow as a bare
/// integer (0 = question upload through 7 = graded by convention). The value
/// is advanced by the frontend and deliberately carries no transition rules,
/// so a professor can always move an exam backwards to redo a step.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "exams")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub classroom_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub points_possible: i32,
    pub exam_stage: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::classroom::Entity",
        from = "Column::ClassroomId",
        to = "super::classroom::Column::Id"
    )]
    Classroom,
    #[sea_orm(has_many = "super::question::Entity")]
    Questions,
    #[sea_orm(has_many = "super::material::Entity")]
    Materials,
    #[sea_orm(has_many = "super::answer_script::Entity")]
    AnswerScripts,
    #[sea_orm(has_many = "super::exam_result::Entity")]
    Results,
}

impl Related<super::classroom::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Classroom.def()
    }
}

impl Related<super::question::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Questions.def()
    }
}

impl Related<super::material::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Materials.def()
    }
}

impl Related<super::answer_script::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AnswerScripts.def()
    }
}

impl Related<super::exam_result::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Results.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create(
        db: &DatabaseConnection,
        classroom_id: i64,
        title: &str,
        description: Option<&str>,
        points_possible: i32,
    ) -> Result<Model, DbErr> {
        let active_model = ActiveModel {
            classroom_id: Set(classroom_id),
            title: Set(title.to_owned()),
            description: Set(description.map(str::to_owned)),
            points_possible: Set(points_possible),
            exam_stage: Set(0),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        active_model.insert(db).await
    }

    pub async fn set_stage(
        db: &DatabaseConnection,
        exam_id: i64,
        stage: i32,
    ) -> Result<Model, DbErr> {
        let exam = Entity::find_by_id(exam_id)
            .one(db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound("Exam not found".to_string()))?;

        let mut active_model: ActiveModel = exam.into();
        active_model.exam_stage = Set(stage);
        active_model.update(db).await
    }
}
