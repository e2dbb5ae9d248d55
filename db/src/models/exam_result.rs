use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, Set};

/// Aggregated total of one student over one exam.
///
/// `marks_obtained` is always the sum of that student's non-null response
/// marks; it is recomputed after every grading mutation and never edited by
/// hand, so there is exactly one row per (exam_id, student_id).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "exam_results")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub exam_id: i64,
    pub student_id: i64,
    pub marks_obtained: f64,
    pub feedback: Option<String>,
    pub graded_by: Option<i64>,
    pub graded_at: Option<DateTime<Utc>>,
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

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn find_by_exam_and_student(
        db: &DatabaseConnection,
        exam_id: i64,
        student_id: i64,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::ExamId.eq(exam_id))
            .filter(Column::StudentId.eq(student_id))
            .one(db)
            .await
    }

    /// Writes the aggregate for (exam, student), updating the existing row or
    /// inserting the first one. Stamps `graded_by` and `graded_at`.
    pub async fn upsert_total(
        db: &DatabaseConnection,
        exam_id: i64,
        student_id: i64,
        marks_obtained: f64,
        graded_by: Option<i64>,
    ) -> Result<Model, DbErr> {
        let now = Utc::now();

        match Self::find_by_exam_and_student(db, exam_id, student_id).await? {
            Some(existing) => {
                let mut active_model: ActiveModel = existing.into();
                active_model.marks_obtained = Set(marks_obtained);
                active_model.graded_by = Set(graded_by);
                active_model.graded_at = Set(Some(now));
                active_model.update(db).await
            }
            None => {
                let active_model = ActiveModel {
                    exam_id: Set(exam_id),
                    student_id: Set(student_id),
                    marks_obtained: Set(marks_obtained),
                    graded_by: Set(graded_by),
                    graded_at: Set(Some(now)),
                    ..Default::default()
                };
                active_model.insert(db).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::EntityTrait;

    use crate::test_utils::{seed_exam, seed_professor, seed_student, setup_test_db};

    use super::*;

    #[tokio::test]
    async fn upsert_total_keeps_a_single_row() {
        let db = setup_test_db().await;
        let professor = seed_professor(&db, "prof@example.com").await;
        let student = seed_student(&db, "student@example.com").await;
        let exam = seed_exam(&db, professor.id, "Midterm").await;

        let first = Model::upsert_total(&db, exam.id, student.id, 13.0, Some(professor.id))
            .await
            .unwrap();
        let second = Model::upsert_total(&db, exam.id, student.id, 16.0, Some(professor.id))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.marks_obtained, 16.0);
        assert_eq!(Entity::find().all(&db).await.unwrap().len(), 1);
    }
}
