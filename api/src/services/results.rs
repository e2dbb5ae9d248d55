//! Exam result aggregation.
//!
//! The stored total is never trusted to stay in sync on its own: every
//! mutation of a `QuestionResponse` (AI grade, manual edit, drop, full
//! marks, re-evaluation) is followed by a synchronous call to
//! [`recompute_exam_result`], which re-derives the total from the response
//! rows and upserts the single `ExamResult` row for that student.

use db::models::{exam_result, question, question_response};
use sea_orm::{DatabaseConnection, DbErr};

/// Re-derives a student's exam total and writes it through.
///
/// The total is the sum of `marks_obtained` over the student's responses to
/// this exam's questions; ungraded responses (`None`) contribute nothing. A
/// student with no graded responses still gets a result row with a zero
/// total, so the result table always reflects the last recompute.
pub async fn recompute_exam_result(
    db: &DatabaseConnection,
    exam_id: i64,
    student_id: i64,
    graded_by: Option<i64>,
) -> Result<exam_result::Model, DbErr> {
    let questions = question::Model::find_by_exam(db, exam_id).await?;
    let question_ids: Vec<i64> = questions.iter().map(|q| q.id).collect();

    let responses =
        question_response::Model::find_by_questions_and_student(db, &question_ids, student_id)
            .await?;
    let total: f64 = responses.iter().filter_map(|r| r.marks_obtained).sum();

    exam_result::Model::upsert_total(db, exam_id, student_id, total, graded_by).await
}
