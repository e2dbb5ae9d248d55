//! AI grading of a single question response.
//!
//! The model sees the question, the student's answer (text and/or cropped
//! images), and whatever grading material the professor supplied: an ideal
//! answer, a marking scheme, or both. Its reply is parsed for a
//! `Grade: X` / `Reason:` pair; a grade outside `[0, max_marks]` or a reply
//! with no readable grade is rejected, never clamped, and a rejected grade
//! is never persisted.

use ai::Part;
use db::models::question::{self, RegionCategory};
use db::models::question_response;
use grader::parsers::grade_reply::{ParsedGrade, parse_grade_reply, validate_grade};
use grader::prompts::{self, AttachmentNote, GradingInputs};
use sea_orm::{DatabaseConnection, DbErr};
use serde::Serialize;
use util::state::AppState;

use super::extraction::ExtractError;
use super::regions::upload_batch;

/// Outcome of one grading call.
///
/// `grade` is `None` when the reply had no parseable grade or the value was
/// out of range; the raw reply is kept so callers can log or display it.
#[derive(Debug, Clone, Serialize)]
pub struct GradeReport {
    pub grade: Option<f64>,
    pub reasoning: String,
    pub raw_response: String,
}

/// Everything one grading call needs. Image slices hold stored file paths.
pub struct GradingRequest<'a> {
    pub question_text: &'a str,
    pub max_marks: i32,
    pub student_answer: Option<&'a str>,
    pub ideal_answer: Option<&'a str>,
    pub marking_scheme: Option<&'a str>,
    pub diagram_images: &'a [String],
    pub table_images: &'a [String],
    pub scheme_images: &'a [String],
}

/// Grades one answer against the supplied material.
///
/// Requires an answer (text or images) and at least one grading material
/// (ideal answer, marking scheme, or scheme images); anything less is a
/// validation error before the model is ever called.
pub async fn grade_response(
    state: &AppState,
    request: &GradingRequest<'_>,
) -> Result<GradeReport, ExtractError> {
    let has_answer = request.student_answer.is_some_and(|s| !s.trim().is_empty())
        || !request.diagram_images.is_empty()
        || !request.table_images.is_empty();
    let has_material = request.ideal_answer.is_some_and(|s| !s.trim().is_empty())
        || request.marking_scheme.is_some_and(|s| !s.trim().is_empty())
        || !request.scheme_images.is_empty();
    if !has_answer || !has_material {
        return Err(ExtractError::Validation(
            "Missing required parameters. Provide a student answer and at least one of ideal \
             answer or marking scheme."
                .to_string(),
        ));
    }

    let prompt = prompts::grading_prompt(&GradingInputs {
        question_text: request.question_text,
        max_marks: request.max_marks,
        student_answer: request.student_answer.filter(|s| !s.trim().is_empty()),
        ideal_answer: request.ideal_answer.filter(|s| !s.trim().is_empty()),
        marking_scheme: request.marking_scheme.filter(|s| !s.trim().is_empty()),
        attachments: AttachmentNote::from_presence(
            !request.diagram_images.is_empty(),
            !request.table_images.is_empty(),
        ),
    });

    let client = state.rotator().acquire_model();
    let image_paths = request
        .diagram_images
        .iter()
        .chain(request.table_images.iter())
        .chain(request.scheme_images.iter())
        .map(|p| p.as_str());
    let uploaded = upload_batch(client, image_paths).await;

    let mut parts: Vec<Part> = uploaded.iter().map(|(_, file)| Part::file(file)).collect();
    parts.push(Part::text(prompt));

    let raw_response = client.generate(parts).await?;
    let reply = parse_grade_reply(&raw_response);
    let grade = validate_grade(&reply.grade, f64::from(request.max_marks));

    match &reply.grade {
        ParsedGrade::Value(value) if grade.is_none() => {
            tracing::warn!(
                grade = value,
                max_marks = request.max_marks,
                "grade outside valid range, rejecting"
            );
        }
        ParsedGrade::Unparsed => {
            tracing::warn!(reply = %raw_response, "reply carried no parseable grade");
        }
        _ => {}
    }

    Ok(GradeReport {
        grade,
        reasoning: reply.reasoning,
        raw_response,
    })
}

/// Grades a stored response from its question's stored materials: answer
/// text plus cropped answer images, against the ideal answer and either the
/// marking-scheme text or (when no text exists) the scheme crops.
pub async fn grade_stored_response(
    state: &AppState,
    question: &question::Model,
    response: &question_response::Model,
) -> Result<GradeReport, ExtractError> {
    let diagram_images = response.answer_images(RegionCategory::Diagram);
    let table_images = response.answer_images(RegionCategory::Table);
    let scheme_images = match question
        .ideal_marking_scheme
        .as_deref()
        .filter(|s| !s.trim().is_empty())
    {
        Some(_) => Vec::new(),
        None => question.all_marking_images(),
    };

    grade_response(
        state,
        &GradingRequest {
            question_text: &question.text,
            max_marks: question.max_marks,
            student_answer: response.answer_text.as_deref(),
            ideal_answer: question.ideal_answer.as_deref(),
            marking_scheme: question.ideal_marking_scheme.as_deref(),
            diagram_images: &diagram_images,
            table_images: &table_images,
            scheme_images: &scheme_images,
        },
    )
    .await
}

/// Writes an accepted grade onto the existing response for
/// `(question, student)`.
///
/// Grading never creates response rows; uploading the answer sheet does.
/// Returns whether anything was persisted: `false` when the grade was
/// rejected or no row exists.
pub async fn persist_grade(
    db: &DatabaseConnection,
    question_id: i64,
    student_id: i64,
    report: &GradeReport,
) -> Result<bool, DbErr> {
    let Some(grade) = report.grade else {
        return Ok(false);
    };
    let Some(response) =
        question_response::Model::find_by_question_and_student(db, question_id, student_id).await?
    else {
        tracing::warn!(question_id, student_id, "no response row to persist grade into");
        return Ok(false);
    };

    question_response::Model::set_marks(db, response.id, Some(grade), Some(&report.reasoning))
        .await?;
    Ok(true)
}
