//! Full-document text extraction.
//!
//! One uploaded exam document (question paper, solution script, marking
//! scheme, or a student's answer sheet) flows through here: cache check,
//! persist to disk, upload to the vision API, type-specific prompt, and
//! write-back of the extracted text. Each document is processed on its own
//! so one bad file never aborts its siblings; the handler collects a
//! per-file outcome either way.

use std::fmt;

use ai::{AiError, Part};
use db::models::{answer_script, material, question};
use grader::labels::leaves_of;
use grader::prompts::{self, DocumentType};
use sea_orm::DbErr;
use util::state::AppState;
use util::{config, paths};

/// Everything that can go wrong for a single document.
#[derive(Debug)]
pub enum ExtractError {
    /// The request itself was malformed (bad document type, missing student).
    Validation(String),
    /// A referenced row does not exist.
    NotFound(String),
    /// Writing the uploaded bytes to storage failed.
    Io(std::io::Error),
    /// The vision API refused the upload or the generation call.
    Ai(AiError),
    /// Database read or write failed.
    Db(DbErr),
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractError::Validation(msg) => write!(f, "{msg}"),
            ExtractError::NotFound(msg) => write!(f, "{msg}"),
            ExtractError::Io(e) => write!(f, "storage error: {e}"),
            ExtractError::Ai(e) => write!(f, "vision API error: {e}"),
            ExtractError::Db(e) => write!(f, "database error: {e}"),
        }
    }
}

impl std::error::Error for ExtractError {}

impl From<AiError> for ExtractError {
    fn from(e: AiError) -> Self {
        ExtractError::Ai(e)
    }
}

impl From<DbErr> for ExtractError {
    fn from(e: DbErr) -> Self {
        ExtractError::Db(e)
    }
}

impl From<std::io::Error> for ExtractError {
    fn from(e: std::io::Error) -> Self {
        ExtractError::Io(e)
    }
}

/// Fallback text stored when the model returns an empty reply, so the cache
/// check can tell "extraction ran and found nothing" from "never extracted".
pub const NO_TEXT_EXTRACTED: &str = "No text extracted.";

/// Extracts the text of one uploaded document and stores it.
///
/// Re-uploading a document that already has extracted text is a cache hit:
/// the stored text comes back without touching storage or the vision API.
/// Identity is `(exam, title, file_type)` for materials and
/// `(exam, student, title)` for answer sheets, so `student_id` is required
/// exactly when `document_type` is [`DocumentType::AnswerSheet`].
pub async fn extract_document(
    state: &AppState,
    exam_id: i64,
    document_type: DocumentType,
    filename: &str,
    bytes: Vec<u8>,
    student_id: Option<i64>,
    author_id: Option<i64>,
) -> Result<String, ExtractError> {
    match document_type {
        DocumentType::AnswerSheet => {
            let student_id = student_id.ok_or_else(|| {
                ExtractError::Validation(
                    "student_id is required when uploading an answer sheet".to_string(),
                )
            })?;
            extract_answer_script(state, exam_id, student_id, filename, bytes).await
        }
        _ => extract_material(state, exam_id, document_type, filename, bytes, author_id).await,
    }
}

async fn extract_material(
    state: &AppState,
    exam_id: i64,
    document_type: DocumentType,
    filename: &str,
    bytes: Vec<u8>,
    author_id: Option<i64>,
) -> Result<String, ExtractError> {
    let db = state.db();
    let file_type = material_type_for(document_type)?;

    let existing = material::Model::find_by_key(db, exam_id, filename, file_type).await?;
    if let Some(text) = existing
        .as_ref()
        .and_then(|m| m.extracted_text.as_ref())
        .filter(|t| !t.is_empty())
    {
        tracing::info!(exam_id, filename, "extraction cache hit, returning stored text");
        return Ok(text.clone());
    }

    let row = match existing {
        Some(row) => row,
        None => material::Model::create(db, exam_id, filename, file_type, author_id).await?,
    };

    let path = paths::material_path(exam_id, &row.id.to_string(), filename);
    paths::ensure_parent_dir(&path)?;
    tokio::fs::write(&path, &bytes).await?;
    material::Model::set_file(db, row.id, &path.to_string_lossy(), bytes.len() as i64).await?;

    // The question-paper prompt can anchor on already-known part labels.
    let leaf_labels = match document_type {
        DocumentType::QuestionPaper => known_leaf_labels(state, exam_id).await?,
        _ => None,
    };

    let text = run_extraction(state, document_type, filename, bytes, leaf_labels).await?;
    material::Model::set_extracted_text(db, row.id, &text).await?;
    Ok(text)
}

async fn extract_answer_script(
    state: &AppState,
    exam_id: i64,
    student_id: i64,
    filename: &str,
    bytes: Vec<u8>,
) -> Result<String, ExtractError> {
    let db = state.db();

    let existing = answer_script::Model::find_by_key(db, exam_id, student_id, filename).await?;
    if let Some(text) = existing
        .as_ref()
        .and_then(|s| s.extracted_text.as_ref())
        .filter(|t| !t.is_empty())
    {
        tracing::info!(
            exam_id,
            student_id,
            filename,
            "extraction cache hit, returning stored text"
        );
        return Ok(text.clone());
    }

    let row = match existing {
        Some(row) => row,
        None => answer_script::Model::create(db, exam_id, student_id, filename).await?,
    };

    let path = paths::answer_script_path(exam_id, student_id, &row.id.to_string(), filename);
    paths::ensure_parent_dir(&path)?;
    tokio::fs::write(&path, &bytes).await?;
    answer_script::Model::set_file(db, row.id, &path.to_string_lossy(), bytes.len() as i64)
        .await?;

    let text = run_extraction(state, DocumentType::AnswerSheet, filename, bytes, None).await?;
    answer_script::Model::set_extracted_text(db, row.id, &text).await?;
    Ok(text)
}

/// Uploads the document and asks the model for its text. Empty replies are
/// normalized to [`NO_TEXT_EXTRACTED`] so they register as cache hits later.
async fn run_extraction(
    state: &AppState,
    document_type: DocumentType,
    filename: &str,
    bytes: Vec<u8>,
    leaf_labels: Option<Vec<String>>,
) -> Result<String, ExtractError> {
    let client = state.rotator().acquire_model();
    let mime = mime_guess::from_path(filename).first_or_octet_stream();

    let file = client.upload_file(bytes, filename, mime.as_ref()).await?;
    let prompt = prompts::extraction_prompt(document_type, leaf_labels.as_deref());
    let reply = client.generate(vec![Part::file(&file), Part::text(prompt)]).await?;

    let text = if reply.trim().is_empty() {
        tracing::warn!(
            filename,
            model = %config::gemini_model(),
            "model returned no text for document"
        );
        NO_TEXT_EXTRACTED.to_string()
    } else {
        reply
    };
    Ok(text)
}

/// Collects the leaf part labels of every question already on the exam.
/// `None` when the exam has no labelled questions yet.
async fn known_leaf_labels(
    state: &AppState,
    exam_id: i64,
) -> Result<Option<Vec<String>>, DbErr> {
    let questions = question::Model::find_by_exam(state.db(), exam_id).await?;
    let all_labels: Vec<String> = questions
        .iter()
        .flat_map(|q| q.part_label_list())
        .collect();
    if all_labels.is_empty() {
        Ok(None)
    } else {
        Ok(Some(leaves_of(&all_labels)))
    }
}

fn material_type_for(document_type: DocumentType) -> Result<material::MaterialType, ExtractError> {
    match document_type {
        DocumentType::QuestionPaper => Ok(material::MaterialType::QuestionPaper),
        DocumentType::SolutionScript => Ok(material::MaterialType::SolutionScript),
        DocumentType::MarkingScheme => Ok(material::MaterialType::MarkingScheme),
        DocumentType::AnswerSheet => Err(ExtractError::Validation(
            "answer sheets are stored per student, not as exam materials".to_string(),
        )),
    }
}
