//! Region-image pipelines: label discovery and batched text extraction.
//!
//! Professors annotate scanned pages with cropped regions. Three pipelines
//! consume those crops:
//!
//! * label discovery reads question/part labels off question-paper pages and
//!   rebuilds the exam's question list;
//! * answer-region extraction turns a student's cropped answer images into
//!   `answer_text` on their responses;
//! * marking-region extraction does the same for a question's marking-scheme
//!   crops.
//!
//! The two extraction pipelines batch images five at a time into one
//! composite prompt, upload each batch's images concurrently, and reconcile
//! the reply sections back onto rows by key. A failed upload or an
//! unparseable section is logged and dropped; it never aborts the batch, and
//! a failed batch never aborts its siblings.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use ai::{GeminiClient, GeminiFile, Part};
use db::models::{question, question_response};
use futures::future::join_all;
use futures::stream::{FuturesUnordered, StreamExt};
use grader::labels::{prefix_closure, sort_hierarchical, top_level_of};
use grader::parsers::label_lines::parse_label_lines;
use grader::parsers::regions::{SectionOutcome, split_answer_sections, split_marking_sections};
use grader::prompts;
use serde::Serialize;
use util::state::AppState;

use super::extraction::ExtractError;

/// Images sent to the model in one composite call.
const BATCH_SIZE: usize = 5;

/// Summary of one question rebuilt from label discovery.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedQuestion {
    pub question_number: i32,
    pub max_marks: i32,
    pub part_labels: Vec<String>,
}

/// One response whose answer text was rebuilt from region images.
#[derive(Debug, Clone, Serialize)]
pub struct RegionAnswer {
    pub response_id: i64,
    pub question_id: i64,
    pub answer_text: String,
}

/// One question whose marking scheme was rebuilt from region images.
#[derive(Debug, Clone, Serialize)]
pub struct MarkingText {
    pub question_id: i64,
    pub marking_scheme: String,
}

/// Reads question/part labels from uploaded question-paper pages and
/// replaces the exam's question list with the result.
///
/// Every page is prompted independently; pages that fail to upload or
/// produce no parseable lines are logged and skipped. The surviving labels
/// are closed under ancestor prefixes, grouped by their numeric top-level
/// component, and each group becomes one question row whose `part_labels`
/// hold the group sorted hierarchically. Max marks come from the top-level
/// label's `Max Marks` suffix, zero when the model never stated one.
///
/// When no label on any page survives parsing, the existing questions are
/// left untouched rather than wiped.
pub async fn extract_question_labels(
    state: &AppState,
    exam_id: i64,
    files: Vec<(String, Vec<u8>)>,
) -> Result<Vec<ExtractedQuestion>, ExtractError> {
    let mut labels: Vec<String> = Vec::new();
    let mut marks_by_number: HashMap<i32, i32> = HashMap::new();

    for (filename, bytes) in files {
        let client = state.rotator().acquire_model();
        let mime = mime_guess::from_path(&filename).first_or_octet_stream();

        let file = match client.upload_file(bytes, &filename, mime.as_ref()).await {
            Ok(file) => file,
            Err(e) => {
                tracing::warn!(filename, error = %e, "label page upload failed, skipping page");
                continue;
            }
        };
        let prompt = prompts::label_extraction_prompt();
        let reply = match client.generate(vec![Part::file(&file), Part::text(prompt)]).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(filename, error = %e, "label extraction failed, skipping page");
                continue;
            }
        };

        let parsed = parse_label_lines(&reply);
        for line in &parsed.rejected {
            tracing::warn!(filename, line, "dropping unparseable label line");
        }
        for line in parsed.labels {
            if let Some(marks) = line.max_marks {
                if let Ok(number) = top_level_of(&line.label).parse::<i32>() {
                    marks_by_number.insert(number, marks);
                }
            }
            labels.push(line.label);
        }
    }

    let mut groups: BTreeMap<i32, Vec<String>> = BTreeMap::new();
    for label in prefix_closure(&labels) {
        match top_level_of(&label).parse::<i32>() {
            Ok(number) => groups.entry(number).or_default().push(label),
            Err(_) => {
                tracing::warn!(label, "top-level label does not fit a question number");
            }
        }
    }

    if groups.is_empty() {
        tracing::warn!(exam_id, "no labels extracted, keeping existing questions");
        return Ok(Vec::new());
    }

    let db = state.db();
    let removed = question::Model::delete_by_exam(db, exam_id).await?;
    tracing::info!(exam_id, removed, questions = groups.len(), "replacing exam questions");

    let mut extracted = Vec::new();
    for (question_number, group) in groups {
        let part_labels = sort_hierarchical(group);
        let max_marks = marks_by_number.get(&question_number).copied().unwrap_or(0);
        question::Model::create(
            db,
            exam_id,
            question_number,
            "",
            max_marks,
            Some(&part_labels),
        )
        .await?;
        extracted.push(ExtractedQuestion {
            question_number,
            max_marks,
            part_labels,
        });
    }
    Ok(extracted)
}

/// Rebuilds `answer_text` for every response of one student on one exam
/// from the response's cropped answer images.
pub async fn extract_answer_regions(
    state: &AppState,
    exam_id: i64,
    student_id: i64,
) -> Result<Vec<RegionAnswer>, ExtractError> {
    let db = state.db();
    let questions = question::Model::find_by_exam(db, exam_id).await?;
    let question_ids: Vec<i64> = questions.iter().map(|q| q.id).collect();
    let responses =
        question_response::Model::find_by_questions_and_student(db, &question_ids, student_id)
            .await?;

    let number_by_question: HashMap<i64, i32> = questions
        .iter()
        .map(|q| (q.id, q.question_number))
        .collect();
    let mut sources = Vec::new();
    for response in &responses {
        let Some(number) = number_by_question.get(&response.question_id) else {
            continue;
        };
        for path in response.all_answer_images() {
            sources.push(AnswerSource {
                response_id: response.id,
                question_number: *number as u32,
                path,
            });
        }
    }

    let merged = run_answer_batches(state, &sources).await;

    let question_by_response: HashMap<i64, i64> = responses
        .iter()
        .map(|r| (r.id, r.question_id))
        .collect();
    let mut written = Vec::new();
    for (response_id, fragments) in merged {
        let answer_text = fragments.join("\n");
        question_response::Model::set_answer_text(db, response_id, &answer_text).await?;
        written.push(RegionAnswer {
            response_id,
            question_id: question_by_response.get(&response_id).copied().unwrap_or(0),
            answer_text,
        });
    }
    written.sort_by_key(|w| w.response_id);
    Ok(written)
}

/// Re-extracts a single response's answer text, used when a response is
/// sent for re-evaluation. `None` when the response has no region images.
pub async fn extract_single_response_regions(
    state: &AppState,
    response: &question_response::Model,
    question_number: i32,
) -> Result<Option<String>, ExtractError> {
    let sources: Vec<AnswerSource> = response
        .all_answer_images()
        .into_iter()
        .map(|path| AnswerSource {
            response_id: response.id,
            question_number: question_number as u32,
            path,
        })
        .collect();
    if sources.is_empty() {
        return Ok(None);
    }

    let mut merged = run_answer_batches(state, &sources).await;
    match merged.remove(&response.id) {
        Some(fragments) => {
            let answer_text = fragments.join("\n");
            question_response::Model::set_answer_text(state.db(), response.id, &answer_text)
                .await?;
            Ok(Some(answer_text))
        }
        None => Ok(None),
    }
}

/// Rebuilds `ideal_marking_scheme` for every question of an exam from the
/// question's cropped marking-scheme images.
pub async fn extract_marking_regions(
    state: &AppState,
    exam_id: i64,
) -> Result<Vec<MarkingText>, ExtractError> {
    let db = state.db();
    let questions = question::Model::find_by_exam(db, exam_id).await?;

    let mut sources = Vec::new();
    for question in &questions {
        for (index, path) in question.all_marking_images().into_iter().enumerate() {
            sources.push(MarkingSource {
                question_id: question.id,
                index,
                path,
            });
        }
    }

    let batches = sources.chunks(BATCH_SIZE).map(|batch| marking_batch(state, batch));
    let results = join_all(batches).await;

    let mut merged: HashMap<i64, Vec<(usize, String)>> = HashMap::new();
    for (question_id, index, body) in results.into_iter().flatten() {
        merged.entry(question_id).or_default().push((index, body));
    }

    let mut written = Vec::new();
    for (question_id, mut fragments) in merged {
        // Join in image order, not reply-arrival order.
        fragments.sort_by_key(|(index, _)| *index);
        let marking_scheme = fragments
            .into_iter()
            .map(|(_, body)| body)
            .collect::<Vec<_>>()
            .join("\n");
        question::Model::set_marking_scheme(db, question_id, &marking_scheme).await?;
        written.push(MarkingText {
            question_id,
            marking_scheme,
        });
    }
    written.sort_by_key(|w| w.question_id);
    Ok(written)
}

struct AnswerSource {
    response_id: i64,
    question_number: u32,
    path: String,
}

struct MarkingSource {
    question_id: i64,
    index: usize,
    path: String,
}

/// Runs every batch concurrently and accumulates reply fragments per
/// response id. `join_all` keeps batch order, so a response whose images
/// span two batches still gets its fragments in image order.
async fn run_answer_batches(
    state: &AppState,
    sources: &[AnswerSource],
) -> HashMap<i64, Vec<String>> {
    let batches = sources.chunks(BATCH_SIZE).map(|batch| answer_batch(state, batch));
    let results = join_all(batches).await;

    let mut merged: HashMap<i64, Vec<String>> = HashMap::new();
    for (response_id, body) in results.into_iter().flatten() {
        merged.entry(response_id).or_default().push(body);
    }
    merged
}

/// One composite call: concurrent uploads, one prompt naming each image's
/// question number, reply split back into per-response fragments.
async fn answer_batch(state: &AppState, batch: &[AnswerSource]) -> Vec<(i64, String)> {
    let client = state.rotator().acquire_model();

    let uploaded = upload_batch(client, batch.iter().map(|s| s.path.as_str())).await;
    if uploaded.is_empty() {
        return Vec::new();
    }

    let numbers: Vec<u32> = uploaded
        .iter()
        .map(|(slot, _)| batch[*slot].question_number)
        .collect();
    let mut parts: Vec<Part> = uploaded.iter().map(|(_, file)| Part::file(file)).collect();
    parts.push(Part::text(prompts::answer_region_prompt(&numbers)));

    let reply = match client.generate(parts).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::warn!(error = %e, "answer-region batch failed");
            return Vec::new();
        }
    };

    let mut response_for: HashMap<u32, i64> = HashMap::new();
    for source in batch {
        response_for.insert(source.question_number, source.response_id);
    }

    let mut fragments = Vec::new();
    for outcome in split_answer_sections(&reply) {
        match outcome {
            SectionOutcome::Parsed(section) => match response_for.get(&section.question_number) {
                Some(response_id) => fragments.push((*response_id, section.body)),
                None => tracing::warn!(
                    question_number = section.question_number,
                    "reply names a question outside this batch"
                ),
            },
            SectionOutcome::Unparsed { raw } => {
                tracing::warn!(section = %raw, "dropping unparseable answer section");
            }
        }
    }
    fragments
}

/// Marking variant of [`answer_batch`], keyed `question_id_index` because
/// several images of one question share a base number.
async fn marking_batch(state: &AppState, batch: &[MarkingSource]) -> Vec<(i64, usize, String)> {
    let client = state.rotator().acquire_model();

    let uploaded = upload_batch(client, batch.iter().map(|s| s.path.as_str())).await;
    if uploaded.is_empty() {
        return Vec::new();
    }

    let keys: Vec<(i64, usize)> = uploaded
        .iter()
        .map(|(slot, _)| (batch[*slot].question_id, batch[*slot].index))
        .collect();
    let mut parts: Vec<Part> = uploaded.iter().map(|(_, file)| Part::file(file)).collect();
    parts.push(Part::text(prompts::marking_region_prompt(&keys)));

    let reply = match client.generate(parts).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::warn!(error = %e, "marking-region batch failed");
            return Vec::new();
        }
    };

    let mut fragments = Vec::new();
    for outcome in split_marking_sections(&reply) {
        match outcome {
            SectionOutcome::Parsed(section) => {
                let known = batch
                    .iter()
                    .any(|s| s.question_id == section.question_id && s.index == section.index);
                if known {
                    fragments.push((section.question_id, section.index, section.body));
                } else {
                    tracing::warn!(
                        question_id = section.question_id,
                        index = section.index,
                        "reply names a key outside this batch"
                    );
                }
            }
            SectionOutcome::Unparsed { raw } => {
                tracing::warn!(section = %raw, "dropping unparseable marking section");
            }
        }
    }
    fragments
}

/// Uploads a batch's images concurrently, returning `(slot, file)` pairs
/// restored to batch order. Images that cannot be read or uploaded are
/// logged and dropped.
pub(crate) async fn upload_batch<'a>(
    client: &GeminiClient,
    paths: impl Iterator<Item = &'a str>,
) -> Vec<(usize, GeminiFile)> {
    let mut uploads = FuturesUnordered::new();
    for (slot, path) in paths.enumerate() {
        uploads.push(upload_region(client, slot, path));
    }

    let mut uploaded = Vec::new();
    while let Some(result) = uploads.next().await {
        if let Some(entry) = result {
            uploaded.push(entry);
        }
    }
    uploaded.sort_by_key(|(slot, _)| *slot);
    uploaded
}

async fn upload_region(
    client: &GeminiClient,
    slot: usize,
    path: &str,
) -> Option<(usize, GeminiFile)> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(path, error = %e, "could not read region image");
            return None;
        }
    };
    let filename = Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("region-{slot}"));
    let mime = mime_guess::from_path(path).first_or_octet_stream();

    match client.upload_file(bytes, &filename, mime.as_ref()).await {
        Ok(file) => Some((slot, file)),
        Err(e) => {
            tracing::warn!(path, error = %e, "region image upload failed");
            None
        }
    }
}
