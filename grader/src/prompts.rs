//!
//! Prompt Builders
//!
//! Every prompt sent to the vision model is assembled here, next to the
//! parsers that read the replies back, so the request/reply contract lives
//! in one place. Handlers and services never embed prompt text themselves.

use serde::{Deserialize, Serialize};

/// Declared type of an uploaded exam document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    QuestionPaper,
    SolutionScript,
    MarkingScheme,
    AnswerSheet,
}

impl DocumentType {
    /// Wire-level name, matching the multipart `file_type` field values.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::QuestionPaper => "question_paper",
            DocumentType::SolutionScript => "solution_script",
            DocumentType::MarkingScheme => "marking_scheme",
            DocumentType::AnswerSheet => "answer_sheet",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "question_paper" => Some(DocumentType::QuestionPaper),
            "solution_script" => Some(DocumentType::SolutionScript),
            "marking_scheme" => Some(DocumentType::MarkingScheme),
            "answer_sheet" => Some(DocumentType::AnswerSheet),
            _ => None,
        }
    }
}

/// Which image categories accompany a grading prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentNote {
    None,
    DiagramsOnly,
    TablesOnly,
    DiagramsAndTables,
}

impl AttachmentNote {
    /// Derived from which stored region-image lists are non-empty.
    pub fn from_presence(has_diagrams: bool, has_tables: bool) -> Self {
        match (has_diagrams, has_tables) {
            (true, true) => AttachmentNote::DiagramsAndTables,
            (true, false) => AttachmentNote::DiagramsOnly,
            (false, true) => AttachmentNote::TablesOnly,
            (false, false) => AttachmentNote::None,
        }
    }

    fn describe(&self) -> Option<&'static str> {
        match self {
            AttachmentNote::None => None,
            AttachmentNote::DiagramsOnly => {
                Some("The attached images are diagrams drawn by the student.")
            }
            AttachmentNote::TablesOnly => {
                Some("The attached images are tables drawn by the student.")
            }
            AttachmentNote::DiagramsAndTables => {
                Some("The attached images are diagrams and tables drawn by the student.")
            }
        }
    }
}

/// Extraction prompt for a whole scanned document.
///
/// `leaf_labels` interpolates the exam's current leaf-label set into the
/// question-paper variant so extraction sections match an already-known
/// hierarchy; pass `None` when no hierarchy exists yet.
pub fn extraction_prompt(document_type: DocumentType, leaf_labels: Option<&[String]>) -> String {
    match document_type {
        DocumentType::QuestionPaper => {
            let mut prompt = String::from(
                r#"Extract text from the document, preserving all formatting (tables, bullet points, etc.). Remove any "Instructions" section at the beginning. Before each question, mention:
Question Number - X
Max Marks - Y
where X is the question number and Y is the allocated marks for that question (mentioned along with the question, or inferred from the "Instructions" section if available). Label subparts as X(subpart). If the same question number appears more than once, keep every occurrence. Ignore any text that is not a part of the questions."#,
            );
            if let Some(labels) = leaf_labels {
                if !labels.is_empty() {
                    prompt.push_str("\nThe paper is known to contain exactly these question and part labels: ");
                    prompt.push_str(&labels.join(", "));
                    prompt.push_str(". Match each extracted section to one of these labels.");
                }
            }
            prompt
        }
        DocumentType::AnswerSheet => String::from(
            r#"The documents and images may contain handwritten text portions linked by complex arrows, creating a loosely structured flow between different text elements. Extract the text verbatim along with its connections, without correcting spelling or grammar. Keep the correct formatting as in the image, maintaining the tables, bulleting etc. Where a printed question stem is completed by handwriting, reconstruct the full sentence by joining the printed stem and the handwritten continuation. Leave out any content that has been struck through. Before each answer, always mention:
Question Number - X
Ignore any text that is irrelevant to the question answers."#,
        ),
        DocumentType::SolutionScript | DocumentType::MarkingScheme => String::from(
            r#"The documents and images contain marking content where text portions may be linked by complex arrows, creating a loosely structured flow between different text elements. Extract the text accurately along with its connections and the mark allocations associated with each point. Keep the correct formatting as in the image, maintaining the tables, bulleting etc. Leave out any content that has been struck through. Before each answer, always mention:
Question Number - X
Ignore any text that is irrelevant to the marking content."#,
        ),
    }
}

/// Prompt requesting the full label hierarchy of a question paper.
pub fn label_extraction_prompt() -> String {
    String::from(
        r#"List every question and part label that appears in this question paper, one label per line, using dot notation for parts and subparts (for example: 1, 1.1, 1.1.a). For each top-level question label (a label with no dot), append the maximum marks in the form:
X - Max Marks - Y
where X is the label and Y is an integer. Output labels only, with no additional commentary."#,
    )
}

/// Composite prompt for one batch of cropped answer-region images.
///
/// `question_numbers[i]` is the base question number of attachment `i`, in
/// upload order.
pub fn answer_region_prompt(question_numbers: &[u32]) -> String {
    let mut prompt = String::from(
        "The attached images are cropped regions of a student's handwritten answers. In attachment order:\n",
    );
    for (position, number) in question_numbers.iter().enumerate() {
        prompt.push_str(&format!(
            "Image {} belongs to Question Number {}\n",
            position + 1,
            number
        ));
    }
    prompt.push_str(
        r#"Extract the handwritten content of every image verbatim, without correcting spelling or grammar, leaving out struck-through content. Combine images that belong to the same question. Output one section per question, separated by blank lines, in the form:
Question Number [n]
Answer: [text]
For labeled subparts within an image, keep them inside the same section as:
Part: [label] - Answer: [text]"#,
    );
    prompt
}

/// Composite prompt for one batch of cropped marking-scheme region images.
///
/// `keys[i]` is the `(question_id, index)` pair of attachment `i`. Replies
/// key sections by `Key: <question_id>_<index>` because several images can
/// belong to one question.
pub fn marking_region_prompt(keys: &[(i64, usize)]) -> String {
    let mut prompt = String::from(
        "The attached images are cropped regions of an exam marking scheme. In attachment order:\n",
    );
    for (position, (question_id, index)) in keys.iter().enumerate() {
        prompt.push_str(&format!(
            "Image {} has Key: {}_{}\n",
            position + 1,
            question_id,
            index
        ));
    }
    prompt.push_str(
        r#"Extract the marking content of every image accurately, including mark allocations, leaving out struck-through content. Output one section per image, separated by blank lines, in the form:
Key: [key]
[text]"#,
    );
    prompt
}

/// Inputs to the grading prompt builder.
#[derive(Debug, Clone)]
pub struct GradingInputs<'a> {
    pub question_text: &'a str,
    pub max_marks: i32,
    pub student_answer: Option<&'a str>,
    pub ideal_answer: Option<&'a str>,
    pub marking_scheme: Option<&'a str>,
    pub attachments: AttachmentNote,
}

/// Builds the grading prompt.
///
/// Four variants depending on which of {marking scheme, ideal answer} are
/// present; when neither is, the scheme/answer material is carried by the
/// attached images and the prompt says which categories to expect. Every
/// variant embeds the question text, the maximum marks, and the required
/// output shape.
pub fn grading_prompt(inputs: &GradingInputs) -> String {
    let student_answer = inputs.student_answer.unwrap_or_default();

    let mut prompt = match (inputs.marking_scheme, inputs.ideal_answer) {
        (Some(scheme), Some(ideal)) => format!(
            r#"Question: {question}

This is the correct marking scheme: {scheme}

Ideal Answer: {ideal}

Based on these, grade the following student answer: {answer}"#,
            question = inputs.question_text,
            scheme = scheme,
            ideal = ideal,
            answer = student_answer,
        ),
        (Some(scheme), None) => format!(
            r#"Question: {question}

This is the correct marking scheme: {scheme}

Grade the following student answer: {answer}"#,
            question = inputs.question_text,
            scheme = scheme,
            answer = student_answer,
        ),
        (None, Some(ideal)) => format!(
            r#"Question: {question}

Ideal Answer: {ideal}

Grade the following student answer: {answer}"#,
            question = inputs.question_text,
            ideal = ideal,
            answer = student_answer,
        ),
        (None, None) => format!(
            r#"Question: {question}

The marking scheme for this question is contained in the attached images. Grade the following student answer against it: {answer}"#,
            question = inputs.question_text,
            answer = student_answer,
        ),
    };

    if let Some(note) = inputs.attachments.describe() {
        prompt.push_str("\n\n");
        prompt.push_str(note);
        prompt.push_str(" Take them into account when grading.");
    }

    prompt.push_str(&format!(
        r#"

Maximum Marks Possible: {max}.
Output Format:
Grade: X
Reason: Some Text"#,
        max = inputs.max_marks,
    ));

    prompt
}
