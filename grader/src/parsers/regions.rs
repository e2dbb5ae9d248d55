//! Parsers for batched region-extraction replies.
//!
//! Answer-region batches come back as sections introduced by the literal
//! marker `Question Number`:
//!
//! ```text
//! Question Number 3
//! Answer: an integral sign followed by ...
//!
//! Question Number 4
//! Answer: ...
//! ```
//!
//! Marking-scheme batches key sections by `Key: <question_id>_<index>`
//! instead, because several images can belong to one question with no
//! numeric re-derivation from the reply alone.
//!
//! A section whose header cannot be read is an [`Unparsed`] outcome carrying
//! the raw text — callers log it and move on.

/// One reconciled answer section.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerSection {
    pub question_number: u32,
    pub body: String,
}

/// One reconciled marking-scheme section.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkingSection {
    pub question_id: i64,
    pub index: usize,
    pub body: String,
}

/// A parsed section or the raw text of one that could not be keyed.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionOutcome<T> {
    Parsed(T),
    Unparsed { raw: String },
}

/// Splits a batch reply on the `Question Number` marker and reads each
/// section's leading numeric prefix.
///
/// Text before the first marker is ignored (models often preface replies).
/// A section with no leading digits — an alphanumeric "number" included —
/// becomes `Unparsed` rather than being silently grouped somewhere wrong.
pub fn split_answer_sections(reply: &str) -> Vec<SectionOutcome<AnswerSection>> {
    let mut outcomes = Vec::new();

    for section in reply.split("Question Number").skip(1) {
        let trimmed = section.trim_start_matches([' ', '\t', '\r', '\n', '[', '-', ':']);

        let digits: String = trimmed.chars().take_while(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            outcomes.push(SectionOutcome::Unparsed {
                raw: section.trim().to_string(),
            });
            continue;
        }

        let Ok(question_number) = digits.parse::<u32>() else {
            outcomes.push(SectionOutcome::Unparsed {
                raw: section.trim().to_string(),
            });
            continue;
        };

        let remainder = &trimmed[digits.len()..];
        let body = match remainder.split_once("Answer:") {
            Some((_, answer)) => answer.trim(),
            None => remainder.trim_start_matches([']', ')', ':', '-', ' ']).trim(),
        };

        outcomes.push(SectionOutcome::Parsed(AnswerSection {
            question_number,
            body: body.to_string(),
        }));
    }

    outcomes
}

/// Splits a marking-scheme batch reply on `Key:` markers of the form
/// `Key: <question_id>_<index>`.
pub fn split_marking_sections(reply: &str) -> Vec<SectionOutcome<MarkingSection>> {
    let mut outcomes = Vec::new();

    for section in reply.split("Key:").skip(1) {
        let trimmed = section.trim_start();

        let token: String = trimmed
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == '_')
            .collect();

        let parsed = token.split_once('_').and_then(|(qid, idx)| {
            Some(MarkingSection {
                question_id: qid.parse::<i64>().ok()?,
                index: idx.parse::<usize>().ok()?,
                body: trimmed[token.len()..]
                    .trim_start_matches([':', '-', ' '])
                    .trim()
                    .to_string(),
            })
        });

        match parsed {
            Some(section) => outcomes.push(SectionOutcome::Parsed(section)),
            None => outcomes.push(SectionOutcome::Unparsed {
                raw: section.trim().to_string(),
            }),
        }
    }

    outcomes
}
