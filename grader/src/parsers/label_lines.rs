//! Parser for label-extraction replies.
//!
//! The label-extraction prompt asks for one label per line, with
//! `- Max Marks - <int>` appended for top-level labels:
//!
//! ```text
//! 1 - Max Marks - 10
//! 1.1
//! 1.1.a
//! 2 - Max Marks - 5
//! ```
//!
//! Labels whose top-level component is not purely numeric are rejected
//! explicitly — region reconciliation later matches sections by numeric
//! prefix, and letting an alphanumeric label through would mis-group
//! silently. Rejected lines are returned so the caller can log them.

use regex::Regex;

/// One successfully parsed label line.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelLine {
    pub label: String,
    /// Present when the line carried a `- Max Marks - <int>` suffix.
    pub max_marks: Option<i32>,
}

/// Outcome of parsing one reply: accepted labels plus the raw lines that
/// matched neither form (or carried a non-numeric top-level component).
#[derive(Debug, Default, PartialEq)]
pub struct ParsedLabels {
    pub labels: Vec<LabelLine>,
    pub rejected: Vec<String>,
}

/// Parses every non-empty line of a label-extraction reply.
pub fn parse_label_lines(text: &str) -> ParsedLabels {
    // A label is dot-separated components; the top-level component must be
    // purely numeric.
    let with_marks = Regex::new(r"^([0-9]+(?:\.[A-Za-z0-9]+)*)\s*-\s*Max Marks\s*-\s*([0-9]+)$")
        .expect("label regex is valid");
    let bare = Regex::new(r"^[0-9]+(?:\.[A-Za-z0-9]+)*$").expect("label regex is valid");

    let mut parsed = ParsedLabels::default();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(caps) = with_marks.captures(line) {
            parsed.labels.push(LabelLine {
                label: caps[1].to_string(),
                max_marks: caps[2].parse::<i32>().ok(),
            });
        } else if bare.is_match(line) {
            parsed.labels.push(LabelLine {
                label: line.to_string(),
                max_marks: None,
            });
        } else {
            parsed.rejected.push(line.to_string());
        }
    }

    parsed
}
