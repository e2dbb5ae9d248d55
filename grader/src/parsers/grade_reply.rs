//! Parser for grading replies of the form:
//!
//! ```text
//! Grade: X
//! Reason: Some Text
//! ```
//!
//! The grade is the first whitespace-separated token after the first
//! `"Grade:"` marker, tolerating a fraction (`7/10` reads as 7). Reasoning is
//! everything after the first `"Reason:"` marker. Range validation against
//! the question's maximum is a separate step so the parser never needs to
//! know about questions.

/// The grade portion of a parsed reply.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedGrade {
    /// A numeric grade was found (not yet range-checked).
    Value(f64),
    /// The marker was missing or the token after it was not numeric.
    Unparsed,
}

/// Structured form of one grading reply.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeReply {
    pub grade: ParsedGrade,
    pub reasoning: String,
}

/// Parses a raw model reply into grade + reasoning.
///
/// Never fails: anything that does not match the expected shape comes back
/// as [`ParsedGrade::Unparsed`] and/or an empty reasoning string.
pub fn parse_grade_reply(text: &str) -> GradeReply {
    let grade = text
        .lines()
        .find(|line| line.contains("Grade:"))
        .and_then(|line| line.split_once("Grade:"))
        .and_then(|(_, after)| after.split_whitespace().next())
        .and_then(parse_grade_token)
        .map(ParsedGrade::Value)
        .unwrap_or(ParsedGrade::Unparsed);

    let reasoning = text
        .split_once("Reason:")
        .map(|(_, after)| after.trim().to_string())
        .unwrap_or_default();

    GradeReply { grade, reasoning }
}

/// Reads a numeric grade token, taking the numerator when the model answers
/// with a fraction like `7/10`.
fn parse_grade_token(token: &str) -> Option<f64> {
    let numerator = match token.split_once('/') {
        Some((num, _)) => num,
        None => token,
    };
    numerator.parse::<f64>().ok()
}

/// Applies the sanity bound: a grade outside `[0, max_marks]` is rejected to
/// `None`, never clamped. `None` means "do not persist".
pub fn validate_grade(parsed: &ParsedGrade, max_marks: f64) -> Option<f64> {
    match parsed {
        ParsedGrade::Value(grade) if *grade >= 0.0 && *grade <= max_marks => Some(*grade),
        _ => None,
    }
}
