//!
//! Grading Domain Logic
//!
//! Pure, I/O-free building blocks of the exam-grading pipeline: the label
//! hierarchy engine, the parsers that turn free-form model replies into
//! structured records, and the prompt builders the extraction and grading
//! services send to the vision model.
//!
//! Everything here is deterministic and synchronous. Parsing a malformed
//! model reply is never an error — each parser returns a typed outcome
//! (`Unparsed`, `rejected`) that callers log and skip, keeping one bad
//! section from sinking its batch.

pub mod labels;
pub mod parsers;
pub mod prompts;

pub use prompts::DocumentType;
