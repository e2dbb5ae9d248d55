//!
//! Model-Reply Parsers
//!
//! String parsing of model output is an inherently fragile contract with the
//! external vision API, so every marker-based format lives behind exactly one
//! parser function here, each with exhaustive tests on malformed, partial,
//! and missing-marker inputs. Parse failure is a typed outcome, never a
//! panic or an error that aborts a batch.

pub mod grade_reply;
pub mod label_lines;
pub mod regions;
