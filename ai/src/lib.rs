//! Transport layer for the generative-vision API.
//!
//! [`client::GeminiClient`] wraps the two REST calls the grading pipeline
//! needs (upload a file to the model's file store, generate content from a
//! multi-part prompt) and [`rotator::ModelRotator`] decides which configured
//! credential services a given call.

pub mod client;
pub mod error;
pub mod rotator;

pub use client::{GeminiClient, GeminiFile, Part};
pub use error::AiError;
pub use rotator::ModelRotator;
