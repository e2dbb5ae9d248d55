//! Error types for the vision-API transport layer.

/// Represents all error types that can occur while talking to the vision API.
#[derive(Debug)]
pub enum AiError {
    /// No credentials were configured; the pool cannot be built.
    NoCredentials,
    /// Uploading a file to the model's file store failed.
    Upload(String),
    /// A content-generation call failed (transport or non-success status).
    Generate(String),
    /// The API replied with a body we could not decode.
    InvalidResponse(String),
}

impl std::fmt::Display for AiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AiError::NoCredentials => write!(f, "no API credentials configured"),
            AiError::Upload(e) => write!(f, "file upload failed: {e}"),
            AiError::Generate(e) => write!(f, "content generation failed: {e}"),
            AiError::InvalidResponse(e) => write!(f, "invalid API response: {e}"),
        }
    }
}

impl std::error::Error for AiError {}
