//! Minimal REST client for the Gemini vision API.
//!
//! Two calls are wrapped here: uploading a document to the model's file store
//! and generating content from a multi-part prompt (text and previously
//! uploaded files). The base URL is injected so tests can stand up a local
//! stand-in server; requests carry bounded connect/total timeouts so a hung
//! upstream surfaces as a per-item error instead of stalling a batch forever.

use crate::error::AiError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Request body for the `generateContent` endpoint.
#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

/// Content wrapper for the Gemini API request.
#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

/// A single part of a prompt: literal text or a reference to an uploaded file.
#[derive(Serialize, Clone, Debug)]
#[serde(untagged)]
pub enum Part {
    Text { text: String },
    FileData { file_data: FileData },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    pub fn file(file: &GeminiFile) -> Self {
        Part::FileData {
            file_data: FileData {
                mime_type: file.mime_type.clone(),
                file_uri: file.uri.clone(),
            },
        }
    }
}

/// Reference to a file in the model's file store.
#[derive(Serialize, Clone, Debug)]
pub struct FileData {
    pub mime_type: String,
    pub file_uri: String,
}

/// Optional configuration for the generation process.
#[derive(Serialize)]
struct GenerationConfig {
    thinking_config: ThinkingConfig,
}

/// Thinking budget 0 disables model thinking for faster replies.
#[derive(Serialize)]
struct ThinkingConfig {
    thinking_budget: u32,
}

/// Response from the `generateContent` endpoint.
#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: ContentResponse,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: String,
}

/// Response from the file-upload endpoint.
#[derive(Deserialize)]
struct UploadResponse {
    file: GeminiFile,
}

/// A file stored in the model's file store, usable as a prompt part.
#[derive(Deserialize, Clone, Debug)]
pub struct GeminiFile {
    pub name: String,
    pub uri: String,
    #[serde(alias = "mimeType")]
    pub mime_type: String,
}

/// One credential's client against the vision API.
///
/// Constructed eagerly by the [`crate::rotator::ModelRotator`], one instance
/// per configured key.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Builds a client for one credential.
    ///
    /// `base_url` is the scheme+host prefix (no trailing slash); production
    /// uses the public Gemini endpoint, tests inject a local server.
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AiError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .build()
            .map_err(|e| AiError::Generate(e.to_string()))?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into(),
        })
    }

    /// Uploads raw bytes to the model's file store and returns the stored
    /// file reference for use in later prompts.
    pub async fn upload_file(
        &self,
        bytes: Vec<u8>,
        display_name: &str,
        mime_type: &str,
    ) -> Result<GeminiFile, AiError> {
        let url = format!("{}/upload/v1beta/files?key={}", self.base_url, self.api_key);

        let response = self
            .http
            .post(&url)
            .header("X-Goog-Upload-Protocol", "raw")
            .header("X-Goog-File-Name", display_name)
            .header(reqwest::header::CONTENT_TYPE, mime_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| AiError::Upload(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AiError::Upload(format!(
                "upload of {display_name} returned {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AiError::Upload(e.to_string()))?;
        let parsed: UploadResponse = serde_json::from_str(&body)
            .map_err(|e| AiError::InvalidResponse(format!("error decoding upload body: {e}")))?;

        Ok(parsed.file)
    }

    /// Sends a multi-part prompt and returns the first candidate's text.
    ///
    /// An answer with no candidates or no parts yields an empty string; the
    /// caller decides what an empty reply means (extraction substitutes its
    /// sentinel there).
    pub async fn generate(&self, parts: Vec<Part>) -> Result<String, AiError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let request_body = GeminiRequest {
            contents: vec![Content { parts }],
            generation_config: Some(GenerationConfig {
                thinking_config: ThinkingConfig { thinking_budget: 0 },
            }),
        };

        let response = self
            .http
            .post(&url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| AiError::Generate(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AiError::Generate(format!(
                "generateContent returned {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AiError::Generate(e.to_string()))?;
        let parsed: GeminiResponse = serde_json::from_str(&body).map_err(|e| {
            AiError::InvalidResponse(format!(
                "error decoding response body: {e}. Full response: {body}"
            ))
        })?;

        let text = parsed
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.clone())
            .unwrap_or_default();

        Ok(text)
    }
}
