//! Gemini Client (recognition oracle)
//!
//! Sends the normalized photo plus the prompt contract to Gemini
//! `generateContent` and returns the model's text reply untouched. Turning
//! that reply into structure is the fusion layer's job.
//!
//! # API Reference
//! - Endpoint: https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent
//! - Auth: `x-goog-api-key` header

use crate::types::{NormalizedImage, OracleError, RecognitionOracle};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Gemini API base URL (model path appended)
const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Default timeout for Gemini requests (vision calls are slow)
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Gemini recognition client
pub struct GeminiClient {
    http_client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String) -> Result<Self, OracleError> {
        let http_client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| OracleError::NotConfigured(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            api_key,
            model,
            base_url: GEMINI_API_URL.to_string(),
        })
    }

    /// Point the client at a different API root (proxies, regional endpoints)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl RecognitionOracle for GeminiClient {
    fn name(&self) -> &'static str {
        "Gemini"
    }

    async fn identify(&self, image: &NormalizedImage, prompt: &str) -> Result<String, OracleError> {
        debug!(
            model = %self.model,
            media_type = %image.media_type,
            byte_len = image.byte_len,
            "Querying Gemini"
        );

        let response = self
            .http_client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&build_request(image, prompt))
            .send()
            .await
            .map_err(|e| OracleError::Network(format!("Gemini request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::Api(format!(
                "Gemini returned {}: {}",
                status,
                error_message(&body).unwrap_or(body)
            )));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| OracleError::Parse(format!("Failed to parse Gemini response: {}", e)))?;

        let text = reply_text(parsed);
        debug!(reply_length = text.len(), "Gemini reply received");
        Ok(text)
    }
}

fn build_request(image: &NormalizedImage, prompt: &str) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".to_string()),
            parts: vec![
                Part::Text {
                    text: prompt.to_string(),
                },
                Part::InlineData {
                    inline_data: InlineData {
                        mime_type: image.media_type.clone(),
                        data: image.data_base64.clone(),
                    },
                },
            ],
        }],
    }
}

/// Text of the first candidate's parts, concatenated; empty when absent
fn reply_text(response: GenerateContentResponse) -> String {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default()
}

fn error_message(body: &str) -> Option<String> {
    let parsed: ErrorEnvelope = serde_json::from_str(body).ok()?;
    Some(parsed.error.message)
}

// ============================================================================
// Gemini API Payload Types
// ============================================================================

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

/// Variant order matters for `#[serde(untagged)]`
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Debug, Deserialize)]
struct ResponseCandidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}
