//! Google Gemini provider.
//!
//! Uses the Generative Language `generateContent` endpoint with a single user
//! turn per request.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{BackendError, CompletionService, API_KEY_ENV_VAR};

/// Generative Language API base URL
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Upper bound on a single request, connect included
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const PROVIDER: &str = "Gemini";

/// Gemini provider
pub struct GeminiProvider {
    /// HTTP client
    client: Client,
    /// API key
    api_key: String,
    /// Model to use
    model: String,
}

impl GeminiProvider {
    /// Create a new Gemini provider
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", GEMINI_API_BASE, self.model)
    }

    /// Build the request body
    fn build_request(prompt: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
        }
    }
}

#[async_trait]
impl CompletionService for GeminiProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String, BackendError> {
        if self.api_key.trim().is_empty() {
            return Err(BackendError::MissingApiKey {
                provider: PROVIDER.to_string(),
                env_var: API_KEY_ENV_VAR.to_string(),
            });
        }

        debug!(model = %self.model, prompt_chars = prompt.chars().count(), "sending generateContent request");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&Self::build_request(prompt))
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            if status.as_u16() == 429 {
                return Err(BackendError::RateLimited {
                    provider: PROVIDER.to_string(),
                });
            }
            return Err(BackendError::ApiError {
                provider: PROVIDER.to_string(),
                message: format!("HTTP {}: {}", status, api_error_message(&error_body)),
            });
        }

        let body: GenerateContentResponse =
            response
                .json()
                .await
                .map_err(|e| BackendError::InvalidResponse {
                    provider: PROVIDER.to_string(),
                    message: e.to_string(),
                })?;

        let text = candidate_text(body).ok_or_else(|| BackendError::InvalidResponse {
            provider: PROVIDER.to_string(),
            message: "response contained no text".to_string(),
        })?;

        debug!(answer_chars = text.chars().count(), "received answer");
        Ok(text)
    }
}

/// Pull the human readable message out of an error body, falling back to the raw body
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

/// Concatenated text parts of the first candidate
fn candidate_text(response: GenerateContentResponse) -> Option<String> {
    let candidate = response.candidates.into_iter().next()?;
    let text = candidate
        .content?
        .parts
        .into_iter()
        .filter_map(|part| part.text)
        .collect::<Vec<_>>()
        .join("");

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

// API types

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}
