//! Completion backend abstraction.
//!
//! Everything that turns a prompt into an answer goes through
//! [`CompletionService`]. The pipelines only see this trait, which keeps the
//! HTTP details in [`gemini`] and lets tests substitute a scripted backend.

pub mod gemini;
#[cfg(test)]
pub(crate) mod scripted;

use async_trait::async_trait;

pub use gemini::GeminiProvider;

/// Environment variable consulted when no API key is configured
pub const API_KEY_ENV_VAR: &str = "GEMINI_API_KEY";

/// A backend that completes a prompt into text
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Provider name for display
    fn name(&self) -> &'static str;

    /// Model identifier requests are sent to
    fn model_name(&self) -> &str;

    /// Send `prompt` and return the generated text
    async fn complete(&self, prompt: &str) -> Result<String, BackendError>;
}

/// Failure talking to the completion backend
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("API key not configured for {provider}. Run `cm --settings` or set {env_var}.")]
    MissingApiKey { provider: String, env_var: String },

    #[error("API error from {provider}: {message}")]
    ApiError { provider: String, message: String },

    #[error("Rate limited by {provider}. Please wait and try again.")]
    RateLimited { provider: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response from {provider}: {message}")]
    InvalidResponse { provider: String, message: String },
}

/// API key from the environment, if set and non-empty
pub fn api_key_from_env() -> Option<String> {
    std::env::var(API_KEY_ENV_VAR)
        .ok()
        .filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_messages() {
        let err = BackendError::ApiError {
            provider: "Gemini".to_string(),
            message: "HTTP 400: API key not valid".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "API error from Gemini: HTTP 400: API key not valid"
        );

        let err = BackendError::MissingApiKey {
            provider: "Gemini".to_string(),
            env_var: API_KEY_ENV_VAR.to_string(),
        };
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn test_network_error_message() {
        let err = BackendError::Network("connection refused".to_string());
        assert_eq!(err.to_string(), "Network error: connection refused");
    }
}
