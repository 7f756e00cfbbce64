//! Direct questions to the backend.

use tracing::debug;

use crate::config::Settings;
use crate::output::{render, Answer};
use crate::providers::CompletionService;

/// Send `query` as-is and render the answer.
///
/// `full_response` lifts the configured word limit for this answer only.
pub async fn ask(
    query: &str,
    settings: &Settings,
    backend: &dyn CompletionService,
    full_response: bool,
) -> Answer {
    debug!(
        query_chars = query.chars().count(),
        full_response,
        backend = backend.name(),
        model = backend.model_name(),
        "asking backend"
    );

    match backend.complete(query).await {
        Ok(text) => Answer::Rendered(render(
            &text,
            settings.word_limit,
            settings.text_color,
            settings.text_size,
            full_response,
        )),
        Err(err) => Answer::Failure(format!("Error: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::TRUNCATION_HINT;
    use crate::providers::scripted::ScriptedProvider;
    use crate::providers::BackendError;

    fn limited(word_limit: usize) -> Settings {
        Settings {
            word_limit,
            ..Settings::default()
        }
    }

    #[tokio::test]
    async fn test_ask_forwards_query_verbatim() {
        let backend = ScriptedProvider::answering("Use `tar -xzf`.");
        let query = "how do I extract \x1b[1ma\x1b[0m tarball?\n\n\n";

        ask(query, &Settings::default(), &backend, false).await;

        assert_eq!(backend.last_prompt().as_deref(), Some(query));
    }

    #[tokio::test]
    async fn test_ask_respects_word_limit() {
        let backend = ScriptedProvider::answering("a b c d e f g");

        let answer = ask("letters?", &limited(3), &backend, false).await;

        assert_eq!(answer.plain(), format!("\n> a b c...\n{TRUNCATION_HINT}\n"));
    }

    #[tokio::test]
    async fn test_ask_full_response_ignores_word_limit() {
        let backend = ScriptedProvider::answering("a b c d e f g");

        let answer = ask("letters?", &limited(3), &backend, true).await;

        assert_eq!(answer.plain(), "\n> a b c d e f g\n");
    }

    #[tokio::test]
    async fn test_ask_backend_failure_becomes_text() {
        let backend = ScriptedProvider::failing(BackendError::RateLimited {
            provider: "Gemini".to_string(),
        });

        let answer = ask("anything", &Settings::default(), &backend, false).await;

        assert!(answer.is_failure());
        assert_eq!(
            answer.plain(),
            "Error: Rate limited by Gemini. Please wait and try again."
        );
    }
}
