//! Explaining failed commands.
//!
//! A [`DiagnosticRequest`] carries the captured error output and exit code of
//! one failed command. [`diagnose`] cleans the output, asks the backend for a
//! short explanation and renders it with the user's presentation settings.
//! Backend failures come back as [`Answer::Failure`], never as errors.

use tracing::debug;

use crate::config::Settings;
use crate::output::{render, Answer};
use crate::providers::CompletionService;
use crate::sanitize;

/// Returned when a command failed without printing anything
pub const NO_OUTPUT_MESSAGE: &str = "No error output to analyze.";

const PROMPT_TEMPLATE: &str = include_str!("prompt.txt");

/// Output of one failed command, consumed by [`diagnose`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticRequest {
    pub raw_output: String,
    pub exit_code: i32,
}

impl DiagnosticRequest {
    pub fn new(raw_output: impl Into<String>, exit_code: i32) -> Self {
        Self {
            raw_output: raw_output.into(),
            exit_code,
        }
    }

    /// True when there is nothing worth sending to the backend
    pub fn is_empty(&self) -> bool {
        self.raw_output.trim().is_empty()
    }
}

/// Fill the prompt template with an exit code and already cleaned output
pub fn build_prompt(exit_code: i32, cleaned_output: &str) -> String {
    PROMPT_TEMPLATE
        .replace("{exit_code}", &exit_code.to_string())
        .replace("{exit_meaning}", interpret_exit_code(exit_code))
        .replace("{error}", cleaned_output)
}

/// Ask the backend to explain a failed command and render its answer
pub async fn diagnose(
    request: &DiagnosticRequest,
    settings: &Settings,
    backend: &dyn CompletionService,
) -> Answer {
    if request.is_empty() {
        return Answer::Notice(NO_OUTPUT_MESSAGE.to_string());
    }

    let cleaned = sanitize::clean(&request.raw_output);
    let prompt = build_prompt(request.exit_code, &cleaned);
    debug!(
        exit_code = request.exit_code,
        raw_chars = request.raw_output.chars().count(),
        cleaned_chars = cleaned.chars().count(),
        backend = backend.name(),
        model = backend.model_name(),
        "requesting explanation"
    );

    match backend.complete(&prompt).await {
        Ok(text) => Answer::Rendered(render(
            &text,
            settings.word_limit,
            settings.text_color,
            settings.text_size,
            false,
        )),
        Err(err) => Answer::Failure(format!("Failed to get AI explanation: {err}")),
    }
}

/// Interpret common exit codes
pub fn interpret_exit_code(code: i32) -> &'static str {
    match code {
        0 => "success",
        1 => "general error",
        2 => "misuse of shell command",
        126 => "permission problem or command not executable",
        127 => "command not found",
        128 => "invalid exit argument",
        130 => "terminated by Ctrl+C (SIGINT)",
        137 => "killed (SIGKILL)",
        139 => "segmentation fault (SIGSEGV)",
        141 => "broken pipe (SIGPIPE)",
        143 => "terminated (SIGTERM)",
        255 => "exit status out of range",
        _ if code > 128 && code < 256 => "terminated by signal",
        _ => "unknown",
    }
}
