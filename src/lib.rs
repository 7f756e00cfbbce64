//! cm - run shell commands and get short AI explanations of their failures
//!
//! This library holds the pieces behind the `cm` binary: output cleanup,
//! answer presentation, the diagnose and ask pipelines, the completion
//! backend and the persisted settings.

pub mod cli;
pub mod config;
pub mod diagnose;
pub mod interactive;
pub mod output;
pub mod providers;
pub mod query;
pub mod runner;
pub mod sanitize;

// Re-export commonly used types
pub use cli::Cli;
pub use config::{SettingKey, Settings, SettingsError, SettingsStore};
pub use diagnose::{diagnose, DiagnosticRequest};
pub use output::{render, Answer, RenderedText, TextColor, TextSize};
pub use providers::{BackendError, CompletionService, GeminiProvider};
pub use query::ask;
pub use runner::{CommandOutput, CommandRunner, ExecutionError, ShellRunner};
