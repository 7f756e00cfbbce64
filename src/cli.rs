//! Command-line interface definitions for the `cm` tool.

use clap::Parser;
use clap_complete::Shell;
use std::path::PathBuf;

/// Run commands and get short AI explanations when they fail
#[derive(Parser, Debug)]
#[command(
    name = "cm",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("CM_GIT_SHA"), ")"),
    about,
    long_about = None
)]
#[command(
    after_help = "EXAMPLES:\n    cm -c cargo build\n    cm -s how do I undo the last git commit\n    cm -s --full explain rust lifetimes\n    make 2>&1 | cm -e --exit-code 2"
)]
pub struct Cli {
    /// Ask the AI a question
    #[arg(long, short = 's', num_args = 1.., value_name = "QUESTION")]
    pub ask: Option<Vec<String>>,

    /// Run a command and explain any errors
    #[arg(
        long,
        short = 'c',
        num_args = 1..,
        allow_hyphen_values = true,
        value_name = "CMD"
    )]
    pub command: Option<Vec<String>>,

    /// Explain error output piped on stdin
    #[arg(long, short = 'e')]
    pub explain: bool,

    /// Exit code of the failed command (used with --explain)
    #[arg(long, value_name = "CODE", default_value_t = 1)]
    pub exit_code: i32,

    /// Show the full AI response without the word limit
    #[arg(long, short = 'f')]
    pub full: bool,

    /// Update tool settings interactively
    #[arg(long, short = 'S')]
    pub settings: bool,

    /// Update one setting without prompting
    #[arg(long, value_name = "KEY=VALUE", value_parser = parse_assignment)]
    pub set: Option<(String, String)>,

    /// Print the current settings
    #[arg(long)]
    pub show_settings: bool,

    /// Path to an alternate settings file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Show debug info (prompt and raw response)
    #[arg(long, short = 'd')]
    pub debug: bool,

    /// Generate shell completions
    #[arg(long, value_enum, value_name = "SHELL")]
    pub completions: Option<Shell>,
}

impl Cli {
    /// Question tokens joined with spaces
    pub fn question(&self) -> Option<String> {
        self.ask.as_ref().map(|words| words.join(" "))
    }

    /// Command tokens joined with spaces
    pub fn command_line(&self) -> Option<String> {
        self.command.as_ref().map(|words| words.join(" "))
    }
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))?;
    if key.trim().is_empty() {
        return Err(format!("missing setting name in `{raw}`"));
    }
    Ok((key.trim().to_string(), value.to_string()))
}
