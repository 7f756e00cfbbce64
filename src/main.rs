use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser};
use clap_complete::{generate, Shell};
use colored::Colorize;
use std::io::{self, IsTerminal, Write};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cm::config::{Settings, SettingsError, SettingsStore};
use cm::diagnose::{build_prompt, diagnose, DiagnosticRequest};
use cm::output::{format_error, print_debug_section, Answer};
use cm::providers::{CompletionService, GeminiProvider, API_KEY_ENV_VAR};
use cm::runner::{self, CommandRunner, ShellRunner};
use cm::{interactive, query, sanitize, Cli};

/// Environment variable holding the log filter
const LOG_ENV_VAR: &str = "CM_LOG";

fn init_logging(debug: bool) {
    let default_filter = if debug { "cm=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

/// Backend for a given API key and model
fn connect(api_key: &str, model: &str) -> Box<dyn CompletionService> {
    Box::new(GeminiProvider::new(api_key, model))
}

fn backend_for(settings: &Settings) -> Box<dyn CompletionService> {
    let api_key = settings.effective_api_key().unwrap_or_else(|| {
        eprintln!(
            "{}",
            format!(
                "API key not found. Please set it using 'cm --settings' or {}",
                API_KEY_ENV_VAR
            )
            .yellow()
        );
        String::new()
    });
    let backend = connect(&api_key, &settings.model);
    debug!(provider = backend.name(), model = backend.model_name(), "backend ready");
    backend
}

/// Read error output piped on stdin
fn read_piped_input() -> Result<String> {
    if io::stdin().is_terminal() {
        bail!(format_error(
            "No input provided for --explain.",
            Some("Pipe the failing output in: make 2>&1 | cm -e --exit-code 2"),
        ));
    }

    runner::read_output(io::stdin().lock()).context("Failed to read stdin")
}

fn print_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "cm", &mut io::stdout());
}

fn print_answer(answer: &Answer, debug: bool) {
    if debug {
        print_debug_section("Answer", answer.plain(), Some(answer.debug_footer()));
    }
    println!("{answer}");
}

async fn explain_failure(
    raw_output: String,
    exit_code: i32,
    settings: &Settings,
    debug: bool,
) -> Result<()> {
    let request = DiagnosticRequest::new(raw_output, exit_code);
    if debug && !request.is_empty() {
        let prompt = build_prompt(exit_code, &sanitize::clean(&request.raw_output));
        print_debug_section(
            "Prompt",
            &prompt,
            Some(format!(
                "({} chars, raw output {} chars)",
                prompt.chars().count(),
                request.raw_output.chars().count()
            )),
        );
    }

    let backend = backend_for(settings);
    let answer = diagnose(&request, settings, backend.as_ref()).await;
    print_answer(&answer, debug);
    Ok(())
}

async fn update_setting(store: &SettingsStore, key: &str, value: &str) -> Result<()> {
    match store.update(key, value, connect).await {
        Ok(_) => {
            println!("{}", "Setting updated successfully!".green());
            Ok(())
        }
        Err(SettingsError::Storage(err)) => Err(err),
        Err(err) => {
            eprintln!("{}", format_error(&err.to_string(), None));
            std::process::exit(2);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    if let Some(shell) = cli.completions {
        print_completions(shell);
        return Ok(());
    }

    let store = SettingsStore::locate(cli.config.clone())?;

    if cli.settings {
        let mut input = io::stdin().lock();
        let mut out = io::stdout();
        interactive::edit_settings(&store, &mut input, &mut out, connect).await?;
        return Ok(());
    }

    if let Some((key, value)) = &cli.set {
        return update_setting(&store, key, value).await;
    }

    if cli.show_settings {
        let settings = store.load()?;
        interactive::write_settings(&mut io::stdout(), &settings)?;
        println!("{} {}", "File:".blue().bold(), store.path().display());
        return Ok(());
    }

    let mut settings = store.load()?;

    if let Some(question) = cli.question() {
        if cli.debug {
            print_debug_section("Question", &question, None);
        }
        let backend = backend_for(&settings);
        let answer = query::ask(&question, &settings, backend.as_ref(), cli.full).await;
        print_answer(&answer, cli.debug);
        return Ok(());
    }

    // --full lifts the limit for explanations too
    if cli.full {
        settings.word_limit = 0;
    }

    if let Some(command) = cli.command_line() {
        match ShellRunner.run(&command) {
            Ok(output) => {
                print!("{}", output.stdout);
                io::stdout().flush()?;
                if !output.success() {
                    explain_failure(output.stderr, output.exit_code, &settings, cli.debug).await?;
                }
            }
            Err(err) => {
                eprintln!("{}", format!("Error executing command: {err}").red());
            }
        }
        return Ok(());
    }

    if cli.explain {
        let input = read_piped_input()?;
        return explain_failure(input, cli.exit_code, &settings, cli.debug).await;
    }

    Cli::command().print_help()?;
    Ok(())
}
