//! Interactive settings editor.

use anyhow::{Context, Result};
use colored::Colorize;
use std::io::{BufRead, Write};

use crate::config::{SettingKey, Settings, SettingsError, SettingsStore};
use crate::output::{TextColor, TextSize};
use crate::providers::CompletionService;

/// Print the current settings with the API key masked
pub fn write_settings<W: Write>(out: &mut W, settings: &Settings) -> Result<()> {
    writeln!(out, "{}", "Current Settings:".cyan())?;
    for (key, value) in settings.display_rows() {
        writeln!(out, "{key}: {value}")?;
    }
    Ok(())
}

fn read_answer<R: BufRead, W: Write>(input: &mut R, out: &mut W, prompt: &str) -> Result<String> {
    write!(out, "{prompt}")?;
    out.flush()?;
    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("Failed to read from terminal")?;
    Ok(line.trim().to_string())
}

/// Walk the user through changing one setting.
///
/// Returns the saved settings, or `None` when the change was refused.
pub async fn edit_settings<R, W, F>(
    store: &SettingsStore,
    input: &mut R,
    out: &mut W,
    connect: F,
) -> Result<Option<Settings>>
where
    R: BufRead,
    W: Write,
    F: FnOnce(&str, &str) -> Box<dyn CompletionService>,
{
    let settings = store.load()?;
    write_settings(out, &settings)?;

    writeln!(out)?;
    writeln!(out, "Which setting would you like to change?")?;
    writeln!(out, "Available options: {}", SettingKey::names())?;
    let field = read_answer(input, out, "> ")?.to_lowercase();

    let key = match field.parse::<SettingKey>() {
        Ok(key) => key,
        Err(_) => {
            writeln!(out, "{}", format!("Invalid setting: {field}").red())?;
            return Ok(None);
        }
    };

    let prompt = match key {
        SettingKey::TextColor => {
            writeln!(out, "Available colors: {}", TextColor::names())?;
            format!("Enter new {key} value: ")
        }
        SettingKey::TextSize => {
            writeln!(out, "Available sizes: {}", TextSize::names())?;
            format!("Enter new {key} value: ")
        }
        SettingKey::WordLimit => format!("Enter new {key} value (0 for no limit): "),
        _ => format!("Enter new {key} value: "),
    };
    let value = read_answer(input, out, &prompt)?;

    match store.update(key.as_str(), &value, connect).await {
        Ok(updated) => {
            let message = if key == SettingKey::ApiKey {
                "API key validated successfully!"
            } else {
                "Setting updated successfully!"
            };
            writeln!(out, "{}", message.green())?;
            Ok(Some(updated))
        }
        Err(SettingsError::Storage(err)) => Err(err),
        Err(err) => {
            writeln!(out, "{}", err.to_string().red())?;
            Ok(None)
        }
    }
}
