//! Persistent user settings.
//!
//! Settings live in a flat TOML file (`~/.config/cm/config.toml` on Linux).
//! Loading always yields a complete record: missing keys are filled from
//! [`Settings::default`] and written back, and a file that cannot be parsed
//! is replaced by the defaults. Keys this version does not know about are
//! carried through every rewrite untouched.

use anyhow::{Context, Result};
use colored::Colorize;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

use crate::output::{TextColor, TextSize};
use crate::providers::{self, BackendError, CompletionService};

/// Environment variable that points at an alternate settings file
pub const CONFIG_ENV_VAR: &str = "CM_CONFIG";

/// Query sent to the backend to check a new API key
pub const API_KEY_PROBE: &str = "Say 'API key is working!'";

pub const DEFAULT_ALIAS: &str = "cm";
pub const DEFAULT_WORD_LIMIT: usize = 150;
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// User settings record
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(deserialize_with = "alias_or_default")]
    pub alias: String,
    #[serde(deserialize_with = "color_or_default")]
    pub text_color: TextColor,
    #[serde(deserialize_with = "size_or_default")]
    pub text_size: TextSize,
    /// Maximum words shown from an answer, 0 for no limit
    #[serde(deserialize_with = "word_limit_or_default")]
    pub word_limit: usize,
    #[serde(deserialize_with = "api_key_or_default")]
    pub api_key: String,
    #[serde(deserialize_with = "model_or_default")]
    pub model: String,
    /// Keys not managed by this version, preserved as found
    #[serde(flatten)]
    pub extra: toml::Table,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            alias: DEFAULT_ALIAS.to_string(),
            text_color: TextColor::Green,
            text_size: TextSize::Normal,
            word_limit: DEFAULT_WORD_LIMIT,
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            extra: toml::Table::new(),
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("alias", &self.alias)
            .field("text_color", &self.text_color)
            .field("text_size", &self.text_size)
            .field("word_limit", &self.word_limit)
            .field("api_key", &mask_secret(&self.api_key))
            .field("model", &self.model)
            .field("extra", &self.extra)
            .finish()
    }
}

impl Settings {
    /// Configured API key, or the one from the environment when none is stored
    pub fn effective_api_key(&self) -> Option<String> {
        if self.api_key.trim().is_empty() {
            providers::api_key_from_env()
        } else {
            Some(self.api_key.clone())
        }
    }

    /// Current value of a field as shown to the user (API key masked)
    pub fn display_value(&self, key: SettingKey) -> String {
        match key {
            SettingKey::Alias => self.alias.clone(),
            SettingKey::TextColor => self.text_color.to_string(),
            SettingKey::TextSize => self.text_size.to_string(),
            SettingKey::WordLimit => self.word_limit.to_string(),
            SettingKey::ApiKey => mask_secret(&self.api_key),
            SettingKey::Model => self.model.clone(),
        }
    }

    /// Every field with its display value, managed fields first
    pub fn display_rows(&self) -> Vec<(String, String)> {
        let mut rows: Vec<(String, String)> = SettingKey::ALL
            .iter()
            .map(|key| (key.as_str().to_string(), self.display_value(*key)))
            .collect();
        rows.extend(
            self.extra
                .iter()
                .map(|(key, value)| (key.clone(), value.to_string())),
        );
        rows
    }
}

fn text_or<'de, D>(deserializer: D, default: &str) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = toml::Value::deserialize(deserializer)?;
    Ok(value.as_str().unwrap_or(default).to_string())
}

fn alias_or_default<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    text_or(deserializer, DEFAULT_ALIAS)
}

fn api_key_or_default<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    text_or(deserializer, "")
}

fn model_or_default<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    text_or(deserializer, DEFAULT_MODEL)
}

fn color_or_default<'de, D>(deserializer: D) -> std::result::Result<TextColor, D::Error>
where
    D: Deserializer<'de>,
{
    let value = toml::Value::deserialize(deserializer)?;
    Ok(value
        .as_str()
        .and_then(|s| s.parse().ok())
        .unwrap_or_default())
}

fn size_or_default<'de, D>(deserializer: D) -> std::result::Result<TextSize, D::Error>
where
    D: Deserializer<'de>,
{
    let value = toml::Value::deserialize(deserializer)?;
    Ok(value
        .as_str()
        .and_then(|s| s.parse().ok())
        .unwrap_or_default())
}

fn word_limit_or_default<'de, D>(deserializer: D) -> std::result::Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let value = toml::Value::deserialize(deserializer)?;
    let limit = match value {
        toml::Value::Integer(n) => usize::try_from(n).ok(),
        toml::Value::String(s) => parse_word_limit(&s).ok(),
        _ => None,
    };
    Ok(limit.unwrap_or(DEFAULT_WORD_LIMIT))
}

/// Fields that can be changed through [`SettingsStore::update`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    Alias,
    TextColor,
    TextSize,
    WordLimit,
    ApiKey,
    Model,
}

impl SettingKey {
    pub const ALL: [SettingKey; 6] = [
        SettingKey::Alias,
        SettingKey::TextColor,
        SettingKey::TextSize,
        SettingKey::WordLimit,
        SettingKey::ApiKey,
        SettingKey::Model,
    ];

    /// Key name as stored in the settings file
    pub fn as_str(self) -> &'static str {
        match self {
            SettingKey::Alias => "alias",
            SettingKey::TextColor => "text_color",
            SettingKey::TextSize => "text_size",
            SettingKey::WordLimit => "word_limit",
            SettingKey::ApiKey => "api_key",
            SettingKey::Model => "model",
        }
    }

    pub fn names() -> String {
        Self::ALL.map(SettingKey::as_str).join(", ")
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = SettingsError;

    /// Accepts `text_color`, `textColor` and `TEXT-COLOR` alike
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "alias" => Ok(SettingKey::Alias),
            "textcolor" => Ok(SettingKey::TextColor),
            "textsize" => Ok(SettingKey::TextSize),
            "wordlimit" => Ok(SettingKey::WordLimit),
            "apikey" => Ok(SettingKey::ApiKey),
            "model" => Ok(SettingKey::Model),
            _ => Err(SettingsError::UnknownSetting(s.trim().to_string())),
        }
    }
}

/// Why a settings update was refused
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Invalid setting: {0}. Available options: {names}", names = SettingKey::names())]
    UnknownSetting(String),

    #[error("{0}")]
    Validation(String),

    #[error("Invalid API key: {0}")]
    InvalidApiKey(#[source] BackendError),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Parse a word limit: a non-negative integer, 0 meaning no limit
pub fn parse_word_limit(raw: &str) -> std::result::Result<usize, SettingsError> {
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|_| SettingsError::Validation("Please enter a valid number.".to_string()))?;
    usize::try_from(value)
        .map_err(|_| SettingsError::Validation("Word limit must be non-negative.".to_string()))
}

/// Mask a secret for display, keeping only its first and last four characters
pub fn mask_secret(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}{}", head, "*".repeat(chars.len() - 8), tail)
}

/// Loads and persists [`Settings`] at a fixed path
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `path` if given, else `$CM_CONFIG`, else the default location
    pub fn locate(path: Option<PathBuf>) -> Result<Self> {
        let path = path
            .or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from))
            .or_else(Self::default_path)
            .context("Could not determine config directory")?;
        Ok(Self::new(path))
    }

    /// Get the default settings path (~/.config/cm/config.toml)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("cm").join("config.toml"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings, creating or repairing the file as needed
    pub fn load(&self) -> Result<Settings> {
        if !self.path.exists() {
            let settings = Settings::default();
            self.save(&settings)?;
            info!(path = %self.path.display(), "created default settings");
            return Ok(settings);
        }

        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings: {}", self.path.display()))?;

        let table = match contents.parse::<toml::Table>() {
            Ok(table) => table,
            Err(err) => return self.reset_corrupt(&err.to_string()),
        };

        let missing: Vec<&str> = SettingKey::ALL
            .iter()
            .map(|key| key.as_str())
            .filter(|key| !table.contains_key(*key))
            .collect();

        let settings: Settings = match toml::Value::Table(table).try_into::<Settings>() {
            Ok(settings) => settings,
            Err(err) => return self.reset_corrupt(&err.to_string()),
        };

        if !missing.is_empty() {
            info!(?missing, "filling missing settings from defaults");
            self.save(&settings)?;
        }

        Ok(settings)
    }

    fn reset_corrupt(&self, reason: &str) -> Result<Settings> {
        debug!(path = %self.path.display(), %reason, "settings file corrupted, resetting to defaults");
        eprintln!(
            "{}",
            "Config file corrupted, resetting to defaults.".red()
        );
        let settings = Settings::default();
        self.save(&settings)?;
        Ok(settings)
    }

    /// Write settings, creating the parent directory if needed
    pub fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
        }

        let contents = toml::to_string_pretty(settings).context("Failed to serialize settings")?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write settings: {}", self.path.display()))?;
        Ok(())
    }

    /// Validate and apply a new value for `field`, then persist.
    ///
    /// A new API key is only stored after `connect` built a backend with it
    /// that answered [`API_KEY_PROBE`]. `connect` receives the candidate key
    /// and the configured model.
    pub async fn update<F>(
        &self,
        field: &str,
        raw_value: &str,
        connect: F,
    ) -> std::result::Result<Settings, SettingsError>
    where
        F: FnOnce(&str, &str) -> Box<dyn CompletionService>,
    {
        let key: SettingKey = field.parse()?;
        let mut settings = self.load()?;
        let value = raw_value.trim();

        match key {
            SettingKey::ApiKey => {
                let backend = connect(value, &settings.model);
                backend
                    .complete(API_KEY_PROBE)
                    .await
                    .map_err(SettingsError::InvalidApiKey)?;
                settings.api_key = value.to_string();
            }
            SettingKey::TextColor => {
                settings.text_color = value.parse().map_err(SettingsError::Validation)?;
            }
            SettingKey::TextSize => {
                settings.text_size = value.parse().map_err(SettingsError::Validation)?;
            }
            SettingKey::WordLimit => {
                settings.word_limit = parse_word_limit(value)?;
            }
            SettingKey::Alias => settings.alias = value.to_string(),
            SettingKey::Model => settings.model = value.to_string(),
        }

        self.save(&settings)?;
        info!(field = %key, "setting updated");
        Ok(settings)
    }
}
