//! Presentation of backend answers in the terminal.
//!
//! [`render`] applies the word limit and the size framing and returns a
//! [`RenderedText`]; color is only applied when the value is displayed, so
//! everything here can be compared as plain text.

use colored::{Color, Colorize};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Hint appended after an answer cut at the word limit
pub const TRUNCATION_HINT: &str = "(Response truncated. Use --full for complete response)";

/// First line of the `large` banner
pub const BANNER_HEADER: &str = "=== AI Response ===";

/// Last line of the `large` banner
pub const BANNER_RULE: &str = "===============";

/// Color used for rendered answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TextColor {
    Red,
    #[default]
    Green,
    Blue,
    Yellow,
    Cyan,
    Magenta,
    White,
}

impl TextColor {
    pub const ALL: [TextColor; 7] = [
        TextColor::Red,
        TextColor::Green,
        TextColor::Blue,
        TextColor::Yellow,
        TextColor::Cyan,
        TextColor::Magenta,
        TextColor::White,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TextColor::Red => "red",
            TextColor::Green => "green",
            TextColor::Blue => "blue",
            TextColor::Yellow => "yellow",
            TextColor::Cyan => "cyan",
            TextColor::Magenta => "magenta",
            TextColor::White => "white",
        }
    }

    /// Comma separated list of every color name
    pub fn names() -> String {
        Self::ALL.map(TextColor::as_str).join(", ")
    }
}

impl fmt::Display for TextColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TextColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|color| color.as_str() == wanted)
            .ok_or_else(|| {
                format!(
                    "Invalid color: {}. Please choose from: {}",
                    s,
                    Self::names()
                )
            })
    }
}

impl From<TextColor> for Color {
    fn from(color: TextColor) -> Self {
        match color {
            TextColor::Red => Color::Red,
            TextColor::Green => Color::Green,
            TextColor::Blue => Color::Blue,
            TextColor::Yellow => Color::Yellow,
            TextColor::Cyan => Color::Cyan,
            TextColor::Magenta => Color::Magenta,
            TextColor::White => Color::White,
        }
    }
}

/// How much framing surrounds a rendered answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TextSize {
    Small,
    #[default]
    Normal,
    Large,
}

impl TextSize {
    pub const ALL: [TextSize; 3] = [TextSize::Small, TextSize::Normal, TextSize::Large];

    pub fn as_str(self) -> &'static str {
        match self {
            TextSize::Small => "small",
            TextSize::Normal => "normal",
            TextSize::Large => "large",
        }
    }

    pub fn names() -> String {
        Self::ALL.map(TextSize::as_str).join(", ")
    }
}

impl fmt::Display for TextSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TextSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "small" => Ok(TextSize::Small),
            "normal" => Ok(TextSize::Normal),
            "large" => Ok(TextSize::Large),
            _ => Err(format!(
                "Invalid size: {}. Please choose from: {}",
                s,
                Self::names()
            )),
        }
    }
}

/// Color and size of a rendered answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Style {
    pub color: TextColor,
    pub size: TextSize,
}

/// Formatter output: framed plain text plus the style to paint it with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedText {
    pub body: String,
    pub style: Style,
    /// Whether the word limit cut the text
    pub truncated: bool,
}

impl fmt::Display for RenderedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let color = Color::from(self.style.color);
        match self.body.strip_prefix('\n') {
            Some(rest) => write!(f, "\n{}", rest.color(color)),
            None => write!(f, "{}", self.body.color(color)),
        }
    }
}

/// What a pipeline hands back for printing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// A backend answer run through [`render`]
    Rendered(RenderedText),
    /// A plain message produced without asking the backend
    Notice(String),
    /// Backend failure, already worded for the user
    Failure(String),
}

impl Answer {
    /// Text without any terminal styling
    pub fn plain(&self) -> &str {
        match self {
            Answer::Rendered(rendered) => &rendered.body,
            Answer::Notice(message) | Answer::Failure(message) => message,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Answer::Failure(_))
    }

    /// One line summary shown under the answer in debug output
    pub fn debug_footer(&self) -> String {
        let mut footer = format!("({} chars", self.plain().chars().count());
        match self {
            Answer::Rendered(rendered) if rendered.truncated => {
                footer.push_str(", cut at word limit")
            }
            Answer::Notice(_) => footer.push_str(", backend not called"),
            _ if self.is_failure() => footer.push_str(", backend failed"),
            _ => {}
        }
        footer.push(')');
        footer
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Answer::Rendered(rendered) => fmt::Display::fmt(rendered, f),
            Answer::Notice(message) => f.write_str(message),
            Answer::Failure(message) => write!(f, "{}", message.red()),
        }
    }
}

/// Keep at most `limit` whitespace separated words.
///
/// Returns the text unchanged when `limit` is 0 or the text already fits.
/// Otherwise the first `limit` words are joined with single spaces and the
/// truncation hint is appended on its own line.
pub fn truncate_words(text: &str, limit: usize) -> (String, bool) {
    if limit == 0 {
        return (text.to_string(), false);
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= limit {
        return (text.to_string(), false);
    }

    (
        format!("{}...\n{}", words[..limit].join(" "), TRUNCATION_HINT),
        true,
    )
}

/// Apply the word limit and the size framing to `text`.
///
/// `override_unlimited` disables the word limit regardless of its value.
pub fn render(
    text: &str,
    word_limit: usize,
    color: TextColor,
    size: TextSize,
    override_unlimited: bool,
) -> RenderedText {
    let limit = if override_unlimited { 0 } else { word_limit };
    let (text, truncated) = truncate_words(text, limit);

    let body = match size {
        TextSize::Large => format!("\n{BANNER_HEADER}\n{text}\n{BANNER_RULE}\n"),
        TextSize::Small => format!("\n{text}\n"),
        TextSize::Normal => format!("\n> {text}\n"),
    };

    RenderedText {
        body,
        style: Style { color, size },
        truncated,
    }
}

/// Format a user-facing error with an optional tip line
pub fn format_error(message: &str, tip: Option<&str>) -> String {
    let mut output = format!("{} {}", "Error:".red().bold(), message);
    if let Some(tip) = tip {
        output.push('\n');
        output.push_str(&format!("{} {}", "Tip:".blue().bold(), tip));
    }
    output
}

pub fn print_debug_section(title: &str, body: &str, footer: Option<String>) {
    eprintln!("{}", format!("=== DEBUG: {title} ===").yellow().bold());
    if body.trim().is_empty() {
        eprintln!("{}", "| <empty>".dimmed());
    } else {
        for line in body.lines() {
            eprintln!("{}", format!("| {line}").bright_white());
        }
    }
    if let Some(footer) = footer {
        eprintln!("{}", footer.dimmed());
    }
    eprintln!();
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANSWER: &str = "The repository URL is wrong. Fix: check the remote URL.";

    #[test]
    fn test_render_normal_style() {
        let rendered = render(ANSWER, 150, TextColor::Green, TextSize::Normal, false);
        assert_eq!(rendered.body, format!("\n> {ANSWER}\n"));
        assert_eq!(rendered.style.color, TextColor::Green);
        assert!(!rendered.truncated);
    }

    #[test]
    fn test_render_large_style_has_banner() {
        let rendered = render(ANSWER, 0, TextColor::Cyan, TextSize::Large, false);
        assert_eq!(
            rendered.body,
            format!("\n{BANNER_HEADER}\n{ANSWER}\n{BANNER_RULE}\n")
        );
    }

    #[test]
    fn test_render_small_style_has_no_decoration() {
        let rendered = render(ANSWER, 0, TextColor::Red, TextSize::Small, false);
        assert_eq!(rendered.body, format!("\n{ANSWER}\n"));
        assert!(!rendered.body.contains(BANNER_HEADER));
        assert!(!rendered.body.contains("> "));
    }

    #[test]
    fn test_render_truncates_at_word_limit() {
        let text = "one two  three\nfour five six";
        let rendered = render(text, 4, TextColor::Green, TextSize::Small, false);
        assert_eq!(
            rendered.body,
            format!("\none two three four...\n{TRUNCATION_HINT}\n")
        );
        assert!(rendered.truncated);
    }

    #[test]
    fn test_render_zero_limit_keeps_text_verbatim() {
        let text = "word ".repeat(500);
        let rendered = render(&text, 0, TextColor::Green, TextSize::Small, false);
        assert_eq!(rendered.body, format!("\n{text}\n"));
    }

    #[test]
    fn test_render_override_ignores_limit() {
        let text = "a b c d e f";
        let rendered = render(text, 2, TextColor::Green, TextSize::Normal, true);
        assert_eq!(rendered.body, "\n> a b c d e f\n");
        assert!(!rendered.truncated);
    }

    #[test]
    fn test_render_text_at_limit_is_not_truncated() {
        let rendered = render("a b c", 3, TextColor::Green, TextSize::Normal, false);
        assert_eq!(rendered.body, "\n> a b c\n");
    }

    #[test]
    fn test_render_empty_text() {
        let rendered = render("", 10, TextColor::White, TextSize::Normal, false);
        assert_eq!(rendered.body, "\n> \n");
    }

    #[test]
    fn test_truncate_words_keeps_first_words_in_order() {
        let (text, truncated) = truncate_words("alpha beta gamma delta", 2);
        assert!(truncated);
        assert!(text.starts_with("alpha beta..."));
        assert!(text.ends_with(TRUNCATION_HINT));
        assert!(!text.contains("gamma"));
    }

    // Both halves share one test: the colored override is process global.
    #[test]
    fn test_rendered_text_display_paints_body_in_chosen_color() {
        let rendered = render(ANSWER, 150, TextColor::Green, TextSize::Normal, false);

        colored::control::set_override(true);
        let painted = rendered.to_string();
        colored::control::set_override(false);
        let plain = rendered.to_string();
        colored::control::unset_override();

        assert_eq!(painted, format!("\n\x1b[32m> {ANSWER}\n\x1b[0m"));
        assert_eq!(plain, rendered.body);

        let cyan = render(ANSWER, 150, TextColor::Cyan, TextSize::Small, false);
        colored::control::set_override(true);
        let painted_cyan = cyan.to_string();
        colored::control::unset_override();
        assert!(painted_cyan.starts_with("\n\x1b[36m"));
    }

    #[test]
    fn test_color_from_str() {
        assert_eq!("green".parse::<TextColor>().unwrap(), TextColor::Green);
        assert_eq!("MAGENTA".parse::<TextColor>().unwrap(), TextColor::Magenta);
        assert_eq!(" cyan ".parse::<TextColor>().unwrap(), TextColor::Cyan);
        assert!("purple".parse::<TextColor>().is_err());
    }

    #[test]
    fn test_size_from_str() {
        assert_eq!("large".parse::<TextSize>().unwrap(), TextSize::Large);
        assert_eq!("Small".parse::<TextSize>().unwrap(), TextSize::Small);
        assert!("huge".parse::<TextSize>().is_err());
    }

    #[test]
    fn test_color_names_lists_every_color() {
        assert_eq!(
            TextColor::names(),
            "red, green, blue, yellow, cyan, magenta, white"
        );
    }

    #[test]
    fn test_answer_debug_footer() {
        let cut = Answer::Rendered(render("a b c d", 2, TextColor::Green, TextSize::Small, false));
        assert!(cut.debug_footer().ends_with(", cut at word limit)"));

        let whole = Answer::Rendered(render("a b", 2, TextColor::Green, TextSize::Small, false));
        assert_eq!(whole.debug_footer(), "(5 chars)");

        let failed = Answer::Failure("Error: boom".to_string());
        assert_eq!(failed.debug_footer(), "(11 chars, backend failed)");

        let notice = Answer::Notice("No error output to analyze.".to_string());
        assert_eq!(notice.debug_footer(), "(27 chars, backend not called)");
    }

    #[test]
    fn test_answer_plain() {
        let notice = Answer::Notice("No error output to analyze.".to_string());
        assert_eq!(notice.plain(), "No error output to analyze.");
        assert!(!notice.is_failure());
        assert!(Answer::Failure("Error: boom".to_string()).is_failure());
    }
}
