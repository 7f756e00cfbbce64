//! Cleanup of raw command output before it is embedded in a prompt.
//!
//! Terminal output is full of color codes and padding that only cost prompt
//! space. [`clean`] strips escape sequences, folds runs of blank lines and
//! bounds the result to [`MAX_CHARS`] characters.

use regex::Regex;
use std::sync::LazyLock;

/// Maximum number of characters kept from command output
pub const MAX_CHARS: usize = 1500;

/// Appended when the output had to be cut at [`MAX_CHARS`]
pub const TRUNCATION_MARKER: &str = "...(truncated)";

/// CSI sequences (`ESC [ params intermediates final`) and two-byte escapes.
static ANSI_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1B(?:[@-Z\\-_]|\[[0-?]*[ -/]*[@-~])").expect("invalid ANSI escape regex")
});

/// A CSI introducer at the very end of the text that is still waiting for its final byte.
static PARTIAL_CSI_TAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1B\[[0-?]*[ -/]*\z").expect("invalid partial CSI regex"));

/// Two line breaks with only whitespace (including more line breaks) between them.
static BLANK_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("invalid blank line regex"));

/// Blank lines at the very start of the text, at least two of them.
static LEADING_BLANK_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\A[^\S\n]*\n\s*\n").expect("invalid leading blank line regex")
});

/// Clean raw command output for use in a prompt.
///
/// Never fails. Whitespace-only input yields an empty string.
pub fn clean(input: &str) -> String {
    let stripped = strip_ansi(input);
    let collapsed = collapse_blank_lines(&stripped);
    let trimmed = trim_trailing_whitespace(&collapsed);
    truncate_chars(trimmed)
}

/// Remove ANSI escape sequences.
///
/// Removal repeats until nothing matches, so a fragment that only becomes a
/// complete sequence once its neighbour is gone is removed as well. Partial
/// fragments that never complete are left alone.
pub fn strip_ansi(input: &str) -> String {
    let mut current = input.to_string();
    while ANSI_ESCAPE.is_match(&current) {
        current = ANSI_ESCAPE.replace_all(&current, "").into_owned();
    }
    current
}

/// Fold every run of blank lines into a single empty line.
pub fn collapse_blank_lines(input: &str) -> String {
    let head = LEADING_BLANK_RUN.replace(input, "\n");
    BLANK_RUN.replace_all(&head, "\n\n").into_owned()
}

fn trim_trailing_whitespace(input: &str) -> String {
    let body = input.trim_end();
    if body.is_empty() {
        return String::new();
    }
    if input[body.len()..].contains('\n') {
        format!("{body}\n")
    } else {
        input.to_string()
    }
}

fn truncate_chars(text: String) -> String {
    if text.chars().count() <= MAX_CHARS {
        return text;
    }

    let mut head: String = text.chars().take(MAX_CHARS).collect();
    // The marker starts with CSI intermediate bytes; a dangling introducer
    // would swallow it on the next pass.
    while let Some(m) = PARTIAL_CSI_TAIL.find(&head) {
        let start = m.start();
        head.replace_range(start..start + 1, "\u{FFFD}");
    }
    head.push_str(TRUNCATION_MARKER);
    head
}
