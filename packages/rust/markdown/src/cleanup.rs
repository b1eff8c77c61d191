//! Cleanup pipeline turning tag-delimited task content into Markdown.
//!
//! Each pass is a function `&str -> String` applied in sequence. Known tags
//! become list markers, everything else is stripped, then lines are trimmed
//! and blank lines dropped.

use std::sync::LazyLock;

use regex::Regex;

/// Stands in for the indentation of a phase item until lines are trimmed.
const INDENT_SENTINEL: char = '\u{1}';

/// Run the full cleanup pipeline on tag-delimited task content.
pub fn clean_task_markup(content: &str) -> String {
    let mut result = content.to_string();

    result = mark_mandates(&result);
    result = mark_list_items(&result);
    result = mark_phases(&result);
    result = strip_remaining_tags(&result);
    result = tidy_lines(&result);

    result
}

// ---------------------------------------------------------------------------
// Pass 1: Mandates
// ---------------------------------------------------------------------------

fn mark_mandates(text: &str) -> String {
    static OPEN_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"<mandate(?:\s[^>]*)?>").expect("valid regex"));

    OPEN_RE.replace_all(text, "- **MANDATE:** ").to_string()
}

// ---------------------------------------------------------------------------
// Pass 2: Rules and actions
// ---------------------------------------------------------------------------

fn mark_list_items(text: &str) -> String {
    static OPEN_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"<(?:rule|action)(?:\s[^>]*)?>").expect("valid regex")
    });

    OPEN_RE.replace_all(text, "- ").to_string()
}

// ---------------------------------------------------------------------------
// Pass 3: Phases (nested one level)
// ---------------------------------------------------------------------------

fn mark_phases(text: &str) -> String {
    static OPEN_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"<phase(?:\s[^>]*)?>").expect("valid regex"));

    OPEN_RE
        .replace_all(text, format!("{INDENT_SENTINEL}- ").as_str())
        .to_string()
}

// ---------------------------------------------------------------------------
// Pass 4: Everything else
// ---------------------------------------------------------------------------

/// Remove every remaining opening, closing or self-closing tag.
fn strip_remaining_tags(text: &str) -> String {
    static TAG_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"</?[A-Za-z][^>]*>").expect("valid regex"));

    TAG_RE.replace_all(text, "").to_string()
}

// ---------------------------------------------------------------------------
// Pass 5: Lines
// ---------------------------------------------------------------------------

/// Trim source indentation, drop blank lines, restore phase indentation.
fn tidy_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.replace(INDENT_SENTINEL, "  "))
        .collect::<Vec<_>>()
        .join("\n")
}
