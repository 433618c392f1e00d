//! Inline version comments on dependency lines
//!
//! A dependency line gets its comment refreshed with the installed version:
//! - `ruff>=0.9  # Linter (v0.9.0)` becomes `ruff>=0.9  # Linter (v0.15.0)`
//! - `ruff>=0.9  # Linter` becomes `ruff>=0.9  # Linter (v0.15.0)`
//! - `ruff>=0.9` becomes `ruff>=0.9  # An extremely fast Python linter (v0.15.0)`

use crate::manifest::split_comment;
use regex::Regex;
use std::sync::LazyLock;

static VERSION_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"v?\d+\.\d+[.\d]*").unwrap());

/// Turn a package summary into comment text
///
/// Trailing periods and a leading `name:` / `name -` are removed and the
/// first letter is upper-cased. Falls back to the package name.
pub fn clean_summary(name: &str, summary: Option<&str>) -> String {
    let mut text = summary.unwrap_or("").trim().trim_end_matches('.').trim().to_string();

    let lower = text.to_lowercase();
    let prefix = name.to_lowercase();
    if let Some(rest) = lower.strip_prefix(&prefix) {
        let rest_trimmed = rest.trim_start();
        if rest_trimmed.starts_with(':') || rest_trimmed.starts_with('-') {
            let cut = text.len() - rest_trimmed.len() + 1;
            text = text[cut..].trim().to_string();
        }
    }

    if text.is_empty() {
        text = name.to_string();
    }
    capitalise(&text)
}

/// Upper-case only the first character
pub fn capitalise(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Returns the line with its comment carrying `installed`
pub fn annotate_line(line: &str, installed: &str, summary: &str) -> String {
    let (content, comment) = split_comment(line);
    let tag = format!("v{}", installed);

    match comment {
        Some(comment) if VERSION_TOKEN_RE.is_match(comment) => {
            let updated = VERSION_TOKEN_RE.replace(comment, regex::NoExpand(&tag));
            format!("{}{}", content, updated)
        }
        Some(comment) => format!("{}{} ({})", content, comment.trim_end(), tag),
        None => format!("{}  # {} ({})", content.trim_end(), summary, tag),
    }
}
