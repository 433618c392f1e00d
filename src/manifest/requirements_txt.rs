//! requirements.txt reader
//!
//! Handles:
//! - one requirement per line, with optional inline `# comment`
//! - blank lines and comment-only lines (skipped)
//! - pip options such as `-r other.txt` or `--index-url` (skipped)
//! - per-requirement options like `--hash=...` (ignored)

use crate::domain::{Dependency, Requirement, SourceLocation};
use crate::error::ManifestError;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Read dependencies from a requirements file
pub fn read_requirements(path: &Path) -> Result<Vec<Dependency>, ManifestError> {
    let content = std::fs::read_to_string(path).map_err(|e| ManifestError::from_read(path, e))?;
    Ok(parse_requirements(path, &content))
}

/// Parse requirements file content read from `path`
pub fn parse_requirements(path: &Path, content: &str) -> Vec<Dependency> {
    let group = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let mut dependencies = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let Some(text) = requirement_text(line) else {
            continue;
        };
        match Requirement::parse(text) {
            Some(requirement) => dependencies.push(Dependency::new(
                requirement,
                group.clone(),
                SourceLocation::new(path, index + 1),
            )),
            None => warn!(
                "{}:{}: ignoring unparseable requirement '{}'",
                path.display(),
                index + 1,
                text
            ),
        }
    }
    dependencies
}

/// Extract the requirement part of a line, without comments or options
pub fn requirement_text(line: &str) -> Option<&str> {
    let body = split_comment(line).0.trim();
    if body.is_empty() || body.starts_with('-') {
        return None;
    }
    let body = match body.find(" --") {
        Some(idx) => body[..idx].trim_end(),
        None => body,
    };
    Some(body)
}

/// Split a line into its content and its inline comment (`#` preceded by whitespace)
///
/// The returned comment starts at the `#`.
pub fn split_comment(line: &str) -> (&str, Option<&str>) {
    let line = line.strip_suffix('\r').unwrap_or(line);
    if line.trim_start().starts_with('#') {
        let idx = line.len() - line.trim_start().len();
        return (&line[..idx], Some(&line[idx..]));
    }
    let bytes = line.as_bytes();
    for (idx, b) in bytes.iter().enumerate() {
        if *b == b'#' && idx > 0 && bytes[idx - 1].is_ascii_whitespace() {
            return (&line[..idx], Some(&line[idx..]));
        }
    }
    (line, None)
}

/// Find requirements files matching `requirements*.txt` directly in `root`, sorted by name
pub fn discover_requirements(root: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(root) else {
        return Vec::new();
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with("requirements") && n.ends_with(".txt"))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    files
}
