//! Dependency file writing
//!
//! This module provides:
//! - ManifestWriter for applying line edits to manifest and requirements files
//! - Dry-run mode support (no actual file modifications)
//! - Byte-for-byte preservation of untouched content and line endings

use crate::domain::SpecifierEdit;
use crate::error::ManifestError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Writer for dependency files that applies specifier edits
pub struct ManifestWriter {
    /// Whether to run in dry-run mode (no file modifications)
    dry_run: bool,
}

/// A line before and after editing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineChange {
    /// 1-based line number
    pub line: usize,
    pub before: String,
    pub after: String,
}

/// Result of applying edits to one file
#[derive(Debug)]
pub struct WriteResult {
    /// Path to the file
    pub path: PathBuf,
    /// Number of edits successfully applied
    pub updates_applied: usize,
    /// Number of edits whose text was not found on their line
    pub updates_failed: usize,
    /// Whether the file was actually modified on disk
    pub file_modified: bool,
    /// Changed lines in file order
    pub changes: Vec<LineChange>,
    /// Problems encountered while applying edits
    pub errors: Vec<String>,
}

impl WriteResult {
    fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            updates_applied: 0,
            updates_failed: 0,
            file_modified: false,
            changes: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Returns true if any edits were successfully applied
    pub fn has_updates(&self) -> bool {
        self.updates_applied > 0
    }
}

impl ManifestWriter {
    /// Create a new ManifestWriter
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    /// Apply all edits for one file, writing it once at the end
    pub fn apply<'a>(
        &self,
        path: &Path,
        edits: impl IntoIterator<Item = &'a SpecifierEdit>,
    ) -> Result<WriteResult, ManifestError> {
        let content = read_content(path)?;
        let mut result = WriteResult::new(path);
        let updated = apply_edits(&content, edits, &mut result);

        if result.has_updates() && updated != content && !self.dry_run {
            write_manifest(path, &updated)?;
            result.file_modified = true;
            info!(
                "wrote {} change(s) to {}",
                result.changes.len(),
                path.display()
            );
        }

        Ok(result)
    }
}

/// Apply edits to content, recording per-line changes in `result`
fn apply_edits<'a>(
    content: &str,
    edits: impl IntoIterator<Item = &'a SpecifierEdit>,
    result: &mut WriteResult,
) -> String {
    let mut lines: Vec<(String, &str)> = content
        .split_inclusive('\n')
        .map(|raw| {
            let body_len = raw
                .strip_suffix("\r\n")
                .or_else(|| raw.strip_suffix('\n'))
                .map_or(raw.len(), str::len);
            (raw[..body_len].to_string(), &raw[body_len..])
        })
        .collect();
    let originals: Vec<String> = lines.iter().map(|(body, _)| body.clone()).collect();

    for edit in edits {
        if edit.is_noop() {
            continue;
        }
        let slot = match edit.line.checked_sub(1) {
            Some(index) => lines.get_mut(index),
            None => None,
        };
        let Some((body, _)) = slot else {
            result.updates_failed += 1;
            result
                .errors
                .push(format!("{}: line {} does not exist", edit.file.display(), edit.line));
            continue;
        };
        match find_fragment(body, &edit.old) {
            Some(idx) => {
                body.replace_range(idx..idx + edit.old.len(), &edit.new);
                result.updates_applied += 1;
            }
            None => {
                result.updates_failed += 1;
                result.errors.push(format!(
                    "{}:{}: '{}' not found",
                    edit.file.display(),
                    edit.line,
                    edit.old
                ));
            }
        }
    }

    let mut output = String::with_capacity(content.len());
    for (index, ((body, ending), original)) in lines.iter().zip(&originals).enumerate() {
        if body != original {
            result.changes.push(LineChange {
                line: index + 1,
                before: original.clone(),
                after: body.clone(),
            });
        }
        output.push_str(body);
        output.push_str(ending);
    }
    output
}

/// Find `fragment` in `line` where it is not glued to a longer name or version
fn find_fragment(line: &str, fragment: &str) -> Option<usize> {
    let glued =
        |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '*' | '+' | '!');
    line.match_indices(fragment).map(|(idx, _)| idx).find(|&idx| {
        let before = line[..idx].chars().next_back();
        let after = line[idx + fragment.len()..].chars().next();
        !before.is_some_and(glued) && !after.is_some_and(glued)
    })
}

/// Read a dependency file's content
fn read_content(path: &Path) -> Result<String, ManifestError> {
    fs::read_to_string(path).map_err(|e| ManifestError::from_read(path, e))
}

/// Write content to a dependency file through a sibling temp file and a rename
pub fn write_manifest(path: &Path, content: &str) -> Result<(), ManifestError> {
    let temp_path = temp_path_for(path);
    if let Err(e) = fs::write(&temp_path, content) {
        let _ = fs::remove_file(&temp_path);
        return Err(ManifestError::write(path, e));
    }
    if let Ok(metadata) = fs::metadata(path) {
        let _ = fs::set_permissions(&temp_path, metadata.permissions());
    }
    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        ManifestError::write(path, e)
    })
}

/// `.<name>.<pid>.tmp` next to `path`, so the rename stays on one filesystem
pub(crate) fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.{}.tmp", name, std::process::id()))
}
