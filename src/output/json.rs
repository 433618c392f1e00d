//! JSON output formatter for machine processing
//!
//! This module provides:
//! - JSON serialization of command reports
//! - Structured file-by-file update/skip information

use crate::domain::{FileSyncResult, SkipReason, SpecifierEdit, UpdateResult};
use crate::output::{OutputFormatter, Verbosity};
use crate::sync::{CommentReport, ShowReport, ShowRow, SyncReport};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;

/// JSON formatter for machine-readable output
pub struct JsonFormatter {
    /// Verbosity level affects detail in output
    verbosity: Verbosity,
}

impl JsonFormatter {
    /// Create a new JSON formatter
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }
}

/// JSON representation of an upgrade run
#[derive(Serialize)]
struct JsonSyncOutput {
    /// Whether this was a dry-run
    dry_run: bool,
    /// Summary statistics
    summary: JsonSummary,
    /// Per-file results
    files: Vec<JsonFile>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    installed: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comments_updated: Option<usize>,
}

/// JSON representation of summary statistics
#[derive(Serialize)]
struct JsonSummary {
    updates: usize,
    skips: usize,
    lookups_attempted: usize,
    lookups_failed: usize,
    files_written: usize,
}

/// JSON representation of a dependency file result
#[derive(Serialize)]
struct JsonFile {
    path: PathBuf,
    written: bool,
    updates: Vec<JsonUpdate>,
    /// Failed lookups are always listed
    #[serde(skip_serializing_if = "Vec::is_empty")]
    failures: Vec<JsonSkip>,
    /// Other skips (only in verbose mode)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    skips: Vec<JsonSkip>,
}

/// JSON representation of an update
#[derive(Serialize)]
struct JsonUpdate {
    name: String,
    group: String,
    line: usize,
    /// Floor before the update
    from: Option<String>,
    to: String,
    /// Requirement as written before and after
    old: String,
    new: String,
}

/// JSON representation of a skip
#[derive(Serialize)]
struct JsonSkip {
    name: String,
    line: usize,
    reason: SkipReason,
    message: String,
}

#[derive(Serialize)]
struct JsonShowOutput<'a> {
    offline: bool,
    environment: Option<&'a PathBuf>,
    upgradable: usize,
    packages: &'a [ShowRow],
}

#[derive(Serialize)]
struct JsonCommentOutput<'a> {
    dry_run: bool,
    updated: usize,
    edits: &'a [SpecifierEdit],
}

impl JsonFormatter {
    fn skip_to_json(result: &UpdateResult) -> Option<JsonSkip> {
        match result {
            UpdateResult::Skip { dependency, reason } => Some(JsonSkip {
                name: dependency.name.clone(),
                line: dependency.location.line,
                reason: reason.clone(),
                message: reason.to_string(),
            }),
            UpdateResult::Update { .. } => None,
        }
    }

    /// Convert a file result to JSON representation
    fn file_to_json(&self, file: &FileSyncResult) -> JsonFile {
        let updates = file
            .updates()
            .filter_map(|result| match result {
                UpdateResult::Update {
                    dependency,
                    new_version,
                    edit,
                } => Some(JsonUpdate {
                    name: dependency.name.clone(),
                    group: dependency.group.clone(),
                    line: dependency.location.line,
                    from: dependency.current_version().map(str::to_string),
                    to: new_version.clone(),
                    old: edit.old.clone(),
                    new: edit.new.clone(),
                }),
                UpdateResult::Skip { .. } => None,
            })
            .collect();

        let (failures, skips): (Vec<&UpdateResult>, Vec<&UpdateResult>) =
            file.skips().partition(|r| r.is_failure());
        let skips = if self.verbosity == Verbosity::Verbose {
            skips.into_iter().filter_map(Self::skip_to_json).collect()
        } else {
            Vec::new()
        };

        JsonFile {
            path: file.path.clone(),
            written: file.written,
            updates,
            failures: failures.into_iter().filter_map(Self::skip_to_json).collect(),
            skips,
        }
    }

    fn write_json<T: Serialize>(value: &T, writer: &mut dyn Write) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(std::io::Error::other)?;
        writeln!(writer, "{}", json)
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_sync(&self, report: &SyncReport, writer: &mut dyn Write) -> std::io::Result<()> {
        let summary = &report.summary;
        let output = JsonSyncOutput {
            dry_run: summary.dry_run,
            summary: JsonSummary {
                updates: summary.total_updates(),
                skips: summary.total_skips(),
                lookups_attempted: summary.lookups_attempted,
                lookups_failed: summary.lookups_failed,
                files_written: summary.files_written(),
            },
            files: summary.files.iter().map(|f| self.file_to_json(f)).collect(),
            installed: report.installs.iter().map(|i| i.command.clone()).collect(),
            comments_updated: report.comments.as_ref().map(|c| c.edits.len()),
        };
        Self::write_json(&output, writer)
    }

    fn format_show(&self, report: &ShowReport, writer: &mut dyn Write) -> std::io::Result<()> {
        let output = JsonShowOutput {
            offline: report.offline,
            environment: report.environment.as_ref(),
            upgradable: report.upgradable().count(),
            packages: &report.rows,
        };
        Self::write_json(&output, writer)
    }

    fn format_comments(
        &self,
        report: &CommentReport,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let output = JsonCommentOutput {
            dry_run: report.dry_run,
            updated: report.edits.len(),
            edits: &report.edits,
        };
        Self::write_json(&output, writer)
    }
}
