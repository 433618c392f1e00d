//! Diff output formatter for showing changes
//!
//! This module provides:
//! - Unified diff style display of rewritten lines
//! - Before/after version comparison for `show`

use crate::manifest::WriteResult;
use crate::output::OutputFormatter;
use crate::sync::{CommentReport, ShowReport, SyncReport};
use std::io::Write;

/// Diff formatter for showing line changes
pub struct DiffFormatter {
    /// Whether this is a dry-run
    dry_run: bool,
}

impl DiffFormatter {
    /// Create a new diff formatter
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    /// Get the dry-run prefix if applicable
    fn dry_run_prefix(&self) -> &'static str {
        if self.dry_run {
            "(dry-run) "
        } else {
            ""
        }
    }

    /// Write one file's changed lines as hunks
    fn format_write(&self, write: &WriteResult, writer: &mut dyn Write) -> std::io::Result<()> {
        if write.changes.is_empty() {
            return Ok(());
        }

        let prefix = self.dry_run_prefix();
        writeln!(writer, "{}--- a/{}", prefix, write.path.display())?;
        writeln!(writer, "{}+++ b/{}", prefix, write.path.display())?;
        for change in &write.changes {
            writeln!(writer, "@@ line {} @@", change.line)?;
            writeln!(writer, "-{}", change.before)?;
            writeln!(writer, "+{}", change.after)?;
        }
        writeln!(writer)
    }
}

impl OutputFormatter for DiffFormatter {
    fn format_sync(&self, report: &SyncReport, writer: &mut dyn Write) -> std::io::Result<()> {
        for write in &report.writes {
            self.format_write(write, writer)?;
        }
        if let Some(comments) = &report.comments {
            for write in &comments.writes {
                self.format_write(write, writer)?;
            }
        }

        let verb = if self.dry_run { "would be" } else { "were" };
        writeln!(
            writer,
            "{}# {} constraint(s) {} updated, {} skipped",
            self.dry_run_prefix(),
            report.summary.total_updates(),
            verb,
            report.summary.total_skips()
        )
    }

    fn format_show(&self, report: &ShowReport, writer: &mut dyn Write) -> std::io::Result<()> {
        for row in report.upgradable() {
            writeln!(writer, "@@ {} @@", row.location)?;
            writeln!(writer, "-{}{}", row.name, row.specifier)?;
            writeln!(
                writer,
                "+{} latest {}",
                row.name,
                row.latest.as_deref().unwrap_or("?")
            )?;
        }
        writeln!(
            writer,
            "# {} of {} package(s) upgradable",
            report.upgradable().count(),
            report.rows.len()
        )
    }

    fn format_comments(
        &self,
        report: &CommentReport,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        for write in &report.writes {
            self.format_write(write, writer)?;
        }
        writeln!(
            writer,
            "{}# {} comment(s) updated",
            self.dry_run_prefix(),
            report.edits.len()
        )
    }
}
