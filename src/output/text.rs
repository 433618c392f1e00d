//! Text output formatter for human-readable display
//!
//! This module provides:
//! - Per-file update display with colors
//! - Version change type indication (major/minor/patch)
//! - Skipped package display with reasons
//! - The `show` table and comment refresh listing

use crate::domain::{FileSyncResult, SkipReason, SyncSummary, UpdateResult};
use crate::manifest::MAIN_GROUP;
use crate::output::{OutputFormatter, Verbosity};
use crate::sync::{CommentReport, ShowReport, ShowRow, SyncReport};
use colored::Colorize;
use std::collections::BTreeMap;
use std::io::Write;

/// Release segment change between two versions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionChangeType {
    /// First release segment changed
    Major,
    /// Second release segment changed
    Minor,
    /// Anything smaller
    Patch,
    /// Unknown or unparseable
    Unknown,
}

impl VersionChangeType {
    /// Determine the change type between two versions
    pub fn from_versions(old: &str, new: &str) -> Self {
        let release = |v: &str| -> Option<(u64, u64)> {
            let v = v.strip_prefix('v').unwrap_or(v);
            let v = v.split_once('!').map_or(v, |(_, rest)| rest);
            let mut parts = v.split('.').map(|part| {
                let digits: String = part.chars().take_while(char::is_ascii_digit).collect();
                digits.parse::<u64>().ok()
            });
            let major = parts.next()??;
            let minor = parts.next().flatten().unwrap_or(0);
            Some((major, minor))
        };

        match (release(old), release(new)) {
            (Some((old_major, old_minor)), Some((new_major, new_minor))) => {
                if new_major != old_major {
                    VersionChangeType::Major
                } else if new_minor != old_minor {
                    VersionChangeType::Minor
                } else {
                    VersionChangeType::Patch
                }
            }
            _ => VersionChangeType::Unknown,
        }
    }

    /// Get the display label with color
    pub fn colored_label(&self) -> String {
        match self {
            VersionChangeType::Major => "major".red().bold().to_string(),
            VersionChangeType::Minor => "minor".yellow().to_string(),
            VersionChangeType::Patch => "patch".green().to_string(),
            VersionChangeType::Unknown => "?".dimmed().to_string(),
        }
    }

    /// Get the plain label
    pub fn label(&self) -> &'static str {
        match self {
            VersionChangeType::Major => "major",
            VersionChangeType::Minor => "minor",
            VersionChangeType::Patch => "patch",
            VersionChangeType::Unknown => "?",
        }
    }
}

/// Text formatter for human-readable output
pub struct TextFormatter {
    /// Verbosity level
    verbosity: Verbosity,
    /// Whether this is a dry-run
    dry_run: bool,
    /// Whether to use colors
    color: bool,
}

impl TextFormatter {
    /// Create a new text formatter
    pub fn new(verbosity: Verbosity, dry_run: bool) -> Self {
        Self::with_color(verbosity, dry_run, true)
    }

    /// Create a new text formatter with color option
    pub fn with_color(verbosity: Verbosity, dry_run: bool, color: bool) -> Self {
        Self {
            verbosity,
            dry_run,
            color,
        }
    }

    /// Get the dry-run prefix if applicable
    fn dry_run_prefix(&self) -> String {
        if !self.dry_run {
            String::new()
        } else if self.color {
            format!("{} ", "(dry-run)".cyan())
        } else {
            "(dry-run) ".to_string()
        }
    }

    fn plural(count: usize, one: &'static str, many: &'static str) -> &'static str {
        if count == 1 {
            one
        } else {
            many
        }
    }

    /// Calculate the maximum package name length for alignment
    fn max_name_length<'a>(&self, results: impl Iterator<Item = &'a UpdateResult>) -> usize {
        results.map(|r| r.package_name().len()).max().unwrap_or(0)
    }

    /// Format a single update line
    fn format_update_line(
        &self,
        result: &UpdateResult,
        max_name_len: usize,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let UpdateResult::Update {
            dependency,
            new_version,
            ..
        } = result
        else {
            return Ok(());
        };
        let old_version = dependency.current_version().unwrap_or("?");
        let change_type = VersionChangeType::from_versions(old_version, new_version);
        let group = if dependency.group == MAIN_GROUP {
            String::new()
        } else {
            format!(" ({})", dependency.group)
        };

        if self.color {
            writeln!(
                writer,
                "  {} {} {} {} [{}]{}",
                format!("{:width$}", dependency.name, width = max_name_len),
                old_version.dimmed(),
                "→".dimmed(),
                new_version.bright_white().bold(),
                change_type.colored_label(),
                group.dimmed()
            )
        } else {
            writeln!(
                writer,
                "  {:width$} {} -> {} [{}]{}",
                dependency.name,
                old_version,
                new_version,
                change_type.label(),
                group,
                width = max_name_len
            )
        }
    }

    /// Format a single skip line
    fn format_skip_line(
        &self,
        name: &str,
        reason: &SkipReason,
        max_name_len: usize,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        if !self.color {
            return writeln!(writer, "    {:width$} ({})", name, reason, width = max_name_len);
        }

        let name_display = format!("{:width$}", name, width = max_name_len);
        let reason_display = format!("({})", reason);
        if reason.is_failure() {
            writeln!(writer, "    {} {}", name_display.yellow(), reason_display.yellow())
        } else {
            writeln!(writer, "    {} {}", name_display.dimmed(), reason_display.dimmed())
        }
    }

    /// Format one file's updates, plus failures (or all skips when verbose)
    fn format_file(&self, file: &FileSyncResult, writer: &mut dyn Write) -> std::io::Result<()> {
        let verbose = self.verbosity == Verbosity::Verbose;
        let skips: Vec<&UpdateResult> = file
            .skips()
            .filter(|r| verbose || r.is_failure())
            .collect();
        if !file.has_updates() && skips.is_empty() {
            return Ok(());
        }

        let update_count = file.update_count();
        let skip_count = file.skip_count();
        let path_display = file.path.display().to_string();
        if self.color {
            writeln!(
                writer,
                "{}{}: {} {}, {} {}",
                self.dry_run_prefix(),
                path_display.bold(),
                update_count.to_string().green(),
                Self::plural(update_count, "update", "updates"),
                skip_count.to_string().dimmed(),
                Self::plural(skip_count, "skip", "skips")
            )?;
        } else {
            writeln!(
                writer,
                "{}{}: {} {}, {} {}",
                self.dry_run_prefix(),
                path_display,
                update_count,
                Self::plural(update_count, "update", "updates"),
                skip_count,
                Self::plural(skip_count, "skip", "skips")
            )?;
        }

        let max_name_len = self.max_name_length(file.results.iter()).max(16);
        for result in file.updates() {
            self.format_update_line(result, max_name_len, writer)?;
        }

        if !skips.is_empty() {
            if self.color {
                writeln!(writer, "  {}", "Skipped:".dimmed())?;
            } else {
                writeln!(writer, "  Skipped:")?;
            }
            for result in skips {
                if let UpdateResult::Skip { dependency, reason } = result {
                    self.format_skip_line(&dependency.name, reason, max_name_len, writer)?;
                }
            }
        }

        writeln!(writer)?;
        Ok(())
    }

    /// Count updates by change type
    fn count_by_change_type(&self, summary: &SyncSummary) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for result in summary.all_updates() {
            if let UpdateResult::Update {
                dependency,
                new_version,
                ..
            } = result
            {
                let old = dependency.current_version().unwrap_or("?");
                let label = match VersionChangeType::from_versions(old, new_version) {
                    VersionChangeType::Unknown => "other",
                    other => other.label(),
                };
                *counts.entry(label).or_insert(0) += 1;
            }
        }
        counts
    }

    fn format_summary(&self, summary: &SyncSummary, writer: &mut dyn Write) -> std::io::Result<()> {
        let prefix = self.dry_run_prefix();
        let updates = summary.total_updates();
        let skips = summary.total_skips();

        if self.verbosity == Verbosity::Quiet {
            return if updates == 0 {
                writeln!(writer, "{}No updates", prefix)
            } else {
                writeln!(writer, "{}{} updated", prefix, updates)
            };
        }

        if self.color {
            writeln!(writer, "{}{}:", prefix, "Summary".bold())?;
        } else {
            writeln!(writer, "{}Summary:", prefix)?;
        }

        if updates > 0 {
            let counts = self.count_by_change_type(summary);
            let breakdown: Vec<String> = ["major", "minor", "patch", "other"]
                .iter()
                .filter_map(|label| counts.get(label).map(|count| format!("{} {}", count, label)))
                .collect();
            let count = if self.color {
                updates.to_string().green().to_string()
            } else {
                updates.to_string()
            };
            writeln!(
                writer,
                "  {} constraint(s) updated ({})",
                count,
                breakdown.join(", ")
            )?;
        } else if self.color {
            writeln!(writer, "  {}", "No constraints updated".dimmed())?;
        } else {
            writeln!(writer, "  No constraints updated")?;
        }
        writeln!(writer, "  {} dependency(ies) skipped", skips)?;

        if summary.lookups_failed > 0 {
            let line = format!(
                "  {} of {} lookup(s) failed",
                summary.lookups_failed, summary.lookups_attempted
            );
            if self.color {
                writeln!(writer, "{}", line.yellow())?;
            } else {
                writeln!(writer, "{}", line)?;
            }
        }

        if self.verbosity == Verbosity::Verbose {
            writeln!(
                writer,
                "  {} file(s) processed, {} written",
                summary.files_processed(),
                summary.files_written()
            )?;
        }
        Ok(())
    }

    fn show_columns(&self, row: &ShowRow, offline: bool) -> Vec<String> {
        let mut columns = vec![
            row.name.clone(),
            row.group.clone(),
            if row.specifier.is_empty() {
                "*".to_string()
            } else {
                row.specifier.clone()
            },
            row.installed.clone().unwrap_or_else(|| "-".to_string()),
        ];
        if !offline {
            columns.push(row.latest.clone().unwrap_or_else(|| "?".to_string()));
        }
        columns
    }
}

impl OutputFormatter for TextFormatter {
    fn format_sync(&self, report: &SyncReport, writer: &mut dyn Write) -> std::io::Result<()> {
        if self.verbosity != Verbosity::Quiet {
            for file in &report.summary.files {
                self.format_file(file, writer)?;
            }
        }

        self.format_summary(&report.summary, writer)?;

        if !report.installs.is_empty() && self.verbosity != Verbosity::Quiet {
            writeln!(writer)?;
            writeln!(writer, "Installed:")?;
            for install in &report.installs {
                writeln!(writer, "  {}", install.command)?;
            }
        }
        if let Some(comments) = &report.comments {
            if comments.has_changes() && self.verbosity != Verbosity::Quiet {
                writeln!(writer, "  {} comment(s) refreshed", comments.edits.len())?;
            }
        }
        Ok(())
    }

    fn format_show(&self, report: &ShowReport, writer: &mut dyn Write) -> std::io::Result<()> {
        let upgradable = report.upgradable().count();

        if self.verbosity == Verbosity::Quiet {
            return writeln!(writer, "{} upgradable", upgradable);
        }
        if report.rows.is_empty() {
            return writeln!(writer, "No dependencies declared");
        }

        let mut headers = vec!["Package", "Group", "Specifier", "Installed"];
        if !report.offline {
            headers.push("Latest");
        }
        let rows: Vec<Vec<String>> = report
            .rows
            .iter()
            .map(|row| self.show_columns(row, report.offline))
            .collect();
        let widths: Vec<usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| rows.iter().map(|r| r[i].len()).max().unwrap_or(0).max(h.len()))
            .collect();

        let header_line = headers
            .iter()
            .zip(&widths)
            .map(|(h, w)| format!("{:w$}", h, w = w))
            .collect::<Vec<_>>()
            .join("  ");
        if self.color {
            writeln!(writer, "{}", header_line.trim_end().bold())?;
        } else {
            writeln!(writer, "{}", header_line.trim_end())?;
        }

        for (row, columns) in report.rows.iter().zip(&rows) {
            let line = columns
                .iter()
                .zip(&widths)
                .map(|(c, w)| format!("{:w$}", c, w = w))
                .collect::<Vec<_>>()
                .join("  ");
            let line = line.trim_end();
            match (row.upgradable, self.color) {
                (true, true) => writeln!(writer, "{} {}", line.green(), "↑".green().bold())?,
                (true, false) => writeln!(writer, "{} ^", line)?,
                (false, _) => writeln!(writer, "{}", line)?,
            }
            if self.verbosity == Verbosity::Verbose {
                if let Some(error) = &row.error {
                    writeln!(writer, "    {} ({})", error, row.location)?;
                }
            }
        }

        writeln!(writer)?;
        let footer = format!(
            "{} package(s), {} upgradable",
            report.rows.len(),
            upgradable
        );
        if self.color {
            writeln!(writer, "{}", footer.dimmed())?;
        } else {
            writeln!(writer, "{}", footer)?;
        }
        if report.environment.is_none() && self.verbosity == Verbosity::Verbose {
            writeln!(writer, "No isolated environment detected; installed versions unavailable")?;
        }
        Ok(())
    }

    fn format_comments(
        &self,
        report: &CommentReport,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let prefix = self.dry_run_prefix();
        if !report.has_changes() {
            return writeln!(writer, "{}Comments already up to date", prefix);
        }

        if self.verbosity != Verbosity::Quiet {
            for write in &report.writes {
                if self.color {
                    writeln!(writer, "{}{}", prefix, write.path.display().to_string().bold())?;
                } else {
                    writeln!(writer, "{}{}", prefix, write.path.display())?;
                }
                for change in &write.changes {
                    writeln!(writer, "  {:>4}: {}", change.line, change.after.trim())?;
                }
            }
            writeln!(writer)?;
        }
        writeln!(writer, "{}{} comment(s) updated", prefix, report.edits.len())
    }
}
