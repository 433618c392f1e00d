//! Synchronization result summary types
//!
//! Provides structures for tracking update results at file and overall levels.

use super::UpdateResult;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Update results for a single dependency file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileSyncResult {
    /// Path to the manifest or requirements file
    pub path: PathBuf,
    /// Individual dependency results in declaration order
    pub results: Vec<UpdateResult>,
    /// Whether the file was actually written
    pub written: bool,
}

impl FileSyncResult {
    /// Creates a new FileSyncResult
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            results: Vec::new(),
            written: false,
        }
    }

    /// Adds an update result
    pub fn add_result(&mut self, result: UpdateResult) {
        self.results.push(result);
    }

    pub fn update_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_update()).count()
    }

    pub fn skip_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_skip()).count()
    }

    /// Returns all updates
    pub fn updates(&self) -> impl Iterator<Item = &UpdateResult> {
        self.results.iter().filter(|r| r.is_update())
    }

    /// Returns all skips
    pub fn skips(&self) -> impl Iterator<Item = &UpdateResult> {
        self.results.iter().filter(|r| r.is_skip())
    }

    /// Returns true if any dependency in this file gets a new constraint
    pub fn has_updates(&self) -> bool {
        self.results.iter().any(|r| r.is_update())
    }
}

/// Overall summary of an upgrade run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncSummary {
    /// Results for each file, manifest first
    pub files: Vec<FileSyncResult>,
    /// Whether this was a dry run
    pub dry_run: bool,
    /// Registry lookups performed (cache hits excluded)
    pub lookups_attempted: usize,
    /// Registry lookups that produced no version
    pub lookups_failed: usize,
}

impl SyncSummary {
    /// Creates a new SyncSummary
    pub fn new(dry_run: bool) -> Self {
        Self {
            files: Vec::new(),
            dry_run,
            lookups_attempted: 0,
            lookups_failed: 0,
        }
    }

    /// Adds a file result
    pub fn add_file(&mut self, file: FileSyncResult) {
        self.files.push(file);
    }

    /// Returns the result for a given path
    pub fn file(&self, path: &Path) -> Option<&FileSyncResult> {
        self.files.iter().find(|f| f.path == path)
    }

    /// Returns the total number of files processed
    pub fn files_processed(&self) -> usize {
        self.files.len()
    }

    /// Returns the number of files written to disk
    pub fn files_written(&self) -> usize {
        self.files.iter().filter(|f| f.written).count()
    }

    /// Returns the total number of constraints updated
    pub fn total_updates(&self) -> usize {
        self.files.iter().map(|f| f.update_count()).sum()
    }

    /// Returns the total number of dependencies skipped
    pub fn total_skips(&self) -> usize {
        self.files.iter().map(|f| f.skip_count()).sum()
    }

    /// Returns true if any constraint changes
    pub fn has_changes(&self) -> bool {
        self.files.iter().any(|f| f.has_updates())
    }

    /// Returns true if lookups were attempted and none of them succeeded
    pub fn nothing_resolved(&self) -> bool {
        self.lookups_attempted > 0 && self.lookups_failed == self.lookups_attempted
    }

    /// Returns all updates across all files
    pub fn all_updates(&self) -> impl Iterator<Item = &UpdateResult> {
        self.files.iter().flat_map(|f| f.updates())
    }

    /// Returns all skips across all files
    pub fn all_skips(&self) -> impl Iterator<Item = &UpdateResult> {
        self.files.iter().flat_map(|f| f.skips())
    }
}

impl Default for SyncSummary {
    fn default() -> Self {
        Self::new(false)
    }
}
