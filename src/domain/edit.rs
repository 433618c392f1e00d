//! Line-level text edits

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// A single text replacement on one line of a file
///
/// `old` is a fragment of the line as currently written (a requirement string
/// or the whole line) and `new` is its replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpecifierEdit {
    pub file: PathBuf,
    /// 1-based line number
    pub line: usize,
    pub old: String,
    pub new: String,
}

impl SpecifierEdit {
    pub fn new(
        file: impl Into<PathBuf>,
        line: usize,
        old: impl Into<String>,
        new: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            line,
            old: old.into(),
            new: new.into(),
        }
    }

    /// Returns true if applying the edit would change nothing
    pub fn is_noop(&self) -> bool {
        self.old == self.new
    }
}

impl fmt::Display for SpecifierEdit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {} -> {}",
            self.file.display(),
            self.line,
            self.old,
            self.new
        )
    }
}
