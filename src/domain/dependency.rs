//! Dependency information structures

use super::Requirement;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::LazyLock;

static SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[-_.]+").unwrap());

/// Normalise a package name for comparison (PEP 503)
///
/// `mkdocs_material`, `MkDocs.Material` and `mkdocs--material` all become
/// `mkdocs-material`.
pub fn normalize_name(name: &str) -> String {
    SEPARATOR_RE.replace_all(name.trim(), "-").to_lowercase()
}

/// Where a dependency was declared
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SourceLocation {
    /// File the dependency was read from
    pub file: PathBuf,
    /// 1-based line number
    pub line: usize,
}

impl SourceLocation {
    pub fn new(file: impl Into<PathBuf>, line: usize) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file.display(), self.line)
    }
}

/// Represents a declared package dependency
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dependency {
    /// Package name exactly as written
    pub name: String,
    /// PEP 503 normalised name used for lookups
    pub normalized: String,
    /// Parsed requirement
    pub requirement: Requirement,
    /// Dependency group (`dependencies`, an extra name, or a requirements file name)
    pub group: String,
    /// Declaration site
    pub location: SourceLocation,
}

impl Dependency {
    /// Creates a new dependency
    pub fn new(
        requirement: Requirement,
        group: impl Into<String>,
        location: SourceLocation,
    ) -> Self {
        Self {
            name: requirement.name.clone(),
            normalized: normalize_name(&requirement.name),
            requirement,
            group: group.into(),
            location,
        }
    }

    /// Returns true if this dependency is pinned with `==`
    pub fn is_pinned(&self) -> bool {
        self.requirement.is_pinned()
    }

    /// Returns the current minimum version, if any
    pub fn current_version(&self) -> Option<&str> {
        self.requirement.minimum_version()
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.requirement, self.location)
    }
}
