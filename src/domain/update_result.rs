//! Update decision result types

use super::{Dependency, SpecifierEdit};
use serde::Serialize;
use std::fmt;

/// Reason why a dependency update was skipped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// Constraint contains `==` or `===`
    Pinned,
    /// No `>=` or `~=` clause to bump
    Unconstrained,
    /// Floor is already at or above the latest version
    AlreadyLatest,
    /// Latest version is outside an upper-bound clause
    ExceedsUpperBound(String),
    /// Registry lookup did not produce a version
    LookupFailed(String),
    /// Package listed in `[tool.depsync] exclude`
    Excluded,
    /// Another package was selected on the command line
    NotSelected,
}

impl SkipReason {
    /// Returns true if this skip represents a failed registry lookup
    pub fn is_failure(&self) -> bool {
        matches!(self, SkipReason::LookupFailed(_))
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Pinned => write!(f, "pinned version"),
            SkipReason::Unconstrained => write!(f, "no minimum constraint"),
            SkipReason::AlreadyLatest => write!(f, "already at latest"),
            SkipReason::ExceedsUpperBound(bound) => {
                write!(f, "latest version excluded by {}", bound)
            }
            SkipReason::LookupFailed(msg) => write!(f, "lookup failed: {}", msg),
            SkipReason::Excluded => write!(f, "excluded by configuration"),
            SkipReason::NotSelected => write!(f, "not selected"),
        }
    }
}

/// Result of an update decision for a single dependency
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UpdateResult {
    /// Dependency constraint will be rewritten
    Update {
        dependency: Dependency,
        /// The version written into the constraint
        new_version: String,
        /// The text change on the declaration line
        edit: SpecifierEdit,
    },
    /// Dependency was left alone
    Skip {
        dependency: Dependency,
        reason: SkipReason,
    },
}

impl UpdateResult {
    /// Creates an Update result, rewriting the dependency's requirement
    pub fn update(dependency: Dependency, new_version: impl Into<String>) -> Self {
        let new_version = new_version.into();
        let edit = SpecifierEdit::new(
            dependency.location.file.clone(),
            dependency.location.line,
            dependency.requirement.raw.clone(),
            dependency.requirement.rewrite(&new_version),
        );
        UpdateResult::Update {
            dependency,
            new_version,
            edit,
        }
    }

    /// Creates a Skip result
    pub fn skip(dependency: Dependency, reason: SkipReason) -> Self {
        UpdateResult::Skip { dependency, reason }
    }

    /// Creates a Skip result for a failed lookup
    pub fn skip_lookup_failed(dependency: Dependency, message: impl Into<String>) -> Self {
        Self::skip(dependency, SkipReason::LookupFailed(message.into()))
    }

    /// Returns true if this is an update result
    pub fn is_update(&self) -> bool {
        matches!(self, UpdateResult::Update { .. })
    }

    /// Returns true if this is a skip result
    pub fn is_skip(&self) -> bool {
        matches!(self, UpdateResult::Skip { .. })
    }

    /// Returns true if the lookup for this dependency failed
    pub fn is_failure(&self) -> bool {
        matches!(self, UpdateResult::Skip { reason, .. } if reason.is_failure())
    }

    /// Returns the dependency reference
    pub fn dependency(&self) -> &Dependency {
        match self {
            UpdateResult::Update { dependency, .. } => dependency,
            UpdateResult::Skip { dependency, .. } => dependency,
        }
    }

    /// Returns the edit for updates
    pub fn edit(&self) -> Option<&SpecifierEdit> {
        match self {
            UpdateResult::Update { edit, .. } => Some(edit),
            UpdateResult::Skip { .. } => None,
        }
    }

    /// Returns the package name as written
    pub fn package_name(&self) -> &str {
        &self.dependency().name
    }
}

impl fmt::Display for UpdateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateResult::Update {
                dependency,
                new_version,
                ..
            } => {
                write!(
                    f,
                    "{}: {} → {}",
                    dependency.name,
                    dependency.current_version().unwrap_or("*"),
                    new_version
                )
            }
            UpdateResult::Skip { dependency, reason } => {
                write!(f, "{}: skipped ({})", dependency.name, reason)
            }
        }
    }
}
