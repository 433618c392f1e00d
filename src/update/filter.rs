//! Update filter configuration
//!
//! This module provides the UpdateFilter struct that decides which
//! dependencies take part in a run. All names are compared in their
//! PEP 503 normalised form.

use crate::domain::{normalize_name, SkipReason};

/// Filter configuration for update judgment
#[derive(Debug, Clone, Default)]
pub struct UpdateFilter {
    /// Packages never upgraded (normalised)
    pub exclude: Vec<String>,
    /// If set, only this package is processed (normalised)
    pub only: Option<String>,
}

impl UpdateFilter {
    /// Create a new UpdateFilter that processes everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Set packages to exclude
    pub fn with_exclude<I, S>(mut self, exclude: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.exclude = exclude
            .into_iter()
            .map(|name| normalize_name(name.as_ref()))
            .collect();
        self
    }

    /// Restrict processing to a single package
    pub fn with_only(mut self, package: impl AsRef<str>) -> Self {
        self.only = Some(normalize_name(package.as_ref()));
        self
    }

    /// Returns the reason a package is filtered out, if any
    ///
    /// An explicitly selected package is processed even when it is also
    /// listed in `exclude`.
    pub fn check(&self, normalized: &str) -> Option<SkipReason> {
        if let Some(only) = &self.only {
            return (only != normalized).then_some(SkipReason::NotSelected);
        }
        if self.exclude.iter().any(|p| p == normalized) {
            return Some(SkipReason::Excluded);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_filter() {
        let filter = UpdateFilter::new();
        assert!(filter.exclude.is_empty());
        assert!(filter.only.is_none());
        assert!(filter.check("anything").is_none());
    }

    #[test]
    fn test_with_exclude_normalises() {
        let filter = UpdateFilter::new().with_exclude(["Foo_Bar", "baz"]);
        assert_eq!(filter.exclude, vec!["foo-bar", "baz"]);
        assert_eq!(filter.check("foo-bar"), Some(SkipReason::Excluded));
        assert!(filter.check("other").is_none());
    }

    #[test]
    fn test_with_only() {
        let filter = UpdateFilter::new().with_only("MkDocs_Material");
        assert_eq!(filter.only.as_deref(), Some("mkdocs-material"));
        assert!(filter.check("mkdocs-material").is_none());
        assert_eq!(filter.check("ruff"), Some(SkipReason::NotSelected));
    }

    #[test]
    fn test_only_overrides_exclude() {
        let filter = UpdateFilter::new()
            .with_exclude(["ruff"])
            .with_only("ruff");
        assert!(filter.check("ruff").is_none());
    }
}
